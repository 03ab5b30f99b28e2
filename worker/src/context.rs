use engine::{GpuEngine, InferenceEngine, ModelRuntime};

/// Process-wide engine state: the accelerator session cache and the
/// resident model.
///
/// Owned fields passed to the router by reference; never ambient
/// globals. At most one of each exists per process.
pub struct WorkerContext {
    pub gpu: GpuEngine,
    pub model: InferenceEngine,
}

impl WorkerContext {
    /// Creates a context around the injected model-runtime collaborator,
    /// with no accelerator session and no model resident yet.
    pub fn new(runtime: Box<dyn ModelRuntime>) -> Self {
        Self {
            gpu: GpuEngine::new(),
            model: InferenceEngine::new(runtime),
        }
    }

    /// Drops all resident engine state; both engines reacquire lazily.
    pub fn reset(&mut self) {
        self.gpu.reset();
        self.model.reset();
    }
}
