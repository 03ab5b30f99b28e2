use engine::{EngineErr, ModelRuntime, ModelSession};

/// Placeholder for the external model-runtime collaborator.
///
/// The real runtime is injected through the [`ModelRuntime`] seam; a
/// build without one still serves accelerator jobs, and model loads fail
/// with a clear message instead of silence.
#[derive(Debug, Default)]
pub struct UnlinkedRuntime;

impl ModelRuntime for UnlinkedRuntime {
    fn load(&self, _bytes: &[u8]) -> engine::Result<Box<dyn ModelSession>> {
        Err(EngineErr::ModelLoad(
            "no model runtime is linked into this build".to_string(),
        ))
    }
}
