use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire engine module.
pub type Result<T> = std::result::Result<T, EngineErr>;

/// Engine failures. Every variant renders a human-readable message that
/// becomes the `error` field of an outbound error report.
#[derive(Debug)]
pub enum EngineErr {
    /// No compatible accelerator could be acquired. Fatal for the
    /// requesting job only.
    AcceleratorUnavailable(String),
    /// The device failed after acquisition, e.g. mid-dispatch. The cached
    /// session is invalidated and lazily reacquired on the next job.
    AcceleratorLost(String),
    /// Malformed model bytes or runtime rejection.
    ModelLoad(String),
    /// Inference requested before any model was loaded.
    NoModelLoaded,
    /// 2-D input whose rows disagree in length.
    RaggedInput {
        row: usize,
        got: usize,
        expected: usize,
    },
    /// The model ran but produced no output tensors.
    EmptyModelOutput,
}

impl Display for EngineErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineErr::AcceleratorUnavailable(reason) => {
                write!(f, "no accelerator available: {reason}")
            }
            EngineErr::AcceleratorLost(reason) => {
                write!(f, "accelerator lost: {reason}")
            }
            EngineErr::ModelLoad(reason) => write!(f, "model load failed: {reason}"),
            EngineErr::NoModelLoaded => write!(f, "no model is loaded"),
            EngineErr::RaggedInput { row, got, expected } => write!(
                f,
                "ragged input: row {row} has {got} values, expected {expected}"
            ),
            EngineErr::EmptyModelOutput => write!(f, "model produced no output tensors"),
        }
    }
}

impl Error for EngineErr {}
