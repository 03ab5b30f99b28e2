//! Execution engines for broker-assigned jobs: an accelerator-backed
//! array engine and a numeric inference engine over an external model
//! runtime.

pub mod error;
pub mod gpu;
pub mod model;

pub use error::{EngineErr, Result};
pub use gpu::GpuEngine;
pub use model::{InferenceEngine, ModelRuntime, ModelSession, Tensor};
