//! Numeric inference engine.
//!
//! The model runtime itself is an external collaborator reached through
//! the [`ModelRuntime`] seam; this engine only owns the resident session
//! and the tensor plumbing around it. It never interprets the model's
//! internal graph.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{debug, info};

use crate::error::{EngineErr, Result};

/// Row-major tensor handed to and returned by the model runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    pub data: Vec<f32>,
    pub dims: Vec<usize>,
}

impl Tensor {
    /// Builds a 2-D tensor from row vectors, inferring `[rows, cols]`
    /// from the input's own dimensions.
    ///
    /// # Errors
    /// `RaggedInput` if any row disagrees with the first row's length.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);

        let mut data = Vec::with_capacity(rows.len() * cols);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != cols {
                return Err(EngineErr::RaggedInput {
                    row,
                    got: values.len(),
                    expected: cols,
                });
            }
            data.extend_from_slice(values);
        }

        Ok(Self {
            data,
            dims: vec![rows.len(), cols],
        })
    }
}

/// External model runtime capability: turn raw model bytes into a
/// runnable session.
pub trait ModelRuntime: Send {
    /// Loads a model from raw bytes.
    ///
    /// # Errors
    /// `ModelLoad` on malformed bytes or runtime rejection.
    fn load(&self, bytes: &[u8]) -> Result<Box<dyn ModelSession>>;
}

/// A loaded model. Runs a tensor and returns output tensors keyed by
/// output name; callers take the first entry.
pub trait ModelSession: Send {
    fn run(&self, input: &Tensor) -> Result<Vec<(String, Tensor)>>;
}

/// Owns the at-most-one resident model session.
///
/// A successful load replaces, never appends to, the resident session.
pub struct InferenceEngine {
    runtime: Box<dyn ModelRuntime>,
    session: Option<Box<dyn ModelSession>>,
}

impl InferenceEngine {
    /// Creates an engine around the injected runtime collaborator, with
    /// no model resident.
    pub fn new(runtime: Box<dyn ModelRuntime>) -> Self {
        Self {
            runtime,
            session: None,
        }
    }

    /// Decodes the base64 model-transport encoding and loads the result.
    ///
    /// # Errors
    /// `ModelLoad` on invalid base64 or runtime rejection.
    pub fn load_base64(&mut self, encoded: &str) -> Result<()> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| EngineErr::ModelLoad(format!("invalid base64 model payload: {e}")))?;

        self.load(&bytes)
    }

    /// Hands raw model bytes to the runtime, replacing any resident
    /// session on success.
    pub fn load(&mut self, bytes: &[u8]) -> Result<()> {
        let session = self.runtime.load(bytes)?;
        self.session = Some(session);
        info!("model loaded: {} bytes", bytes.len());
        Ok(())
    }

    /// Runs the resident model over a 2-D input and flattens the first
    /// output tensor's values.
    ///
    /// # Errors
    /// `NoModelLoaded` before any successful load; `RaggedInput` for
    /// malformed input; whatever the runtime reports for the run itself.
    pub fn infer(&self, rows: &[Vec<f32>]) -> Result<Vec<f32>> {
        let session = self.session.as_ref().ok_or(EngineErr::NoModelLoaded)?;

        let input = Tensor::from_rows(rows)?;
        let outputs = session.run(&input)?;

        let (name, first) = outputs
            .into_iter()
            .next()
            .ok_or(EngineErr::EmptyModelOutput)?;
        debug!("taking first model output: {name}");

        Ok(first.data)
    }

    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    /// Drops the resident session, if any.
    pub fn reset(&mut self) {
        self.session = None;
    }
}
