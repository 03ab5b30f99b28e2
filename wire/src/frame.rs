//! Message shapes exchanged with the broker.

use std::{error::Error, fmt};

use serde::{Deserialize, Serialize};

/// Operation names the router recognizes. Doubles as the decode whitelist:
/// anything else becomes [`Operation::Unknown`].
const KNOWN_OPERATIONS: [&str; 5] = [
    "square_array",
    "onnx_inference",
    "load_onnx_model",
    "load_model",
    "inference",
];

/// A unit of work assigned by the broker.
///
/// Created on frame decode, consumed exactly once by a single handler
/// invocation, never mutated after decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub job_id: String,
    pub op: Operation,
}

/// The fixed operation set, plus an arm for unrecognized names so the
/// operation string survives for logging.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    SquareArray { array: Vec<f32> },
    OnnxInference { input_data: Vec<Vec<f32>> },
    LoadOnnxModel { onnx_model_b64: String },
    LoadModel,
    Inference,
    Unknown(String),
}

impl Operation {
    /// The wire name of this operation.
    pub fn name(&self) -> &str {
        match self {
            Operation::SquareArray { .. } => "square_array",
            Operation::OnnxInference { .. } => "onnx_inference",
            Operation::LoadOnnxModel { .. } => "load_onnx_model",
            Operation::LoadModel => "load_model",
            Operation::Inference => "inference",
            Operation::Unknown(name) => name,
        }
    }
}

/// Serde view of the operation payload for the recognized names.
#[derive(Debug, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
enum TaggedOperation {
    SquareArray { array: Vec<f32> },
    OnnxInference { input_data: Vec<Vec<f32>> },
    LoadOnnxModel { onnx_model_b64: String },
    LoadModel,
    Inference,
}

impl From<TaggedOperation> for Operation {
    fn from(op: TaggedOperation) -> Self {
        match op {
            TaggedOperation::SquareArray { array } => Operation::SquareArray { array },
            TaggedOperation::OnnxInference { input_data } => {
                Operation::OnnxInference { input_data }
            }
            TaggedOperation::LoadOnnxModel { onnx_model_b64 } => {
                Operation::LoadOnnxModel { onnx_model_b64 }
            }
            TaggedOperation::LoadModel => Operation::LoadModel,
            TaggedOperation::Inference => Operation::Inference,
        }
    }
}

/// Outer shape of an inbound frame: `{ "job_id": ..., "data": { ... } }`.
#[derive(Debug, Deserialize)]
struct Envelope {
    job_id: String,
    data: serde_json::Value,
}

impl Job {
    /// Decodes an inbound frame body.
    ///
    /// Unrecognized operation names still decode (into
    /// [`Operation::Unknown`]); only a frame with no usable `job_id` or
    /// `operation` is an error, since there is nothing to reply against.
    pub fn decode(frame: &[u8]) -> Result<Self, DecodeErr> {
        let envelope: Envelope = serde_json::from_slice(frame).map_err(DecodeErr::Frame)?;

        let name = envelope
            .data
            .get("operation")
            .and_then(serde_json::Value::as_str)
            .ok_or(DecodeErr::MissingOperation)?
            .to_string();

        let op = if KNOWN_OPERATIONS.contains(&name.as_str()) {
            let tagged: TaggedOperation =
                serde_json::from_value(envelope.data).map_err(|source| DecodeErr::Payload {
                    operation: name,
                    source,
                })?;
            tagged.into()
        } else {
            Operation::Unknown(name)
        };

        Ok(Self {
            job_id: envelope.job_id,
            op,
        })
    }
}

/// A completed job's numeric output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: String,
    pub data: Vec<f32>,
}

/// The failure-path counterpart of [`JobResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub job_id: String,
    pub error: String,
}

/// Outbound frame body: exactly one of these is emitted per decoded job
/// with a recognized operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Result(JobResult),
    Error(ErrorReport),
}

impl Reply {
    pub fn job_id(&self) -> &str {
        match self {
            Reply::Result(result) => &result.job_id,
            Reply::Error(report) => &report.job_id,
        }
    }
}

/// Inbound frame decode failures. Unrecoverable for that frame: no reply
/// is possible, the frame is logged and dropped.
#[derive(Debug)]
pub enum DecodeErr {
    /// Malformed JSON, or an envelope missing `job_id` or `data`.
    Frame(serde_json::Error),
    /// The `data` object has no string `operation` field.
    MissingOperation,
    /// A recognized operation with fields of the wrong shape.
    Payload {
        operation: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for DecodeErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErr::Frame(e) => write!(f, "malformed job frame: {e}"),
            DecodeErr::MissingOperation => {
                write!(f, "job frame has no string `operation` field")
            }
            DecodeErr::Payload { operation, source } => {
                write!(f, "invalid payload for operation `{operation}`: {source}")
            }
        }
    }
}

impl Error for DecodeErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DecodeErr::Frame(e) | DecodeErr::Payload { source: e, .. } => Some(e),
            DecodeErr::MissingOperation => None,
        }
    }
}
