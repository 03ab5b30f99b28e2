use std::{error::Error, fmt, io};

use engine::EngineErr;

/// The worker module's result type.
pub type Result<T> = std::result::Result<T, WorkerErr>;

/// Worker runtime failures.
#[derive(Debug)]
pub enum WorkerErr {
    Io(io::Error),
    Engine(EngineErr),
    /// A recognized operation with no implementation behind it yet.
    UnsupportedOperation(&'static str),
}

impl fmt::Display for WorkerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerErr::Io(e) => write!(f, "io error: {e}"),
            WorkerErr::Engine(e) => write!(f, "{e}"),
            WorkerErr::UnsupportedOperation(name) => {
                write!(f, "operation `{name}` is reserved and not implemented by this worker")
            }
        }
    }
}

impl Error for WorkerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorkerErr::Io(e) => Some(e),
            WorkerErr::Engine(e) => Some(e),
            WorkerErr::UnsupportedOperation(_) => None,
        }
    }
}

impl From<io::Error> for WorkerErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<EngineErr> for WorkerErr {
    fn from(value: EngineErr) -> Self {
        Self::Engine(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<WorkerErr> for io::Error {
    fn from(value: WorkerErr) -> Self {
        match value {
            WorkerErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
