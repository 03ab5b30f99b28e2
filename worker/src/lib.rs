pub mod config;
pub mod context;
pub mod error;
pub mod router;
pub mod runtime;
pub mod session;

pub use config::BrokerConfig;
pub use context::WorkerContext;
pub use error::WorkerErr;
pub use session::{ConnectionState, Session};
