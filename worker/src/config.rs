use std::{env, io};

const DEFAULT_HOST: &str = "127.0.0.1";

/// Broker endpoint configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    host: String,
    port: u16,
}

impl BrokerConfig {
    /// Reads `BROKER_HOST` (defaults to 127.0.0.1) and `BROKER_PORT`
    /// (required).
    ///
    /// # Returns
    /// A `BrokerConfig` instance, or an error when `BROKER_PORT` is
    /// missing or not a port number.
    pub fn from_env() -> io::Result<Self> {
        let host = env::var("BROKER_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = env::var("BROKER_PORT")
            .map_err(|_| io::Error::other("BROKER_PORT is not set"))?
            .parse()
            .map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidInput, format!("invalid BROKER_PORT: {e}"))
            })?;

        Ok(Self { host, port })
    }

    /// The broker's network location.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
