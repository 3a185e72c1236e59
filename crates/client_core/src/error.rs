use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid backend url '{url}': {reason}")]
    InvalidBackendUrl { url: String, reason: String },
    #[error("backend url '{0}' must start with http:// or https://")]
    UnsupportedScheme(String),
    #[error("chat client event loop has stopped")]
    Closed,
}
