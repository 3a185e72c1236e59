use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("frame is not a JSON object")]
    NotAnObject,
    #[error("snapshot carries neither `usersDetailed` nor `users`")]
    MissingUserList,
}
