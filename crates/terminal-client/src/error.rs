// In crates/terminal-client/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the gateway client: {0}")]
    ClientBuildError(String),
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(#[from] serde_json::Error),
    /// The terminal's own last-error pair.
    #[error("Terminal error: code {code}, msg: {msg}")]
    Terminal { code: i64, msg: String },
    #[error("Unexpected gateway status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("No terminal session is open")]
    NotConnected,
    #[error("A terminal session is already open for login {0}")]
    SessionBusy(u64),
}

pub type Result<T> = std::result::Result<T, Error>;
