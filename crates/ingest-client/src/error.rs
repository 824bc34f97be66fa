// In crates/ingest-client/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to build the HTTP client: {0}")]
    ClientBuildError(String),
    #[error("Failed to serialize payload: {0}")]
    SerializationFailed(#[from] serde_json::Error),
    #[error("Push to {url} failed after {attempts} attempt(s): {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
