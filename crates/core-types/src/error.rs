// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Timestamp {0} is outside the representable UTC range")]
    InvalidTimestamp(i64),
}

pub type Result<T> = std::result::Result<T, Error>;
