// In crates/core-types/src/lib.rs

pub mod clock;
pub mod error;
pub mod payload;
pub mod time;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use payload::{ClosedTradesPayload, LiveDataPayload};
pub use types::{AccountSnapshot, ClosedTrade, Deal, DealEntry, OpenPosition, TradeType};
