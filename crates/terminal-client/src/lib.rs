// In crates/terminal-client/src/lib.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub mod error;
pub mod gateway;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use gateway::GatewayTerminal;
pub use types::{Credentials, RawAccountInfo, RawDeal, RawPosition};

/// The five operations the bridge needs from a trading terminal.
///
/// A terminal hosts a single session at a time. Every method takes `&mut self`
/// so one session must be closed before the next account can be opened.
#[async_trait]
pub trait Terminal: Send {
    /// Logs in to the given account. `timeout` bounds the terminal's own login.
    async fn open(&mut self, credentials: &Credentials, timeout: Duration) -> Result<()>;

    /// Equity and balance of the logged-in account. `Ok(None)` when the
    /// terminal has no account data.
    async fn account_info(&mut self) -> Result<Option<RawAccountInfo>>;

    /// All currently open positions.
    async fn positions(&mut self) -> Result<Vec<RawPosition>>;

    /// Deals with `from <= time < to`, in ledger order.
    async fn deals(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<RawDeal>>;

    /// Ends the session.
    async fn close(&mut self) -> Result<()>;
}
