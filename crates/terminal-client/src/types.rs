// In crates/terminal-client/src/types.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Login details for one terminal account.
#[derive(Clone)]
pub struct Credentials {
    pub login: u64,
    pub password: String,
    pub server: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .field("server", &self.server)
            .finish()
    }
}

/// Account information as reported by the terminal.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RawAccountInfo {
    pub login: u64,
    pub equity: Decimal,
    pub balance: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
}

/// An open position as reported by the terminal.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RawPosition {
    pub ticket: u64,
    pub symbol: String,
    /// Order type code: 0 = buy, 1 = sell.
    #[serde(rename = "type")]
    pub kind: i32,
    pub volume: Decimal,
    pub price_open: Decimal,
    /// Unix seconds.
    pub time: i64,
    pub price_current: Decimal,
    #[serde(default)]
    pub swap: Option<Decimal>,
    #[serde(default)]
    pub commission: Option<Decimal>,
    pub profit: Decimal,
}

/// A deal ledger entry as reported by the terminal.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RawDeal {
    pub ticket: u64,
    pub order: u64,
    pub position_id: u64,
    /// Entry code: 0 = in, 1 = out, 2 = in/out, 3 = out by.
    pub entry: i32,
    /// Deal type code: 0 = buy, 1 = sell.
    #[serde(rename = "type")]
    pub kind: i32,
    pub volume: Decimal,
    pub price: Decimal,
    /// Unix seconds.
    pub time: i64,
    pub symbol: String,
    #[serde(default)]
    pub swap: Option<Decimal>,
    #[serde(default)]
    pub commission: Option<Decimal>,
    pub profit: Decimal,
}

/// Body of the gateway's session request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OpenSessionRequest<'a> {
    pub login: u64,
    pub password: &'a str,
    pub server: &'a str,
    pub timeout_ms: u64,
}

/// Error object returned by the gateway on failure.
#[derive(Debug, Deserialize)]
pub(crate) struct GatewayError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}
