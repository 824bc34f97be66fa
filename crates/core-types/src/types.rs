// In crates/core-types/src/types.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::time::serialize_iso_seconds;

/// Direction of a position or deal as reported to the ingestion API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TradeType {
    Buy,
    Sell,
    Unknown,
}

impl TradeType {
    /// Maps the platform's numeric order/deal type. Codes other than buy (0)
    /// and sell (1) are kept as `Unknown` instead of failing.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => TradeType::Buy,
            1 => TradeType::Sell,
            _ => TradeType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::Buy => "Buy",
            TradeType::Sell => "Sell",
            TradeType::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for TradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a deal opened, closed or reversed a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DealEntry {
    /// Opens (or adds to) a position.
    In,
    /// Closes or reduces a position.
    Out,
    /// Reversal.
    InOut,
    /// Closed by an opposite position.
    OutBy,
    Other(i32),
}

impl DealEntry {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => DealEntry::In,
            1 => DealEntry::Out,
            2 => DealEntry::InOut,
            3 => DealEntry::OutBy,
            other => DealEntry::Other(other),
        }
    }
}

/// A single entry from the platform's append-only deal ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Deal {
    pub ticket: u64,
    /// The order that produced this deal.
    pub order: u64,
    /// The position this deal belongs to. `0` when the platform did not link one.
    pub position_id: u64,
    pub entry: DealEntry,
    pub side: TradeType,
    pub volume: Decimal,
    pub price: Decimal,
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub swap: Decimal,
    pub commission: Decimal,
    pub profit: Decimal,
}

/// Equity and balance of the logged-in account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub equity: Decimal,
    pub balance: Decimal,
}

/// A currently open market position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPosition {
    #[serde(rename = "eaTicketId")]
    pub ticket: String,
    pub symbol: String,
    pub trade_type: TradeType,
    pub volume_lots: Decimal,
    pub open_price: Decimal,
    #[serde(serialize_with = "serialize_iso_seconds")]
    pub open_time: DateTime<Utc>,
    pub current_market_price: Decimal,
    pub swap: Decimal,
    pub commission: Decimal,
    #[serde(rename = "floatingPAndL")]
    pub floating_pnl: Decimal,
}

/// A round-trip trade reconstructed from an opening and a closing deal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedTrade {
    /// Order id of the closing deal.
    #[serde(rename = "eaTicketId")]
    pub ticket: String,
    pub symbol: String,
    /// Direction of the opening deal.
    pub trade_type: TradeType,
    pub volume_lots: Decimal,
    pub open_price: Decimal,
    #[serde(serialize_with = "serialize_iso_seconds")]
    pub open_time: DateTime<Utc>,
    pub close_price: Decimal,
    #[serde(serialize_with = "serialize_iso_seconds")]
    pub close_time: DateTime<Utc>,
    pub swap: Decimal,
    pub commission: Decimal,
    #[serde(rename = "realizedPAndL")]
    pub realized_pnl: Decimal,
}
