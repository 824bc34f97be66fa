// In crates/core-types/src/payload.rs

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{AccountSnapshot, ClosedTrade, OpenPosition};

/// Body of the `live-data` push.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveDataPayload {
    pub account_equity: Decimal,
    pub account_balance: Decimal,
    /// Sent even when empty.
    pub open_positions: Vec<OpenPosition>,
}

impl LiveDataPayload {
    pub fn new(snapshot: AccountSnapshot, open_positions: Vec<OpenPosition>) -> Self {
        Self {
            account_equity: snapshot.equity,
            account_balance: snapshot.balance,
            open_positions,
        }
    }
}

/// Body of the `closed-trades` push.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedTradesPayload {
    pub closed_trades: Vec<ClosedTrade>,
}
