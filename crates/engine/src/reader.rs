// In crates/engine/src/reader.rs

use chrono::{DateTime, Utc};
use core_types::time::utc_from_unix;
use core_types::{AccountSnapshot, Deal, DealEntry, OpenPosition, TradeType};
use rust_decimal::Decimal;
use terminal_client::{RawDeal, RawPosition, Terminal};

/// Reads equity and balance. `None` when the terminal reports no account data
/// or the read fails; both are logged.
pub async fn read_account<T>(terminal: &mut T) -> Option<AccountSnapshot>
where
    T: Terminal + ?Sized,
{
    match terminal.account_info().await {
        Ok(Some(info)) => Some(AccountSnapshot {
            equity: info.equity,
            balance: info.balance,
        }),
        Ok(None) => {
            tracing::error!("Terminal returned no account info.");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read account info.");
            None
        }
    }
}

/// Reads all open positions. An empty list is a normal result; a terminal
/// error is logged and also yields an empty list.
pub async fn read_open_positions<T>(terminal: &mut T) -> Vec<OpenPosition>
where
    T: Terminal + ?Sized,
{
    let raw_positions = match terminal.positions().await {
        Ok(positions) => positions,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read open positions; treating as none open.");
            return Vec::new();
        }
    };

    let positions: Vec<OpenPosition> = raw_positions
        .into_iter()
        .filter_map(|raw| {
            tracing::debug!(?raw, "Read open position.");
            let ticket = raw.ticket;
            match position_from_raw(raw) {
                Ok(position) => Some(position),
                Err(e) => {
                    tracing::warn!(ticket, error = %e, "Dropping open position with an unusable timestamp.");
                    None
                }
            }
        })
        .collect();

    tracing::info!(count = positions.len(), "Read open positions.");
    positions
}

/// Reads the deal ledger for `from <= time < to`. Errors are logged and yield
/// an empty ledger.
pub async fn read_deals<T>(terminal: &mut T, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Deal>
where
    T: Terminal + ?Sized,
{
    let raw_deals = match terminal.deals(from, to).await {
        Ok(deals) => deals,
        Err(e) => {
            tracing::warn!(%from, %to, error = %e, "Failed to read deal history; treating as empty.");
            return Vec::new();
        }
    };

    raw_deals
        .into_iter()
        .filter_map(|raw| {
            let ticket = raw.ticket;
            deal_from_raw(raw)
                .inspect_err(|e| tracing::warn!(ticket, error = %e, "Dropping deal with an unusable timestamp."))
                .ok()
        })
        .collect()
}

pub fn position_from_raw(raw: RawPosition) -> core_types::Result<OpenPosition> {
    Ok(OpenPosition {
        ticket: raw.ticket.to_string(),
        symbol: raw.symbol,
        trade_type: TradeType::from_code(raw.kind),
        volume_lots: raw.volume,
        open_price: raw.price_open,
        open_time: utc_from_unix(raw.time)?,
        current_market_price: raw.price_current,
        swap: raw.swap.unwrap_or(Decimal::ZERO),
        commission: raw.commission.unwrap_or(Decimal::ZERO),
        floating_pnl: raw.profit,
    })
}

pub fn deal_from_raw(raw: RawDeal) -> core_types::Result<Deal> {
    Ok(Deal {
        ticket: raw.ticket,
        order: raw.order,
        position_id: raw.position_id,
        entry: DealEntry::from_code(raw.entry),
        side: TradeType::from_code(raw.kind),
        volume: raw.volume,
        price: raw.price,
        time: utc_from_unix(raw.time)?,
        symbol: raw.symbol,
        swap: raw.swap.unwrap_or(Decimal::ZERO),
        commission: raw.commission.unwrap_or(Decimal::ZERO),
        profit: raw.profit,
    })
}
