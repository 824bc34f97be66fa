// In crates/engine/src/reconciler.rs

use chrono::{DateTime, Utc};
use core_types::{ClosedTrade, Deal, DealEntry};
use std::collections::{HashMap, HashSet};
use terminal_client::Terminal;

use crate::reader::read_deals;

/// An OUT-deal that could not be paired with its opening deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedDeal {
    pub ticket: u64,
    pub order: u64,
    pub position_id: u64,
}

/// Result of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Reconciliation {
    /// Closed trades in ledger order of their closing deal.
    pub trades: Vec<ClosedTrade>,
    /// Closing deals dropped because no opening deal was found.
    pub skipped: Vec<SkippedDeal>,
}

/// Rebuilds round-trip trades from the deal ledger.
///
/// Reads the deals in `[from, now)` and, if any of them can be paired, the
/// whole ledger up to `now` so that positions opened before the lookback
/// window are still matched.
pub async fn reconcile_closed_trades<T>(terminal: &mut T, from: DateTime<Utc>, now: DateTime<Utc>) -> Reconciliation
where
    T: Terminal + ?Sized,
{
    let window = read_deals(terminal, from, now).await;

    let history = if window.iter().any(is_matchable_close) {
        read_deals(terminal, DateTime::<Utc>::UNIX_EPOCH, now).await
    } else {
        Vec::new()
    };

    let reconciliation = reconcile(&window, &history);
    tracing::info!(
        deals = window.len(),
        closed_trades = reconciliation.trades.len(),
        skipped = reconciliation.skipped.len(),
        "Reconciled closed trades."
    );
    reconciliation
}

/// Pairs every OUT-deal in `window` with the first IN-deal in `history`
/// carrying the same position id.
///
/// At most one trade is produced per order id; further closing deals of an
/// already materialized order (partial closes) are ignored. Deals with
/// position id 0 are never paired.
pub fn reconcile(window: &[Deal], history: &[Deal]) -> Reconciliation {
    let opening_deals = index_opening_deals(history);
    let mut processed_orders = HashSet::new();
    let mut reconciliation = Reconciliation::default();

    for deal in window {
        if deal.entry != DealEntry::Out || processed_orders.contains(&deal.order) {
            continue;
        }

        let opening = match deal.position_id {
            0 => None,
            position_id => opening_deals.get(&position_id).copied(),
        };

        let Some(opening) = opening else {
            tracing::warn!(
                ticket = deal.ticket,
                position_id = deal.position_id,
                "No opening deal found for closing deal; skipping."
            );
            reconciliation.skipped.push(SkippedDeal {
                ticket: deal.ticket,
                order: deal.order,
                position_id: deal.position_id,
            });
            continue;
        };

        reconciliation.trades.push(closed_trade(opening, deal));
        processed_orders.insert(deal.order);
    }

    reconciliation
}

/// First IN-deal per position id, in ledger order.
fn index_opening_deals(history: &[Deal]) -> HashMap<u64, &Deal> {
    let mut index = HashMap::new();
    for deal in history.iter().filter(|d| d.entry == DealEntry::In) {
        index.entry(deal.position_id).or_insert(deal);
    }
    index
}

fn is_matchable_close(deal: &Deal) -> bool {
    deal.entry == DealEntry::Out && deal.position_id != 0
}

fn closed_trade(opening: &Deal, closing: &Deal) -> ClosedTrade {
    ClosedTrade {
        ticket: closing.order.to_string(),
        symbol: closing.symbol.clone(),
        trade_type: opening.side,
        volume_lots: closing.volume,
        open_price: opening.price,
        open_time: opening.time,
        close_price: closing.price,
        close_time: closing.time,
        swap: closing.swap,
        commission: closing.commission,
        realized_pnl: closing.profit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::TradeType;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const T0: i64 = 1_709_280_000;

    fn deal(ticket: u64, order: u64, position_id: u64, entry: DealEntry, side: TradeType, price: Decimal, offset: i64) -> Deal {
        Deal {
            ticket,
            order,
            position_id,
            entry,
            side,
            volume: dec!(1.0),
            price,
            time: DateTime::from_timestamp(T0 + offset, 0).unwrap(),
            symbol: "EURUSD".into(),
            swap: dec!(-0.2),
            commission: dec!(-3.5),
            profit: dec!(50),
        }
    }

    #[test]
    fn pairs_in_and_out_by_position_id() {
        let open = deal(1, 101, 7, DealEntry::In, TradeType::Buy, dec!(1.1000), 0);
        let close = deal(2, 102, 7, DealEntry::Out, TradeType::Sell, dec!(1.1050), 3_600);
        let ledger = vec![open, close];

        let result = reconcile(&ledger, &ledger);

        assert!(result.skipped.is_empty());
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.ticket, "102");
        assert_eq!(trade.trade_type, TradeType::Buy);
        assert_eq!(trade.open_price, dec!(1.1000));
        assert_eq!(trade.close_price, dec!(1.1050));
        assert_eq!(trade.open_time.timestamp(), T0);
        assert_eq!(trade.close_time.timestamp(), T0 + 3_600);
        assert_eq!(trade.realized_pnl, dec!(50));
        assert_eq!(trade.swap, dec!(-0.2));
    }

    #[test]
    fn opening_deal_outside_the_window_is_still_found() {
        let open = deal(1, 101, 7, DealEntry::In, TradeType::Sell, dec!(1.2000), -86_400 * 30);
        let close = deal(2, 102, 7, DealEntry::Out, TradeType::Buy, dec!(1.1900), 0);

        let window = vec![close.clone()];
        let history = vec![open, close];
        let result = reconcile(&window, &history);

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].trade_type, TradeType::Sell);
    }

    #[test]
    fn opening_deal_later_in_the_ledger_is_matched() {
        let close = deal(2, 102, 9, DealEntry::Out, TradeType::Sell, dec!(1.1050), 0);
        let open = deal(1, 101, 9, DealEntry::In, TradeType::Buy, dec!(1.1000), 10);
        let history = vec![close.clone(), open];

        let result = reconcile(&[close], &history);
        assert_eq!(result.trades.len(), 1);
    }

    #[test]
    fn one_trade_per_order_id() {
        let open = deal(1, 101, 7, DealEntry::In, TradeType::Buy, dec!(1.1000), 0);
        let first_part = deal(2, 200, 7, DealEntry::Out, TradeType::Sell, dec!(1.1050), 60);
        let second_part = deal(3, 200, 7, DealEntry::Out, TradeType::Sell, dec!(1.1060), 120);
        let ledger = vec![open, first_part, second_part];

        let result = reconcile(&ledger, &ledger);

        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].close_price, dec!(1.1050));
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn position_id_zero_is_never_matched() {
        let open = deal(1, 101, 0, DealEntry::In, TradeType::Buy, dec!(1.1000), 0);
        let close = deal(2, 102, 0, DealEntry::Out, TradeType::Sell, dec!(1.1050), 60);
        let ledger = vec![open, close];

        let result = reconcile(&ledger, &ledger);

        assert!(result.trades.is_empty());
        assert_eq!(result.skipped, vec![SkippedDeal { ticket: 2, order: 102, position_id: 0 }]);
    }

    #[test]
    fn unmatched_close_is_skipped_without_failing_the_pass() {
        let orphan = deal(2, 102, 55, DealEntry::Out, TradeType::Sell, dec!(1.1050), 0);
        let open = deal(3, 103, 8, DealEntry::In, TradeType::Buy, dec!(1.3000), 10);
        let close = deal(4, 104, 8, DealEntry::Out, TradeType::Sell, dec!(1.3100), 20);
        let ledger = vec![orphan, open, close];

        let result = reconcile(&ledger, &ledger);

        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].position_id, 55);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].ticket, "104");
    }

    #[test]
    fn first_opening_deal_wins() {
        let open = deal(1, 101, 7, DealEntry::In, TradeType::Buy, dec!(1.1000), 0);
        let add = deal(2, 102, 7, DealEntry::In, TradeType::Buy, dec!(1.1020), 30);
        let close = deal(3, 103, 7, DealEntry::Out, TradeType::Sell, dec!(1.1050), 60);
        let ledger = vec![open, add, close];

        let result = reconcile(&ledger, &ledger);
        assert_eq!(result.trades[0].open_price, dec!(1.1000));
    }

    #[test]
    fn trades_follow_ledger_order_of_closing_deals() {
        let ledger = vec![
            deal(1, 101, 7, DealEntry::In, TradeType::Buy, dec!(1.1), 0),
            deal(2, 102, 8, DealEntry::In, TradeType::Sell, dec!(1.2), 10),
            deal(3, 103, 8, DealEntry::Out, TradeType::Buy, dec!(1.19), 20),
            deal(4, 104, 7, DealEntry::Out, TradeType::Sell, dec!(1.11), 30),
        ];

        let result = reconcile(&ledger, &ledger);
        let tickets: Vec<&str> = result.trades.iter().map(|t| t.ticket.as_str()).collect();
        assert_eq!(tickets, vec!["103", "104"]);
        assert_eq!(result.trades[0].trade_type, TradeType::Sell);
        assert_eq!(result.trades[1].trade_type, TradeType::Buy);
    }

    #[test]
    fn reversal_and_other_entries_are_ignored() {
        let ledger = vec![
            deal(1, 101, 7, DealEntry::In, TradeType::Buy, dec!(1.1), 0),
            deal(2, 102, 7, DealEntry::InOut, TradeType::Sell, dec!(1.1), 10),
            deal(3, 103, 7, DealEntry::OutBy, TradeType::Sell, dec!(1.1), 20),
        ];

        let result = reconcile(&ledger, &ledger);
        assert!(result.trades.is_empty());
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn empty_history_skips_every_close() {
        let close = deal(2, 102, 7, DealEntry::Out, TradeType::Sell, dec!(1.1050), 0);
        let result = reconcile(&[close], &[]);
        assert!(result.trades.is_empty());
        assert_eq!(result.skipped.len(), 1);
    }
}
