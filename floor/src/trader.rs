//! Per-trader view model.
//!
//! One `TraderView` per card, bundling the five independently refreshed
//! slots and wiring them to the account store and log reader. The title
//! is static and rendered once; everything else goes through change
//! detection so pollers only repaint what moved.

use crate::account::AccountStore;
use crate::logs::LogReader;
use crate::market::PriceBook;
use crate::refresh::{Refresh, Slot};
use crate::types::{LogEntry, TraderSpec, Transaction, ValuePoint};
use rust_decimal::Decimal;
use serde::Serialize;

/// The value card: headline number plus P&L direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCard {
    pub portfolio_value: Decimal,
    pub pnl: Decimal,
    pub gaining: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingRow {
    pub symbol: String,
    pub quantity: i64,
}

pub struct TraderView {
    spec: TraderSpec,
    value: Slot<ValueCard>,
    chart: Slot<Vec<ValuePoint>>,
    logs: Slot<Vec<LogEntry>>,
    holdings: Slot<Vec<HoldingRow>>,
    transactions: Slot<Vec<Transaction>>,
}

impl TraderView {
    pub fn new(spec: TraderSpec) -> Self {
        Self {
            spec,
            value: Slot::new(),
            chart: Slot::new(),
            logs: Slot::new(),
            holdings: Slot::new(),
            transactions: Slot::new(),
        }
    }

    pub fn poll_value(&mut self, store: &AccountStore, prices: &PriceBook) -> Refresh<ValueCard> {
        let name = self.spec.name.clone();
        self.value.update_with("value", || {
            let snap = store.get(&name)?;
            let book = prices.latest()?;
            let value = snap.portfolio_value(&book).round_dp(2);
            let pnl = snap.profit_loss(value).round_dp(2);
            Ok::<_, crate::error::FloorError>(ValueCard {
                portfolio_value: value,
                pnl,
                gaining: pnl >= Decimal::ZERO,
            })
        })
    }

    pub fn poll_chart(&mut self, store: &AccountStore) -> Refresh<Vec<ValuePoint>> {
        let name = self.spec.name.clone();
        self.chart.update_with("chart", || {
            Ok::<_, crate::error::FloorError>(store.get(&name)?.value_series)
        })
    }

    pub fn poll_logs(&mut self, reader: &LogReader, tail: usize) -> Refresh<Vec<LogEntry>> {
        let name = self.spec.name.clone();
        self.logs
            .update_with("logs", || reader.read_tail(&name, tail))
    }

    pub fn poll_holdings(&mut self, store: &AccountStore) -> Refresh<Vec<HoldingRow>> {
        let name = self.spec.name.clone();
        self.holdings.update_with("holdings", || {
            let snap = store.get(&name)?;
            Ok::<_, crate::error::FloorError>(
                snap.holdings
                    .into_iter()
                    .map(|(symbol, quantity)| HoldingRow { symbol, quantity })
                    .collect(),
            )
        })
    }

    pub fn poll_transactions(&mut self, store: &AccountStore) -> Refresh<Vec<Transaction>> {
        let name = self.spec.name.clone();
        self.transactions.update_with("transactions", || {
            Ok::<_, crate::error::FloorError>(store.get(&name)?.transactions)
        })
    }
}
