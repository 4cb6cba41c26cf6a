//! Read-only client for accounts written by the trading engine.
//!
//! Each account lives as one JSON document in the shared database. The
//! engine owns all writes; this side only snapshots, so every read opens
//! a fresh read-only connection and never holds locks across awaits.

use crate::error::FloorError;
use crate::types::{Transaction, ValuePoint};
use rust_decimal::Decimal;
use rusqlite::{Connection, OpenFlags};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Account document as persisted by the engine.
#[derive(Debug, Deserialize)]
struct AccountRecord {
    balance: Decimal,
    #[serde(default)]
    initial_balance: Option<Decimal>,
    #[serde(default)]
    strategy: String,
    #[serde(default)]
    holdings: BTreeMap<String, i64>,
    #[serde(default)]
    transactions: Vec<Transaction>,
    #[serde(default)]
    portfolio_value_time_series: Vec<(String, Decimal)>,
}

/// Point-in-time view of one trader's account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub name: String,
    pub balance: Decimal,
    pub initial_balance: Decimal,
    pub strategy: String,
    pub holdings: BTreeMap<String, i64>,
    pub transactions: Vec<Transaction>,
    pub value_series: Vec<ValuePoint>,
}

impl AccountSnapshot {
    /// Cash plus holdings marked at the given prices. A symbol missing
    /// from the price book is valued at zero, same as the engine does.
    pub fn portfolio_value(&self, prices: &HashMap<String, Decimal>) -> Decimal {
        let mut value = self.balance;
        for (symbol, quantity) in &self.holdings {
            let price = prices.get(symbol).copied().unwrap_or(Decimal::ZERO);
            value += price * Decimal::from(*quantity);
        }
        value
    }

    pub fn profit_loss(&self, portfolio_value: Decimal) -> Decimal {
        portfolio_value - self.initial_balance
    }
}

#[derive(Debug, Clone)]
pub struct AccountStore {
    db_path: String,
    default_initial_balance: Decimal,
}

impl AccountStore {
    pub fn new(db_path: &str, default_initial_balance: Decimal) -> Self {
        Self {
            db_path: db_path.to_string(),
            default_initial_balance,
        }
    }

    fn open(&self) -> Result<Connection, FloorError> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    /// Snapshot one account by trader name.
    pub fn get(&self, name: &str) -> Result<AccountSnapshot, FloorError> {
        let conn = self.open()?;
        let json: String = conn.query_row(
            "SELECT account FROM accounts WHERE name = ?1",
            [name],
            |row| row.get(0),
        )?;
        let record: AccountRecord = serde_json::from_str(&json)?;

        Ok(AccountSnapshot {
            name: name.to_string(),
            balance: record.balance,
            initial_balance: record
                .initial_balance
                .unwrap_or(self.default_initial_balance),
            strategy: record.strategy,
            holdings: record.holdings,
            transactions: record.transactions,
            value_series: record
                .portfolio_value_time_series
                .into_iter()
                .map(|(datetime, value)| ValuePoint { datetime, value })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn seeded_db(tag: &str) -> String {
        let path = std::env::temp_dir().join(format!(
            "trading-floor-accounts-{tag}-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE accounts (name TEXT PRIMARY KEY, account TEXT);",
        )
        .unwrap();
        let warren = serde_json::json!({
            "balance": "4000.00",
            "strategy": "Buy quality and wait.",
            "holdings": {"AAPL": 10, "MSFT": 5},
            "transactions": [
                {"timestamp": "2025-06-02T10:00:04", "symbol": "AAPL",
                 "quantity": 10, "price": "200.00", "rationale": "Undervalued."}
            ],
            "portfolio_value_time_series": [
                ["2025-06-01T16:00:00", "10000.00"],
                ["2025-06-02T16:00:00", "10400.00"]
            ]
        });
        conn.execute(
            "INSERT INTO accounts (name, account) VALUES (?1, ?2)",
            rusqlite::params!["Warren", warren.to_string()],
        )
        .unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn snapshot_round_trips_the_engine_document() {
        let store = AccountStore::new(&seeded_db("snapshot"), dec!(10000));
        let snap = store.get("Warren").unwrap();
        assert_eq!(snap.balance, dec!(4000.00));
        assert_eq!(snap.holdings.get("AAPL"), Some(&10));
        assert_eq!(snap.transactions.len(), 1);
        assert_eq!(snap.transactions[0].price, dec!(200.00));
        assert_eq!(snap.value_series.len(), 2);
        assert_eq!(snap.value_series[1].value, dec!(10400.00));
        assert_eq!(snap.strategy, "Buy quality and wait.");
    }

    #[test]
    fn portfolio_value_marks_holdings_at_book_prices() {
        let store = AccountStore::new(&seeded_db("value"), dec!(10000));
        let snap = store.get("Warren").unwrap();
        let mut prices = HashMap::new();
        prices.insert("AAPL".to_string(), dec!(210.00));
        prices.insert("MSFT".to_string(), dec!(400.00));
        // 4000 cash + 10*210 + 5*400
        let value = snap.portfolio_value(&prices);
        assert_eq!(value, dec!(8100.00));
        assert_eq!(snap.profit_loss(value), dec!(-1900.00));
    }

    #[test]
    fn unknown_symbol_is_valued_at_zero() {
        let store = AccountStore::new(&seeded_db("zero"), dec!(10000));
        let snap = store.get("Warren").unwrap();
        let value = snap.portfolio_value(&HashMap::new());
        assert_eq!(value, dec!(4000.00));
    }

    #[test]
    fn missing_account_is_a_collaborator_error() {
        let store = AccountStore::new(&seeded_db("missing"), dec!(10000));
        assert!(store.get("Nobody").is_err());
    }
}
