//! On-demand CSV exports of the whole floor.
//!
//! Two files per export, sharing one timestamp: a per-agent summary and
//! the full transaction history with rationale. Reads go through the
//! same read-only snapshots as the dashboard, so an export can never
//! corrupt or block a round that is in flight.

use crate::account::AccountStore;
use crate::market::PriceBook;
use crate::types::TraderSpec;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct ExportReport {
    pub summary_path: PathBuf,
    pub transactions_path: Option<PathBuf>,
}

impl ExportReport {
    /// Status string shown next to the download button.
    pub fn status_line(&self) -> String {
        match &self.transactions_path {
            Some(txn) => format!(
                "📊 Summary saved to {}\n📄 Detailed transactions saved to {}",
                self.summary_path.display(),
                txn.display()
            ),
            None => format!(
                "📊 Summary saved to {}\n⚠️ No transactions found for any agent.",
                self.summary_path.display()
            ),
        }
    }
}

/// Write the summary CSV (and the transactions CSV when there is anything
/// to put in it) into `out_dir`. Traders whose account cannot be read are
/// skipped with a warning rather than sinking the whole export.
pub fn write_exports(
    traders: &[TraderSpec],
    store: &AccountStore,
    prices: &PriceBook,
    out_dir: &Path,
) -> Result<ExportReport> {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let summary_path = out_dir.join(format!("trading_summary_{stamp}.csv"));
    let transactions_path = out_dir.join(format!("trading_transactions_{stamp}.csv"));

    let book = match prices.latest() {
        Ok(book) => book,
        Err(e) => {
            warn!("Price cache unavailable for export: {e} — valuing holdings at zero");
            Default::default()
        }
    };

    let mut summary = String::from("Agent,Portfolio Value,P&L,Holdings,Recent Trades,Strategy\n");
    let mut transactions =
        String::from("Agent,Timestamp,Symbol,Quantity,Price,Rationale\n");
    let mut transaction_count = 0usize;

    for spec in traders {
        let snap = match store.get(&spec.name) {
            Ok(snap) => snap,
            Err(e) => {
                warn!("Skipping {} in export: {e}", spec.name);
                continue;
            }
        };

        let value = snap.portfolio_value(&book).round_dp(2);
        let pnl = snap.profit_loss(value).round_dp(2);
        let holdings = if snap.holdings.is_empty() {
            "None".to_string()
        } else {
            snap.holdings
                .iter()
                .map(|(symbol, qty)| format!("{symbol}: {qty}"))
                .collect::<Vec<_>>()
                .join(", ")
        };

        summary.push_str(&format!(
            "{},${value},${pnl},{},{},{}\n",
            csv_field(&spec.title()),
            csv_field(&holdings),
            snap.transactions.len(),
            csv_field(&snap.strategy),
        ));

        for txn in &snap.transactions {
            transaction_count += 1;
            transactions.push_str(&format!(
                "{},{},{},{},{},{}\n",
                csv_field(&spec.title()),
                csv_field(&txn.timestamp),
                csv_field(&txn.symbol),
                txn.quantity,
                txn.price,
                csv_field(&txn.rationale),
            ));
        }
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Create export dir {}", out_dir.display()))?;
    std::fs::write(&summary_path, summary)
        .with_context(|| format!("Write {}", summary_path.display()))?;

    let transactions_path = if transaction_count > 0 {
        std::fs::write(&transactions_path, transactions)
            .with_context(|| format!("Write {}", transactions_path.display()))?;
        Some(transactions_path)
    } else {
        None
    };

    Ok(ExportReport {
        summary_path,
        transactions_path,
    })
}

/// Quote a CSV field when it carries a delimiter, quote or newline.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use rust_decimal_macros::dec;

    fn seeded_db(tag: &str, with_transactions: bool) -> String {
        let path = std::env::temp_dir().join(format!(
            "trading-floor-export-{tag}-{}.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE accounts (name TEXT PRIMARY KEY, account TEXT);
             CREATE TABLE market (date TEXT PRIMARY KEY, data TEXT);",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO market (date, data) VALUES ('2025-06-02', ?1)",
            rusqlite::params![r#"{"AAPL": "200.00"}"#],
        )
        .unwrap();
        let txns = if with_transactions {
            serde_json::json!([{
                "timestamp": "2025-06-02T10:00:04", "symbol": "AAPL",
                "quantity": 10, "price": "200.00",
                "rationale": "Cheap, durable moat."
            }])
        } else {
            serde_json::json!([])
        };
        let account = serde_json::json!({
            "balance": "4000.00",
            "strategy": "Buy quality, hold forever.",
            "holdings": {"AAPL": 10},
            "transactions": txns,
            "portfolio_value_time_series": []
        });
        conn.execute(
            "INSERT INTO accounts (name, account) VALUES ('Warren', ?1)",
            rusqlite::params![account.to_string()],
        )
        .unwrap();
        path.to_string_lossy().to_string()
    }

    fn roster() -> Vec<TraderSpec> {
        vec![
            TraderSpec::new("Warren", "Patience", "GPT 4o Mini"),
            TraderSpec::new("Ghost", "Missing", "No Engine"),
        ]
    }

    #[test]
    fn export_writes_summary_and_transactions() {
        let path = seeded_db("full", true);
        let out_dir = std::env::temp_dir().join(format!(
            "trading-floor-export-out-{}",
            std::process::id()
        ));
        let report = write_exports(
            &roster(),
            &AccountStore::new(&path, dec!(10000)),
            &PriceBook::new(&path),
            &out_dir,
        )
        .unwrap();

        let summary = std::fs::read_to_string(&report.summary_path).unwrap();
        // Header plus Warren; the unreadable Ghost account is skipped.
        assert_eq!(summary.lines().count(), 2);
        assert!(summary.contains("Warren (GPT 4o Mini) - Patience"));
        assert!(summary.contains("$6000.00"));
        assert!(summary.contains("AAPL: 10"));
        assert!(summary.contains("\"Buy quality, hold forever.\""));

        let txn_path = report.transactions_path.clone().expect("transactions file");
        let txns = std::fs::read_to_string(txn_path).unwrap();
        assert_eq!(txns.lines().count(), 2);
        assert!(txns.contains("Cheap, durable moat."));
        assert!(report.status_line().contains("Detailed transactions"));
    }

    #[test]
    fn export_without_transactions_writes_summary_only() {
        let path = seeded_db("empty", false);
        let out_dir = std::env::temp_dir().join(format!(
            "trading-floor-export-empty-{}",
            std::process::id()
        ));
        let report = write_exports(
            &roster(),
            &AccountStore::new(&path, dec!(10000)),
            &PriceBook::new(&path),
            &out_dir,
        )
        .unwrap();
        assert!(report.transactions_path.is_none());
        assert!(report.status_line().contains("No transactions"));
    }

    #[test]
    fn csv_fields_with_commas_are_quoted() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a, b"), "\"a, b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
