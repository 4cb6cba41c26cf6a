//! Market-hours oracle and the engine's cached end-of-day prices.

use crate::error::FloorError;
use rust_decimal::Decimal;
use rusqlite::{Connection, OpenFlags};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, warn};

/// Answers "is the market open right now". The dispatcher only needs the
/// boolean; oracle failures are resolved inside the implementation.
pub trait MarketHours: Send + Sync {
    fn is_open(&self) -> impl Future<Output = bool> + Send;
}

#[derive(Debug, Deserialize)]
struct MarketStatus {
    market: String,
}

/// Polygon-backed market clock with the simulation's env override.
/// Transient status-API failures default to open so a flaky endpoint
/// never blocks a manual round.
#[derive(Clone)]
pub struct MarketClock {
    client: reqwest::Client,
    api_key: String,
    force_open: bool,
}

impl MarketClock {
    pub fn new(api_key: &str, force_open: bool) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("HTTP client"),
            api_key: api_key.to_string(),
            force_open,
        }
    }

    async fn poll_status(&self) -> Result<bool, FloorError> {
        let url = format!(
            "https://api.polygon.io/v1/marketstatus/now?apiKey={}",
            self.api_key
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FloorError::Collaborator(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(FloorError::Collaborator(format!(
                "market status HTTP {}",
                resp.status()
            )));
        }
        let status: MarketStatus = resp
            .json::<MarketStatus>()
            .await
            .map_err(|e| FloorError::Collaborator(e.to_string()))?;
        Ok(status.market == "open")
    }
}

impl MarketHours for MarketClock {
    async fn is_open(&self) -> bool {
        if self.force_open {
            debug!("RUN_EVEN_WHEN_MARKET_IS_CLOSED override active");
            return true;
        }
        if self.api_key.is_empty() {
            warn!("POLYGON_API_KEY not set — treating market as open");
            return true;
        }
        match self.poll_status().await {
            Ok(open) => open,
            Err(e) => {
                warn!("Market status check failed: {e} — defaulting to open");
                true
            }
        }
    }
}

/// Latest end-of-day prices the engine has cached, one JSON document per
/// trading date.
#[derive(Debug, Clone)]
pub struct PriceBook {
    db_path: String,
}

impl PriceBook {
    pub fn new(db_path: &str) -> Self {
        Self {
            db_path: db_path.to_string(),
        }
    }

    fn open(&self) -> Result<Connection, FloorError> {
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    /// The most recent price map (symbol → close).
    pub fn latest(&self) -> Result<HashMap<String, Decimal>, FloorError> {
        let conn = self.open()?;
        let json: String = conn.query_row(
            "SELECT data FROM market ORDER BY date DESC LIMIT 1",
            [],
            |row| row.get(0),
        )?;
        let prices: HashMap<String, Decimal> = serde_json::from_str(&json)?;
        Ok(prices)
    }
}
