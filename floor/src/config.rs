use crate::types::TraderSpec;
use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Default roster, matching the simulation's four stock traders.
/// Override with TRADERS="Name:Lastname:Model;..." in the environment.
const DEFAULT_TRADERS: &[(&str, &str, &str)] = &[
    ("Warren", "Patience", "GPT 4o Mini"),
    ("George", "Bold", "DeepSeek V3"),
    ("Ray", "Systematic", "Gemini 2.0 Flash"),
    ("Cathie", "Crypto", "Grok 3 Mini"),
];

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub dashboard_port: u16,
    pub export_dir: String,
    /// Command that runs one agent's trading round, whitespace-split.
    /// The agent name and `--once` are appended per invocation.
    pub engine_cmd: String,
    pub run_even_when_closed: bool,
    pub polygon_api_key: String,
    /// Starting grant per account, the P&L baseline when the snapshot
    /// does not carry its own.
    pub initial_balance: Decimal,
    /// How many log lines each card's tail shows.
    pub log_tail: usize,
    pub traders: Vec<TraderSpec>,
}

impl Config {
    /// Load config from a specific .env file, or the default `.env` if None.
    pub fn from_env_file(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => {
                dotenvy::from_filename(p).ok();
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        Self::build_from_env()
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::build_from_env()
    }

    fn build_from_env() -> Result<Self> {
        let traders = match std::env::var("TRADERS") {
            Ok(raw) => parse_traders(&raw)?,
            Err(_) => DEFAULT_TRADERS
                .iter()
                .map(|(n, l, m)| TraderSpec::new(n, l, m))
                .collect(),
        };

        Ok(Self {
            db_path: env("DB_PATH", "trading_floor.db"),
            dashboard_port: env("DASHBOARD_PORT", "3000").parse().unwrap_or(3000),
            export_dir: env("EXPORT_DIR", "."),
            engine_cmd: env("ENGINE_CMD", "target/release/trading-engine"),
            run_even_when_closed: env("RUN_EVEN_WHEN_MARKET_IS_CLOSED", "false")
                .trim()
                .to_lowercase()
                == "true",
            polygon_api_key: env("POLYGON_API_KEY", ""),
            initial_balance: env_decimal("INITIAL_BALANCE", "10000")?,
            log_tail: env("LOG_TAIL", "13").parse().unwrap_or(13),
            traders,
        })
    }
}

/// Parse `Name:Lastname:Model;Name:Lastname:Model;...`
fn parse_traders(raw: &str) -> Result<Vec<TraderSpec>> {
    let mut specs = Vec::new();
    for part in raw.split(';').filter(|p| !p.trim().is_empty()) {
        let fields: Vec<&str> = part.splitn(3, ':').map(str::trim).collect();
        match fields.as_slice() {
            [name, lastname, model] if !name.is_empty() => {
                specs.push(TraderSpec::new(name, lastname, model));
            }
            _ => bail!("Invalid TRADERS entry: {part:?} (expected Name:Lastname:Model)"),
        }
    }
    if specs.is_empty() {
        bail!("TRADERS was set but contained no traders");
    }
    Ok(specs)
}

fn env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_decimal(key: &str, default: &str) -> Result<Decimal> {
    let val = env(key, default);
    Decimal::from_str(&val).with_context(|| format!("Invalid decimal for {key}: {val}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roster_entries() {
        let specs = parse_traders("Warren:Patience:GPT 4o Mini;Ray:Systematic:Gemini 2.0 Flash")
            .unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "Warren");
        assert_eq!(specs[1].model, "Gemini 2.0 Flash");
    }

    #[test]
    fn rejects_malformed_roster() {
        assert!(parse_traders("just-a-name").is_err());
        assert!(parse_traders(";;").is_err());
    }
}
