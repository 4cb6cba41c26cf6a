use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One trader on the floor. Display identity only; the decision logic
/// lives in the external engine process that owns the matching account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraderSpec {
    pub name: String,
    pub lastname: String,
    pub model: String,
}

impl TraderSpec {
    pub fn new(name: &str, lastname: &str, model: &str) -> Self {
        Self {
            name: name.to_string(),
            lastname: lastname.to_string(),
            model: model.to_string(),
        }
    }

    /// Card title, rendered once per trader: `Warren (GPT 4o Mini) - Patience`
    pub fn title(&self) -> String {
        format!("{} ({}) - {}", self.name, self.model, self.lastname)
    }
}

/// Log categories written by the engine's tracer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    Trace,
    Agent,
    Function,
    Generation,
    Response,
    Account,
}

impl LogCategory {
    /// Unknown categories fall back to `Trace`, the neutral bucket.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "agent" => LogCategory::Agent,
            "function" => LogCategory::Function,
            "generation" => LogCategory::Generation,
            "response" => LogCategory::Response,
            "account" => LogCategory::Account,
            _ => LogCategory::Trace,
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogCategory::Trace => write!(f, "trace"),
            LogCategory::Agent => write!(f, "agent"),
            LogCategory::Function => write!(f, "function"),
            LogCategory::Generation => write!(f, "generation"),
            LogCategory::Response => write!(f, "response"),
            LogCategory::Account => write!(f, "account"),
        }
    }
}

/// One line of an agent's activity log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub category: LogCategory,
    pub message: String,
}

/// One executed trade as recorded in the account snapshot.
/// Negative quantity is a sell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub timestamp: String,
    pub symbol: String,
    pub quantity: i64,
    pub price: Decimal,
    pub rationale: String,
}

/// One point of the portfolio value time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuePoint {
    pub datetime: String,
    pub value: Decimal,
}

/// One agent's failure inside an otherwise completed round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentFailure {
    pub agent: String,
    pub error: String,
}

/// Aggregated result of one dispatched trading round. Created fresh per
/// invocation and rendered once into a user-facing status line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    AllSucceeded { agents: usize },
    PartialFailure { failures: Vec<AgentFailure> },
    MarketClosed,
    Fatal { message: String },
}

impl RunOutcome {
    /// Human-readable status string shown next to the run button.
    pub fn status_line(&self) -> String {
        match self {
            RunOutcome::AllSucceeded { agents } => {
                format!("✅ Trading round completed for all {agents} agents")
            }
            RunOutcome::PartialFailure { failures } => {
                let who: Vec<&str> = failures.iter().map(|f| f.agent.as_str()).collect();
                format!(
                    "⚠️ Trading round finished with {} failure(s): {}",
                    failures.len(),
                    who.join(", ")
                )
            }
            RunOutcome::MarketClosed => "⚠️ Market is currently closed".to_string(),
            RunOutcome::Fatal { message } => format!("❌ Error running trades: {message}"),
        }
    }
}

/// Where a round currently is. Published over a watch channel so the
/// status endpoint can report progress without touching the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Idle,
    Dispatching,
    Running { agents: usize },
    Aggregating,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundPhase::Idle => write!(f, "idle"),
            RoundPhase::Dispatching => write!(f, "dispatching"),
            RoundPhase::Running { agents } => write!(f, "running({agents})"),
            RoundPhase::Aggregating => write!(f, "aggregating"),
        }
    }
}
