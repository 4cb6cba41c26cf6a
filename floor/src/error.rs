//! Error taxonomy for the floor service.
//!
//! Collaborator reads, the market-hours precondition, per-agent run
//! failures and dispatch construction each get their own variant so the
//! dispatcher can classify an outcome without string matching.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FloorError {
    /// A read from the shared database or a market API failed.
    /// Swallowed at poll boundaries, fatal only to a single export or round.
    #[error("collaborator unavailable: {0}")]
    Collaborator(String),

    /// Precondition short-circuit: nothing was launched.
    #[error("market is currently closed")]
    MarketClosed,

    /// One agent's engine run failed. Never aborts sibling agents.
    #[error("agent '{agent}' run failed: {message}")]
    AgentRun { agent: String, message: String },

    /// The round could not be constructed at all.
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

impl From<rusqlite::Error> for FloorError {
    fn from(e: rusqlite::Error) -> Self {
        FloorError::Collaborator(e.to_string())
    }
}

impl From<serde_json::Error> for FloorError {
    fn from(e: serde_json::Error) -> Self {
        FloorError::Collaborator(e.to_string())
    }
}
