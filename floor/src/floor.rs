//! Concurrent run dispatcher: scatter one engine run per trader, gather
//! one aggregated outcome.
//!
//! This is the only place fan-out/fan-in happens. Every agent's run is an
//! isolated failure domain: one agent blowing up never cancels or blocks
//! the others, and the joined results are folded into a single
//! `RunOutcome` per invocation. A terminal outcome is never retried here;
//! each user trigger starts a fresh round.

use crate::error::FloorError;
use crate::market::MarketHours;
use crate::runner::AgentRunner;
use crate::types::{AgentFailure, RoundPhase, RunOutcome, TraderSpec};
use futures::future::join_all;
use tokio::sync::watch;
use tracing::{info, warn};

pub struct TradingFloor<R, M> {
    traders: Vec<TraderSpec>,
    runner: R,
    market: M,
    phase_tx: watch::Sender<RoundPhase>,
}

impl<R: AgentRunner, M: MarketHours> TradingFloor<R, M> {
    pub fn new(traders: Vec<TraderSpec>, runner: R, market: M) -> Self {
        let (phase_tx, _) = watch::channel(RoundPhase::Idle);
        Self {
            traders,
            runner,
            market,
            phase_tx,
        }
    }

    pub fn traders(&self) -> &[TraderSpec] {
        &self.traders
    }

    /// Current phase of the in-flight round, `Idle` between rounds.
    pub fn phase(&self) -> RoundPhase {
        *self.phase_tx.borrow()
    }

    /// Run one full trading round across all agents and aggregate the
    /// result. The phase channel ends on `Idle` whatever happened.
    pub async fn run_round(&self) -> RunOutcome {
        let outcome = match self.try_dispatch().await {
            Ok(failures) if failures.is_empty() => RunOutcome::AllSucceeded {
                agents: self.traders.len(),
            },
            Ok(failures) => RunOutcome::PartialFailure { failures },
            Err(FloorError::MarketClosed) => RunOutcome::MarketClosed,
            Err(e) => RunOutcome::Fatal {
                message: e.to_string(),
            },
        };
        self.phase_tx.send_replace(RoundPhase::Idle);
        info!("{}", outcome.status_line());
        outcome
    }

    /// Precondition checks, fan-out, fan-in. Returns the per-agent
    /// failures of a round that did launch; errors mean nothing launched.
    async fn try_dispatch(&self) -> Result<Vec<AgentFailure>, FloorError> {
        self.phase_tx.send_replace(RoundPhase::Dispatching);

        if !self.market.is_open().await {
            return Err(FloorError::MarketClosed);
        }
        if self.traders.is_empty() {
            return Err(FloorError::Dispatch("no traders configured".into()));
        }
        self.runner.preflight()?;

        let n = self.traders.len();
        self.phase_tx
            .send_replace(RoundPhase::Running { agents: n });
        info!("Dispatching trading round for {n} agents");

        // All runs launch together and are awaited together; completion
        // order is irrelevant because each result carries its agent name.
        let runs = self.traders.iter().map(|spec| async move {
            let result = self.runner.run(spec).await;
            (spec.name.clone(), result)
        });
        let results = join_all(runs).await;

        self.phase_tx.send_replace(RoundPhase::Aggregating);
        let mut failures = Vec::new();
        for (agent, result) in results {
            match result {
                Ok(()) => info!("{agent}: round complete"),
                Err(e) => {
                    warn!("{agent}: round failed: {e}");
                    failures.push(AgentFailure {
                        agent,
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(failures)
    }
}
