//! Per-agent run operations.
//!
//! One trading round for one agent means one invocation of the external
//! engine, which owns the decision logic, account writes and log writes.
//! The trait seam exists so the dispatcher can be exercised with scripted
//! runners in tests.

use crate::error::FloorError;
use crate::types::TraderSpec;
use std::future::Future;
use std::path::PathBuf;
use tracing::debug;

pub trait AgentRunner: Send + Sync {
    /// Verify a round can be dispatched at all. Called once per round,
    /// before anything is launched.
    fn preflight(&self) -> Result<(), FloorError> {
        Ok(())
    }

    /// Run one trading round for a single agent. An error here is scoped
    /// to that agent and never aborts its siblings.
    fn run(&self, spec: &TraderSpec) -> impl Future<Output = Result<(), FloorError>> + Send;
}

/// Spawns the configured engine command once per agent and awaits its
/// exit status.
#[derive(Debug, Clone)]
pub struct EngineRunner {
    program: PathBuf,
    args: Vec<String>,
}

impl EngineRunner {
    /// Split a command line like `target/release/trading-engine --quiet`
    /// into program + fixed args. Per-agent args are appended at run time.
    pub fn from_command(cmd: &str) -> Self {
        let mut parts = cmd.split_whitespace();
        let program = PathBuf::from(parts.next().unwrap_or_default());
        let args = parts.map(str::to_string).collect();
        Self { program, args }
    }
}

impl AgentRunner for EngineRunner {
    fn preflight(&self) -> Result<(), FloorError> {
        if self.program.as_os_str().is_empty() {
            return Err(FloorError::Dispatch("no engine command configured".into()));
        }
        // A bare program name resolves through PATH at spawn time; only an
        // explicit path can be checked up front.
        if self.program.components().count() > 1 && !self.program.exists() {
            return Err(FloorError::Dispatch(format!(
                "engine binary not found: {}",
                self.program.display()
            )));
        }
        Ok(())
    }

    async fn run(&self, spec: &TraderSpec) -> Result<(), FloorError> {
        debug!("Launching engine for {}", spec.name);
        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg("--agent")
            .arg(&spec.name)
            .arg("--once")
            .status()
            .await
            .map_err(|e| FloorError::AgentRun {
                agent: spec.name.clone(),
                message: format!("spawn failed: {e}"),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(FloorError::AgentRun {
                agent: spec.name.clone(),
                message: format!("engine exited with {status}"),
            })
        }
    }
}
