//! Run and suite reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{FlowError, FlowResult};

/// Position of a run in its linear state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum RunState {
    /// About to execute the step at this index
    Pending(usize),
    Passed,
    /// Stopped at the step at this index
    Failed(usize),
}

impl RunState {
    /// State after the step at `index` of `total` succeeded
    pub fn advance(index: usize, total: usize) -> Self {
        if index + 1 >= total {
            RunState::Passed
        } else {
            RunState::Pending(index + 1)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Target element unavailable or unreachable within the wait window
    Interaction,
    /// Observed value failed the expected condition
    Assertion,
}

impl From<&FlowError> for FailureKind {
    fn from(err: &FlowError) -> Self {
        if err.is_assertion() {
            FailureKind::Assertion
        } else {
            FailureKind::Interaction
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub index: usize,
    pub step: String,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub index: usize,
    pub step: String,
    pub success: bool,
    pub duration_ms: u64,
}

/// Outcome of running one flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub name: String,
    pub state: RunState,
    pub total_steps: usize,
    pub steps_executed: usize,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub failure: Option<StepFailure>,
}

impl RunReport {
    /// Report for a flow that never reached its first step
    pub fn aborted(name: &str, total_steps: usize, err: &FlowError) -> Self {
        Self {
            name: name.to_string(),
            state: RunState::Failed(0),
            total_steps,
            steps_executed: 0,
            duration_ms: 0,
            steps: Vec::new(),
            failure: Some(StepFailure {
                index: 0,
                step: "connect".to_string(),
                kind: FailureKind::from(err),
                message: err.to_string(),
            }),
        }
    }

    pub fn passed(&self) -> bool {
        self.state == RunState::Passed
    }

    /// Index of the failing step, if any
    pub fn failed_at(&self) -> Option<usize> {
        match self.state {
            RunState::Failed(index) => Some(index),
            _ => None,
        }
    }

    /// The parts of a report that must agree between repeated runs
    pub fn outcome(&self) -> (RunState, usize, Option<&StepFailure>) {
        (self.state, self.steps_executed, self.failure.as_ref())
    }

    pub fn summary(&self) -> String {
        match &self.failure {
            None => format!(
                "✓ {} ({}/{} steps, {} ms)",
                self.name, self.steps_executed, self.total_steps, self.duration_ms
            ),
            Some(failure) => format!(
                "✗ {} - step {} [{}] {:?}: {}",
                self.name, failure.index, failure.step, failure.kind, failure.message
            ),
        }
    }
}

/// Outcome of running a list of flows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<RunReport>,
}

impl SuiteReport {
    pub fn new(started_at: DateTime<Utc>, results: Vec<RunReport>, duration_ms: u64) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        Self {
            started_at,
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration_ms,
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Write the report as `flow-results.json` under `output_dir`
    pub fn write(&self, output_dir: &Path) -> FlowResult<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let path = output_dir.join("flow-results.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}
