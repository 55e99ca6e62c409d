//! Run state and terminal report

use serde::{Deserialize, Serialize};

use crate::llm::Usage;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The model stopped on its own
    Completed,
    /// The iteration ceiling was reached; not an error
    IterationLimit,
    /// A fault escaped the loop, or required input was missing
    Failed,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        !matches!(self, RunStatus::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Completed => "completed",
            RunStatus::IterationLimit => "iteration limit reached",
            RunStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Final outcome of a run, persisted into the snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub iterations: u32,
    pub max_iterations: u32,
    pub error: Option<String>,
    pub usage: Usage,
}

impl RunReport {
    /// Process exit status: 0 unless the run failed
    pub fn exit_code(&self) -> i32 {
        if self.status.is_success() { 0 } else { 1 }
    }
}

/// Mutable loop state, owned by the orchestration loop for one run
#[derive(Debug, Clone)]
pub struct RunState {
    pub iteration: u32,
    pub max_iterations: u32,
    pub running: bool,
    pub usage: Usage,
}

impl RunState {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            iteration: 0,
            max_iterations,
            running: true,
            usage: Usage::default(),
        }
    }

    /// Claim the next iteration, or stop if the ceiling is reached
    pub fn begin_iteration(&mut self) -> bool {
        if !self.running || self.iteration >= self.max_iterations {
            self.running = false;
            return false;
        }
        self.iteration += 1;
        true
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn report(&self, status: RunStatus, error: Option<String>) -> RunReport {
        RunReport {
            status,
            iterations: self.iteration,
            max_iterations: self.max_iterations,
            error,
            usage: self.usage,
        }
    }
}
