//! FeatureAgent - the bounded completion/tool-dispatch loop

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::prompt::{self, FeatureRequest};
use super::state::{RunReport, RunState, RunStatus};
use crate::audit::AuditLog;
use crate::conversation::Conversation;
use crate::error::{AgentError, Result};
use crate::llm::{CompletionRequest, CompletionResponse, ContentBlock, LlmClient, ToolResult};
use crate::tools::ToolSet;

/// Per-run knobs for the loop
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub max_iterations: u32,
    pub max_tokens: Option<u32>,
    pub model: Option<String>,
    /// Outer deadline for a single completion request
    pub request_timeout: Duration,
    /// Conventions document, relative to the working directory
    pub conventions_file: PathBuf,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            max_tokens: None,
            model: None,
            request_timeout: Duration::from_secs(300),
            conventions_file: PathBuf::from("CLAUDE.md"),
        }
    }
}

/// Drives one model through the tool set until it stops, fails, or hits the ceiling
pub struct FeatureAgent<L: LlmClient> {
    llm: Arc<L>,
    tools: ToolSet,
    settings: AgentSettings,
}

impl<L: LlmClient> FeatureAgent<L> {
    pub fn new(llm: Arc<L>, tools: ToolSet, settings: AgentSettings) -> Self {
        Self { llm, tools, settings }
    }

    /// Run to a terminal state. Always finalizes the audit log.
    pub async fn run(&self, request: &FeatureRequest, audit: &mut AuditLog) -> RunReport {
        let mut state = RunState::new(self.settings.max_iterations);

        let report = match self.drive(request, &mut state, audit).await {
            Ok(status) => state.report(status, None),
            Err(e) => {
                state.stop();
                record_failure(audit, &e, state.iteration);
                state.report(RunStatus::Failed, Some(e.to_string()))
            }
        };

        finish(audit, report)
    }

    async fn drive(&self, request: &FeatureRequest, state: &mut RunState, audit: &mut AuditLog) -> Result<RunStatus> {
        let working_dir = self.tools.context().working_dir.clone();
        audit.system(
            "Run started",
            json!({
                "model": self.settings.model.as_deref().unwrap_or(self.llm.model()),
                "max_iterations": self.settings.max_iterations,
                "repository": request.repository,
                "branch": request.branch,
                "working_dir": working_dir.display().to_string(),
            }),
        )?;

        request.validate()?;

        let conventions = prompt::load_conventions(&working_dir, &self.settings.conventions_file);
        if let Some(text) = &conventions {
            audit.system(
                "Loaded project conventions",
                json!({
                    "path": self.settings.conventions_file.display().to_string(),
                    "length": text.len(),
                }),
            )?;
        }

        let definitions = self.tools.definitions();
        let system = prompt::system_prompt(&definitions, conventions.as_deref());
        let mut conversation = Conversation::new(system, definitions);
        conversation.push_user_text(prompt::user_message(request, &working_dir));

        loop {
            if !state.begin_iteration() {
                log::warn!("Iteration limit of {} reached", state.max_iterations);
                audit.system(
                    "Iteration limit reached",
                    json!({ "iterations": state.iteration, "max_iterations": state.max_iterations }),
                )?;
                return Ok(RunStatus::IterationLimit);
            }

            log::info!("Iteration {}/{}", state.iteration, state.max_iterations);
            audit.system(format!("Iteration {}", state.iteration), json!({ "iteration": state.iteration }))?;

            let completion = conversation.to_request(self.settings.max_tokens, self.settings.model.clone())?;
            let mut response = self.complete(completion).await?;
            state.usage.add(&response.usage);
            response.content = drop_repeated_calls(response.content, audit)?;
            log::debug!(
                "Response: stop_reason={:?}, blocks={}, tokens={}",
                response.stop_reason,
                response.content.len(),
                response.usage.total()
            );

            let results = self.dispatch(&response, state.iteration, audit).await?;

            if results.is_empty() || response.stop_reason.is_natural_end() {
                audit.system(
                    "Model finished",
                    json!({ "stop_reason": response.stop_reason, "pending_tool_calls": results.len() }),
                )?;
                return Ok(RunStatus::Completed);
            }

            conversation.push_assistant(response.content);
            conversation.push_tool_results(results)?;
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let after = self.settings.request_timeout;
        tokio::time::timeout(after, self.llm.complete(request))
            .await
            .map_err(|_| AgentError::Timeout {
                operation: "completion request".to_string(),
                after,
            })?
    }

    /// Log the model's text, then run its tool calls one at a time
    async fn dispatch(&self, response: &CompletionResponse, iteration: u32, audit: &mut AuditLog) -> Result<Vec<ToolResult>> {
        let text = response.text();
        if !text.trim().is_empty() {
            audit.message(text, json!({ "iteration": iteration }))?;
        }

        let mut results = Vec::new();
        for call in response.tool_calls() {
            results.push(self.tools.dispatch(&call, audit).await?);
        }
        Ok(results)
    }
}

/// Keep the first tool_use for each id; later repeats are logged as errors and never run
fn drop_repeated_calls(content: Vec<ContentBlock>, audit: &mut AuditLog) -> Result<Vec<ContentBlock>> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(content.len());

    for block in content {
        if let ContentBlock::ToolUse { id, name, .. } = &block {
            if !seen.insert(id.clone()) {
                log::warn!("Dropping repeated tool call id {} ({})", id, name);
                audit.error(
                    format!("Repeated tool call id ignored: {}", id),
                    json!({ "tool": name, "tool_use_id": id }),
                )?;
                continue;
            }
        }
        kept.push(block);
    }

    Ok(kept)
}

/// End a run that never reached the loop (e.g. no credentials)
pub fn abort_run(audit: &mut AuditLog, error: &AgentError, max_iterations: u32) -> RunReport {
    let state = RunState::new(max_iterations);
    record_failure(audit, error, state.iteration);
    finish(audit, state.report(RunStatus::Failed, Some(error.to_string())))
}

fn record_failure(audit: &mut AuditLog, error: &AgentError, iteration: u32) {
    log::error!("Run failed: {}", error);
    if let Err(e) = audit.error(format!("Run failed: {}", error), json!({ "iteration": iteration })) {
        log::error!("Failed to record run failure: {}", e);
    }
}

/// Log the terminal entry and finalize; a finalize failure fails the run
fn finish(audit: &mut AuditLog, mut report: RunReport) -> RunReport {
    if let Err(e) = audit.system(
        format!("Run finished: {}", report.status),
        json!({
            "status": report.status,
            "iterations": report.iterations,
            "input_tokens": report.usage.input_tokens,
            "output_tokens": report.usage.output_tokens,
        }),
    ) {
        log::error!("Failed to record run end: {}", e);
    }

    if let Err(e) = audit.finalize(&report) {
        log::error!("Failed to finalize audit log: {}", e);
        report.status = RunStatus::Failed;
        report.error.get_or_insert_with(|| e.to_string());
    }
    report
}
