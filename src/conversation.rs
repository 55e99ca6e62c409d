//! Conversation state: the append-only transcript and the static tool schema
//!
//! The whole transcript is resent on every request, so turns are never
//! edited or removed once pushed.

use std::collections::HashSet;

use crate::error::{AgentError, Result};
use crate::llm::{CompletionRequest, ContentBlock, Message, Role, ToolDefinition, ToolResult};

#[derive(Debug, Clone)]
pub struct Conversation {
    system: String,
    tools: Vec<ToolDefinition>,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(system: impl Into<String>, tools: Vec<ToolDefinition>) -> Self {
        Self {
            system: system.into(),
            tools,
            messages: Vec::new(),
        }
    }

    pub fn push_user_text(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Append the model's response content exactly as received
    pub fn push_assistant(&mut self, content: Vec<ContentBlock>) {
        self.messages.push(Message::assistant(content));
    }

    /// Answer every pending tool call of the last assistant turn.
    ///
    /// The ids must match the pending calls exactly, in any order; otherwise
    /// nothing is appended and a protocol error is returned.
    pub fn push_tool_results(&mut self, results: Vec<ToolResult>) -> Result<()> {
        let pending: HashSet<&str> = self.pending_tool_calls().into_iter().collect();
        let answered: HashSet<&str> = results.iter().map(|r| r.tool_use_id.as_str()).collect();

        if answered.len() != results.len() {
            return Err(AgentError::Protocol("duplicate tool result id".to_string()));
        }
        if pending != answered {
            let mut missing: Vec<_> = pending.difference(&answered).copied().collect();
            let mut unexpected: Vec<_> = answered.difference(&pending).copied().collect();
            missing.sort_unstable();
            unexpected.sort_unstable();
            return Err(AgentError::Protocol(format!(
                "tool results do not match calls (missing: {:?}, unexpected: {:?})",
                missing, unexpected
            )));
        }

        self.messages.push(Message::tool_results(results));
        Ok(())
    }

    /// Tool-use ids in the latest assistant turn with no answering results turn
    pub fn pending_tool_calls(&self) -> Vec<&str> {
        match self.messages.last() {
            Some(last) if last.role == Role::Assistant => last
                .blocks()
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse { id, .. } => Some(id.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Build a request carrying the full transcript and schema.
    ///
    /// Refuses while any tool call is unanswered.
    pub fn to_request(&self, max_tokens: Option<u32>, model: Option<String>) -> Result<CompletionRequest> {
        let pending = self.pending_tool_calls();
        if !pending.is_empty() {
            return Err(AgentError::Protocol(format!("unanswered tool calls: {}", pending.join(", "))));
        }
        if self.messages.is_empty() {
            return Err(AgentError::Protocol("conversation has no turns".to_string()));
        }

        Ok(CompletionRequest {
            system: self.system.clone(),
            messages: self.messages.clone(),
            tools: self.tools.clone(),
            max_tokens,
            model,
        })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}
