//! LLM client layer: Anthropic Messages API and transcript types

pub mod anthropic;
pub mod client;
pub mod types;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use client::{LlmClient, MockLlmClient};
pub use types::{
    CompletionRequest, CompletionResponse, ContentBlock, Message, MessageContent, Role, StopReason, ToolCall,
    ToolDefinition, ToolResult, Usage,
};
