//! feature-agent - autonomous feature implementation in a checked-out repository
//!
//! An LLM is driven through a bounded loop of completion requests and tool
//! calls (read, write, edit, shell, glob). Every action lands in an audit log
//! that survives crashes.

pub mod agent;
pub mod audit;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod tools;

pub use error::{AgentError, Result};
