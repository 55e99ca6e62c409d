//! Prompt assembly for a feature run

use std::path::Path;

use crate::error::{AgentError, Result};
use crate::llm::ToolDefinition;

/// What the agent was asked to build, and where
#[derive(Debug, Clone, Default)]
pub struct FeatureRequest {
    pub description: String,
    pub repository: Option<String>,
    pub branch: Option<String>,
}

impl FeatureRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// A blank description is missing input
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(AgentError::MissingInput("feature description is empty".to_string()));
        }
        Ok(())
    }
}

const GUIDELINES: &str = "\
## Guidelines

1. Explore the repository before changing it: find the relevant files and read them.
2. Follow the existing code style and the project conventions below.
3. Prefer edit_file for small changes to existing files; use write_file for new files.
4. Run the project's build and tests with run_command and fix any failures you cause.
5. Keep changes focused on the requested feature.
6. When the feature is complete, reply with a short summary and no further tool calls.";

/// Read the conventions document, if the project has one.
///
/// A missing file is normal. Any other read failure is logged and treated as absent.
pub fn load_conventions(working_dir: &Path, file: &Path) -> Option<String> {
    let path = working_dir.join(file);
    match std::fs::read_to_string(&path) {
        Ok(content) if !content.trim().is_empty() => Some(content),
        Ok(_) => None,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No conventions file at {}", path.display());
            None
        }
        Err(e) => {
            log::warn!("Failed to read conventions file {}: {}", path.display(), e);
            None
        }
    }
}

/// System prompt: role, tool capabilities, conventions, guidelines
pub fn system_prompt(tools: &[ToolDefinition], conventions: Option<&str>) -> String {
    let mut prompt = String::from(
        "You are a software engineer implementing a feature in an existing repository. \
         You work only through the tools below; every path is relative to the repository root.\n\n\
         ## Tools\n\n",
    );

    for tool in tools {
        prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
    }

    if let Some(conventions) = conventions {
        prompt.push_str("\n## Project Conventions\n\n");
        prompt.push_str(conventions.trim_end());
        prompt.push('\n');
    }

    prompt.push('\n');
    prompt.push_str(GUIDELINES);
    prompt
}

/// Initial user turn: the feature plus where the work happens
pub fn user_message(request: &FeatureRequest, working_dir: &Path) -> String {
    let mut message = format!("Implement the following feature:\n\n{}\n\n## Context\n\n", request.description.trim());

    if let Some(repository) = &request.repository {
        message.push_str(&format!("- Repository: {}\n", repository));
    }
    if let Some(branch) = &request.branch {
        message.push_str(&format!("- Branch: {}\n", branch));
    }
    message.push_str(&format!("- Working directory: {}\n", working_dir.display()));
    message
}
