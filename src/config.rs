use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::AnthropicConfig;
use crate::llm::anthropic::{ANTHROPIC_API_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::tools::{DEFAULT_GLOB_LIMIT, DEFAULT_MAX_OUTPUT_BYTES, ToolContext};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub api_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: 300,
            api_url: ANTHROPIC_API_URL.to_string(),
        }
    }
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn anthropic(&self) -> AnthropicConfig {
        AnthropicConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            timeout: self.request_timeout(),
            api_url: self.api_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Hard ceiling on completion requests per run
    pub max_iterations: u32,
    /// Project conventions document, relative to the working directory
    pub conventions_file: PathBuf,
    pub command_timeout_secs: u64,
    pub max_output_bytes: usize,
    pub glob_limit: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            conventions_file: PathBuf::from("CLAUDE.md"),
            command_timeout_secs: 600,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            glob_limit: DEFAULT_GLOB_LIMIT,
        }
    }
}

impl AgentConfig {
    pub fn tool_context(&self, working_dir: impl Into<PathBuf>) -> ToolContext {
        ToolContext::new(working_dir)
            .with_command_timeout(Duration::from_secs(self.command_timeout_secs))
            .with_max_output_bytes(self.max_output_bytes)
            .with_glob_limit(self.glob_limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the audit artifacts
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".agent-logs"),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.agent.max_iterations, 50);
        assert_eq!(config.agent.glob_limit, 100);
        assert_eq!(config.agent.conventions_file, PathBuf::from("CLAUDE.md"));
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.logging.dir, PathBuf::from(".agent-logs"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feature-agent.yml");
        fs::write(&path, "agent:\n  max_iterations: 7\nllm:\n  model: claude-opus-4-20250514\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.agent.max_iterations, 7);
        assert_eq!(config.agent.command_timeout_secs, 600);
        assert_eq!(config.llm.model, "claude-opus-4-20250514");
        assert_eq!(config.llm.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.yml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.yml");
        fs::write(&path, "agent: [not, a, map").unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_tool_context_from_config() {
        let agent = AgentConfig {
            command_timeout_secs: 5,
            max_output_bytes: 1024,
            glob_limit: 10,
            ..Default::default()
        };

        let ctx = agent.tool_context("/repo");

        assert_eq!(ctx.working_dir, PathBuf::from("/repo"));
        assert_eq!(ctx.command_timeout, Duration::from_secs(5));
        assert_eq!(ctx.max_output_bytes, 1024);
        assert_eq!(ctx.glob_limit, 10);
    }

    #[test]
    fn test_anthropic_config_mapping() {
        let llm = LlmConfig {
            timeout_secs: 42,
            ..Default::default()
        };
        let anthropic = llm.anthropic();
        assert_eq!(anthropic.timeout, Duration::from_secs(42));
        assert_eq!(anthropic.model, DEFAULT_MODEL);
    }
}
