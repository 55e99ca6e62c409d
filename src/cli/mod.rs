//! CLI for feature-agent
//!
//! Every input can also come from the environment, so the binary runs
//! unchanged inside a CI job.

use clap::Parser;
use std::path::PathBuf;

/// Implement a feature in the current checkout by driving an LLM through a tool loop
#[derive(Parser, Debug)]
#[command(name = "feature-agent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Feature to implement
    #[arg(short, long, env = "FEATURE_DESCRIPTION")]
    pub feature: Option<String>,

    /// Repository name, passed to the model as context
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Branch name, passed to the model as context
    #[arg(long, env = "BRANCH_NAME")]
    pub branch: Option<String>,

    /// Working directory for every tool
    #[arg(short, long, default_value = ".")]
    pub workdir: PathBuf,

    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the iteration ceiling
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Override the model
    #[arg(long)]
    pub model: Option<String>,

    /// Override the audit log directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "feature-agent",
            "--feature",
            "add caching",
            "--workdir",
            "/repo",
            "--max-iterations",
            "7",
            "--log-dir",
            "/tmp/logs",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.feature.as_deref(), Some("add caching"));
        assert_eq!(cli.workdir, PathBuf::from("/repo"));
        assert_eq!(cli.max_iterations, Some(7));
        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/logs")));
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_workdir_defaults_to_current_dir() {
        let cli = Cli::try_parse_from(["feature-agent", "--feature", "x"]).unwrap();
        assert_eq!(cli.workdir, PathBuf::from("."));
        assert!(cli.max_iterations.is_none());
    }

    #[test]
    fn test_invalid_ceiling_rejected() {
        assert!(Cli::try_parse_from(["feature-agent", "--max-iterations", "many"]).is_err());
    }
}
