use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

mod cli;

use cli::Cli;
use feature_agent::AgentError;
use feature_agent::agent::{AgentSettings, FeatureAgent, FeatureRequest, RunReport, RunStatus, abort_run};
use feature_agent::audit::AuditLog;
use feature_agent::config::{AgentConfig, Config, LoggingConfig};
use feature_agent::llm::AnthropicClient;
use feature_agent::tools::ToolSet;

/// Operator logging goes to stderr; the audit log is the durable record
fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn apply_overrides(cli: &Cli, config: &mut Config) {
    if let Some(max_iterations) = cli.max_iterations {
        config.agent.max_iterations = max_iterations;
    }
    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    if let Some(log_dir) = &cli.log_dir {
        config.logging.dir = log_dir.clone();
    }
}

async fn run_application(cli: &Cli) -> Result<RunReport> {
    let mut config = match Config::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            // Still leave artifacts behind, in the best directory we know of
            let dir = cli.log_dir.clone().unwrap_or_else(|| LoggingConfig::default().dir);
            let mut audit = open_audit_log(&dir)?;
            let max_iterations = cli.max_iterations.unwrap_or(AgentConfig::default().max_iterations);
            let error = AgentError::Config(format!("{:#}", e));
            return Ok(abort_run(&mut audit, &error, max_iterations));
        }
    };
    apply_overrides(cli, &mut config);

    let mut audit = open_audit_log(&config.logging.dir)?;
    let max_iterations = config.agent.max_iterations;

    if !cli.workdir.is_dir() {
        let error = AgentError::MissingInput(format!("working directory {} does not exist", cli.workdir.display()));
        return Ok(abort_run(&mut audit, &error, max_iterations));
    }

    let mut request = FeatureRequest::new(cli.feature.clone().unwrap_or_default());
    if let Some(repository) = &cli.repository {
        request = request.with_repository(repository);
    }
    if let Some(branch) = &cli.branch {
        request = request.with_branch(branch);
    }
    if let Err(e) = request.validate() {
        return Ok(abort_run(&mut audit, &e, max_iterations));
    }

    let llm = match AnthropicClient::from_env(config.llm.anthropic()) {
        Ok(client) => Arc::new(client),
        Err(e) => return Ok(abort_run(&mut audit, &e, max_iterations)),
    };

    let settings = AgentSettings {
        max_iterations,
        max_tokens: Some(config.llm.max_tokens),
        model: Some(config.llm.model.clone()),
        request_timeout: config.llm.request_timeout(),
        conventions_file: config.agent.conventions_file.clone(),
    };
    let tools = ToolSet::new(config.agent.tool_context(&cli.workdir));
    let agent = FeatureAgent::new(llm, tools, settings);

    info!("Starting feature run with model {}", config.llm.model);
    Ok(agent.run(&request, &mut audit).await)
}

fn open_audit_log(dir: &Path) -> Result<AuditLog> {
    let audit = AuditLog::create(dir).context(format!("Failed to create audit log in {}", dir.display()))?;
    info!("Audit log: {}", audit.jsonl_path().display());
    Ok(audit)
}

fn print_report(report: &RunReport) {
    let status = match report.status {
        RunStatus::Completed => report.status.to_string().green(),
        RunStatus::IterationLimit => report.status.to_string().yellow(),
        RunStatus::Failed => report.status.to_string().red(),
    };
    println!(
        "{} {} after {}/{} iterations ({} tokens)",
        "Run".bold(),
        status,
        report.iterations,
        report.max_iterations,
        report.usage.total()
    );
    if let Some(error) = &report.error {
        println!("{} {}", "Error:".red(), error);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.is_verbose());

    match run_application(&cli).await {
        Ok(report) => {
            print_report(&report);
            if report.exit_code() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            ExitCode::FAILURE
        }
    }
}
