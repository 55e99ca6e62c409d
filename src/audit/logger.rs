//! Append-only audit log with synchronous JSONL persistence.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::entry::{LogEntry, LogKind};
use crate::agent::{RunReport, RunStatus};
use crate::error::{AgentError, Result};
use crate::llm::Usage;

/// Incremental record, one entry per line
pub const JSONL_FILE: &str = "agent-log.jsonl";
/// Final snapshot written once at the end of a run
pub const SNAPSHOT_FILE: &str = "agent-log.json";
/// Error-only summary, present only after a failed run
pub const ERROR_SUMMARY_FILE: &str = "agent-errors.txt";

#[derive(Serialize)]
struct RunSnapshot<'a> {
    status: RunStatus,
    iterations: u32,
    max_iterations: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    usage: Usage,
    entry_count: usize,
    entries: &'a [LogEntry],
}

/// Audit log owned by the caller of a run.
///
/// Every `record` is written, flushed and synced before it returns, so a crash
/// leaves a truthful partial `agent-log.jsonl`.
pub struct AuditLog {
    dir: PathBuf,
    file: File,
    entries: Vec<LogEntry>,
    started_at: DateTime<Utc>,
}

impl AuditLog {
    /// Create the artifact directory and open the JSONL record for append.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| AgentError::Audit(format!("create {}: {}", dir.display(), e)))?;

        let path = dir.join(JSONL_FILE);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AgentError::Audit(format!("open {}: {}", path.display(), e)))?;

        Ok(Self {
            dir,
            file,
            entries: Vec::new(),
            started_at: Utc::now(),
        })
    }

    pub fn record(&mut self, kind: LogKind, content: impl Into<String>, metadata: Option<Value>) -> Result<()> {
        let entry = LogEntry::new(kind, content, metadata);
        let line = serde_json::to_string(&entry)?;

        writeln!(self.file, "{}", line)
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_data())
            .map_err(|e| AgentError::Audit(format!("append to {}: {}", self.jsonl_path().display(), e)))?;

        log::debug!("[{}] {}", entry.kind, entry.content);
        self.entries.push(entry);
        Ok(())
    }

    pub fn system(&mut self, content: impl Into<String>, metadata: impl Into<Option<Value>>) -> Result<()> {
        self.record(LogKind::System, content, metadata.into())
    }

    pub fn tool(&mut self, content: impl Into<String>, metadata: impl Into<Option<Value>>) -> Result<()> {
        self.record(LogKind::Tool, content, metadata.into())
    }

    pub fn message(&mut self, content: impl Into<String>, metadata: impl Into<Option<Value>>) -> Result<()> {
        self.record(LogKind::Message, content, metadata.into())
    }

    pub fn error(&mut self, content: impl Into<String>, metadata: impl Into<Option<Value>>) -> Result<()> {
        self.record(LogKind::Error, content, metadata.into())
    }

    /// Write the snapshot, plus the error summary when the run failed.
    pub fn finalize(&self, report: &RunReport) -> Result<()> {
        let snapshot = RunSnapshot {
            status: report.status,
            iterations: report.iterations,
            max_iterations: report.max_iterations,
            error: report.error.as_deref(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            usage: report.usage,
            entry_count: self.entries.len(),
            entries: &self.entries,
        };

        let mut buf = serde_json::to_string_pretty(&snapshot)?;
        buf.push('\n');
        write_artifact(&self.snapshot_path(), &buf)?;

        let summary_path = self.error_summary_path();
        if report.status == RunStatus::Failed {
            let summary: Vec<String> = self.errors().map(LogEntry::render).collect();
            write_artifact(&summary_path, &(summary.join("\n") + "\n"))?;
        } else if summary_path.exists() {
            fs::remove_file(&summary_path)
                .map_err(|e| AgentError::Audit(format!("remove {}: {}", summary_path.display(), e)))?;
        }

        log::info!("Audit log finalized in {}", self.dir.display());
        Ok(())
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn errors(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|e| e.is_error())
    }

    pub fn append_count(&self) -> usize {
        self.entries.len()
    }

    pub fn jsonl_path(&self) -> PathBuf {
        self.dir.join(JSONL_FILE)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    pub fn error_summary_path(&self) -> PathBuf {
        self.dir.join(ERROR_SUMMARY_FILE)
    }
}

fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| AgentError::Audit(format!("write {}: {}", path.display(), e)))
}

/// Load every entry from a JSONL record, skipping blank lines.
pub fn read_jsonl(path: impl AsRef<Path>) -> Result<Vec<LogEntry>> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            entries.push(serde_json::from_str(&line)?);
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn report(status: RunStatus, error: Option<&str>) -> RunReport {
        RunReport {
            status,
            iterations: 2,
            max_iterations: 5,
            error: error.map(str::to_string),
            usage: Usage::new(10, 20),
        }
    }

    #[test]
    fn test_create_makes_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("logs");

        let log = AuditLog::create(&dir).unwrap();

        assert!(dir.is_dir());
        assert!(log.jsonl_path().exists());
        assert_eq!(log.append_count(), 0);
    }

    #[test]
    fn test_record_persists_before_returning() {
        let temp = TempDir::new().unwrap();
        let mut log = AuditLog::create(temp.path()).unwrap();

        log.system("run started", json!({"max_iterations": 5})).unwrap();
        log.tool("write_file started", None).unwrap();

        let on_disk = read_jsonl(log.jsonl_path()).unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(on_disk[0].kind, LogKind::System);
        assert_eq!(on_disk[0].metadata, Some(json!({"max_iterations": 5})));
        assert_eq!(on_disk[1].content, "write_file started");
        assert_eq!(on_disk, log.entries());
    }

    #[test]
    fn test_finalize_success_writes_snapshot_only() {
        let temp = TempDir::new().unwrap();
        let mut log = AuditLog::create(temp.path()).unwrap();
        log.system("run started", None).unwrap();
        log.message("done", None).unwrap();

        log.finalize(&report(RunStatus::Completed, None)).unwrap();

        let snapshot: Value = serde_json::from_str(&fs::read_to_string(log.snapshot_path()).unwrap()).unwrap();
        assert_eq!(snapshot["status"], "completed");
        assert_eq!(snapshot["iterations"], 2);
        assert_eq!(snapshot["entry_count"], 2);
        assert_eq!(snapshot["entries"].as_array().unwrap().len(), 2);
        assert!(snapshot.get("error").is_none());
        assert!(!log.error_summary_path().exists());
    }

    #[test]
    fn test_finalize_failure_writes_error_only_summary() {
        let temp = TempDir::new().unwrap();
        let mut log = AuditLog::create(temp.path()).unwrap();
        log.system("run started", None).unwrap();
        log.error("run_command failed", json!({"exit_code": 1})).unwrap();
        log.message("trying again", None).unwrap();
        log.error("LLM error: 500", None).unwrap();

        log.finalize(&report(RunStatus::Failed, Some("LLM error: 500"))).unwrap();

        let summary = fs::read_to_string(log.error_summary_path()).unwrap();
        assert!(summary.contains("run_command failed"));
        assert!(summary.contains("LLM error: 500"));
        assert!(!summary.contains("run started"));
        assert!(!summary.contains("trying again"));

        let snapshot: Value = serde_json::from_str(&fs::read_to_string(log.snapshot_path()).unwrap()).unwrap();
        assert_eq!(snapshot["status"], "failed");
        assert_eq!(snapshot["error"], "LLM error: 500");
        assert_eq!(snapshot["entry_count"], log.append_count());
    }

    #[test]
    fn test_successful_rerun_removes_stale_summary() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(ERROR_SUMMARY_FILE), "old failure\n").unwrap();

        let log = AuditLog::create(temp.path()).unwrap();
        log.finalize(&report(RunStatus::IterationLimit, None)).unwrap();

        assert!(!log.error_summary_path().exists());
    }

    #[test]
    fn test_errors_filters_by_kind() {
        let temp = TempDir::new().unwrap();
        let mut log = AuditLog::create(temp.path()).unwrap();
        log.tool("glob started", None).unwrap();
        log.error("glob failed", None).unwrap();

        let errors: Vec<_> = log.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].content, "glob failed");
    }
}
