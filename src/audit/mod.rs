//! Audit logging: the durable record of a run
//!
//! Separate from operator logging (`log`/`env_logger`): these artifacts are
//! always written and are unaffected by `RUST_LOG`.

mod entry;
mod logger;

pub use entry::{LogEntry, LogKind};
pub use logger::{AuditLog, ERROR_SUMMARY_FILE, JSONL_FILE, SNAPSHOT_FILE, read_jsonl};
