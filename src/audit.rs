//! Audit logging for blocked commands.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::STATE_DIR;
use crate::decision::BlockInfo;
use crate::output::redact_secrets;

const MAX_FIELD_LENGTH: usize = 300;
const MAX_SESSION_ID_LENGTH: usize = 128;

/// One line of a session's audit log.
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    pub ts: DateTime<Utc>,
    /// Full command, redacted and clipped.
    pub command: String,
    /// The simple command that blocked, redacted and clipped.
    pub segment: String,
    pub reason: String,
    pub rule: String,
    pub cwd: Option<String>,
}

fn clip(text: &str) -> String {
    redact_secrets(text).chars().take(MAX_FIELD_LENGTH).collect()
}

impl AuditEntry {
    /// Create a new audit entry for a blocked command.
    pub fn new(command: &str, info: &BlockInfo, cwd: Option<&str>) -> Self {
        let segment = info.segment.as_deref().unwrap_or(command);
        Self {
            ts: Utc::now(),
            command: clip(command),
            segment: clip(segment),
            reason: info.reason.clone(),
            rule: info.rule.clone(),
            cwd: cwd.map(String::from),
        }
    }
}

/// Make a session id safe to use as a file name. `None` if nothing usable
/// remains.
pub fn sanitize_session_id(session_id: &str) -> Option<String> {
    let raw = session_id.trim();
    let mut safe = String::with_capacity(raw.len());
    let mut in_unsafe_run = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            safe.push(c);
            in_unsafe_run = false;
        } else if !in_unsafe_run {
            // Runs of unsafe characters collapse to one underscore.
            safe.push('_');
            in_unsafe_run = true;
        }
    }

    let trimmed: String = safe
        .trim_matches(|c| matches!(c, '_' | '.' | '-'))
        .chars()
        .take(MAX_SESSION_ID_LENGTH)
        .collect();

    match trimmed.as_str() {
        "" | "." | ".." => None,
        _ => Some(trimmed),
    }
}

/// `<home>/.cc-safety-net/logs/<session>.jsonl`
pub fn log_path(home: &Path, session_id: &str) -> Option<PathBuf> {
    let safe = sanitize_session_id(session_id)?;
    Some(home.join(STATE_DIR).join("logs").join(format!("{safe}.jsonl")))
}

/// Audit logger for writing entries to a file.
pub struct AuditLogger {
    file: File,
}

impl AuditLogger {
    /// Open or create an audit log file, creating parent directories.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    /// Write an audit entry to the log.
    pub fn log(&mut self, entry: &AuditEntry) -> std::io::Result<()> {
        let json = serde_json::to_string(entry)?;
        writeln!(self.file, "{}", json)?;
        self.file.flush()
    }
}

/// Record a blocked command for a session. Failures are logged and dropped.
pub fn record_block(
    home: &Path,
    session_id: &str,
    command: &str,
    info: &BlockInfo,
    cwd: Option<&str>,
) {
    let Some(path) = log_path(home, session_id) else {
        log::debug!("unusable session id, skipping audit");
        return;
    };
    let entry = AuditEntry::new(command, info, cwd);
    if let Err(e) = AuditLogger::open(&path).and_then(|mut logger| logger.log(&entry)) {
        log::debug!("audit write to {} failed: {e}", path.display());
    }
}
