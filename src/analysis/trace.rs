//! Step-by-step record of an analysis, shown by `explain --json`.

use serde::Serialize;
use std::cell::RefCell;

/// One thing the analyzer did. Strings are raw command text; redact before
/// display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TraceStep {
    /// A command line split into simple commands.
    Parse { depth: usize, segments: Vec<String> },
    /// Strict mode refused input with an unterminated quote or substitution.
    StrictUnparseable,
    /// Raw text scanned for destructive patterns.
    DangerousText {
        depth: usize,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        rule: Option<String>,
    },
    /// Relative paths stop resolving against the known cwd.
    CwdChange { depth: usize, segment: String },
    /// A simple command and what its wrappers unwound to.
    Segment {
        depth: usize,
        index: usize,
        segment: String,
        /// `command`, `shell`, `empty`, `too-deep` or `text`.
        resolved: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        program: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        wrappers: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        rule: Option<String>,
    },
    /// Nesting cap reached.
    TooDeep { depth: usize },
}

/// Collects steps when tracing is on.
#[derive(Debug, Default)]
pub(super) struct Recorder {
    steps: Option<RefCell<Vec<TraceStep>>>,
}

impl Recorder {
    pub(super) fn off() -> Self {
        Self { steps: None }
    }

    pub(super) fn on() -> Self {
        Self {
            steps: Some(RefCell::default()),
        }
    }

    /// The step is only built when recording.
    pub(super) fn record(&self, step: impl FnOnce() -> TraceStep) {
        if let Some(steps) = &self.steps {
            steps.borrow_mut().push(step());
        }
    }

    pub(super) fn into_steps(self) -> Vec<TraceStep> {
        self.steps.map(RefCell::into_inner).unwrap_or_default()
    }
}
