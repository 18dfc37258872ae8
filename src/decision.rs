//! Verdict types for analyzed commands.

use serde::Serialize;

/// The result of analyzing a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Let the command run.
    Allow,
    /// Refuse the command.
    Block(BlockInfo),
}

/// Information about why a command was blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockInfo {
    /// Human-readable reason. Starts with a stable identifier such as
    /// `git reset --hard`.
    pub reason: String,
    /// Dotted id of the rule that fired (e.g. `git.reset.hard`).
    pub rule: String,
    /// The simple command that triggered the block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
}

impl BlockInfo {
    pub fn new(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            reason: reason.into(),
            segment: None,
        }
    }

    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }
}

impl Decision {
    /// Create an allow decision.
    pub fn allow() -> Self {
        Decision::Allow
    }

    /// Create a block decision.
    pub fn block(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Decision::Block(BlockInfo::new(rule, reason))
    }

    /// Check if this is a block decision.
    pub fn is_blocked(&self) -> bool {
        matches!(self, Decision::Block(_))
    }

    /// Get the block info if blocked.
    pub fn block_info(&self) -> Option<&BlockInfo> {
        match self {
            Decision::Block(info) => Some(info),
            Decision::Allow => None,
        }
    }

    /// The block reason, if blocked.
    pub fn reason(&self) -> Option<&str> {
        self.block_info().map(|info| info.reason.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow() {
        let d = Decision::allow();
        assert!(!d.is_blocked());
        assert!(d.block_info().is_none());
        assert!(d.reason().is_none());
    }

    #[test]
    fn test_block() {
        let d = Decision::block("git.reset.hard", "git reset --hard destroys changes");
        assert!(d.is_blocked());
        let info = d.block_info().unwrap();
        assert_eq!(info.rule, "git.reset.hard");
        assert_eq!(d.reason(), Some("git reset --hard destroys changes"));
    }

    #[test]
    fn test_block_with_segment() {
        let d = Decision::Block(BlockInfo::new("rule", "reason").with_segment("rm -rf /"));
        assert_eq!(d.block_info().unwrap().segment.as_deref(), Some("rm -rf /"));
    }

    #[test]
    fn test_serialize_skips_missing_segment() {
        let json = serde_json::to_string(&BlockInfo::new("r", "why")).unwrap();
        assert_eq!(json, r#"{"reason":"why","rule":"r"}"#);
    }
}
