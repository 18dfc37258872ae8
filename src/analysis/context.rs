//! Inputs to command analysis that come from outside the command string.

use crate::config::RuleOverrides;
use crate::rules::RuleContext;

pub const PARANOID_ENV: &str = "SAFETY_NET_PARANOID";
pub const PARANOID_RM_ENV: &str = "SAFETY_NET_PARANOID_RM";
pub const PARANOID_INTERPRETERS_ENV: &str = "SAFETY_NET_PARANOID_INTERPRETERS";
pub const STRICT_ENV: &str = "SAFETY_NET_STRICT";

/// Snapshot of the process environment relevant to analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub home: Option<String>,
    pub tmpdir: Option<String>,
    /// Enables both paranoid modes.
    pub paranoid: bool,
    pub paranoid_rm: bool,
    pub paranoid_interpreters: bool,
    /// Block input that cannot be fully parsed, and hook payloads that are
    /// not valid JSON.
    pub strict: bool,
}

/// `1` or `true`, any case.
pub fn env_truthy(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        let v = v.trim();
        v == "1" || v.eq_ignore_ascii_case("true")
    })
}

impl Environment {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let home = var("HOME").or_else(|| {
            dirs::home_dir().map(|h| h.to_string_lossy().into_owned())
        });
        Self {
            home,
            tmpdir: var("TMPDIR"),
            paranoid: env_truthy(var(PARANOID_ENV).as_deref()),
            paranoid_rm: env_truthy(var(PARANOID_RM_ENV).as_deref()),
            paranoid_interpreters: env_truthy(var(PARANOID_INTERPRETERS_ENV).as_deref()),
            strict: env_truthy(var(STRICT_ENV).as_deref()),
        }
    }
}

/// Everything `analyze_command` needs besides the command itself.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub cwd: Option<String>,
    pub env: Environment,
    pub overrides: RuleOverrides,
}

impl AnalyzeOptions {
    pub fn new(cwd: Option<String>, env: Environment, overrides: RuleOverrides) -> Self {
        Self { cwd, env, overrides }
    }

    pub fn rule_context(&self) -> RuleContext<'_> {
        RuleContext {
            cwd: self.cwd.as_deref(),
            home: self.env.home.as_deref(),
            tmpdir: self.env.tmpdir.as_deref(),
            paranoid_rm: self.env.paranoid || self.env.paranoid_rm,
            paranoid_interpreters: self.env.paranoid || self.env.paranoid_interpreters,
            nested: None,
        }
    }
}
