//! cc-safety-net - pre-tool hook for coding agent CLIs.
//!
//! Statically analyzes shell commands before an agent runs them and blocks
//! destructive git and rm invocations, including ones hidden behind
//! wrappers (`sudo`, `env`, `sh -c`, `eval`, ...) and command substitutions.

pub mod analysis;
pub mod audit;
pub mod config;
pub mod decision;
pub mod input;
pub mod output;
pub mod rules;
pub mod shell;

pub use analysis::{AnalyzeOptions, Environment, analyze_bash, analyze_command};
pub use config::{Config, CustomRule, RuleOverrides};
pub use decision::{BlockInfo, Decision};
pub use input::{HookFormat, HookInput, ShellRequest};
pub use output::format_response;
