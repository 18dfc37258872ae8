//! Built-in and custom rules for command analysis.

mod custom;
mod embedded;
mod find;
mod git;
mod interpreter;
mod parallel;
pub mod paths;
mod rm;
mod text;
mod xargs;

pub use custom::check_custom_rules;
pub use embedded::{analyze_embedded, is_display_command};
pub use find::analyze_find;
pub use git::{analyze_git, locate_subcommand};
pub use interpreter::{
    PARANOID_INTERPRETERS_SUFFIX, REASON_INTERPRETER_BLOCKED, analyze_interpreter,
};
pub use parallel::analyze_parallel;
pub use rm::{
    PARANOID_SUFFIX, REASON_RM_RF, REASON_RM_RF_ROOT_HOME, analyze_rm, is_recursive_force,
};
pub use text::dangerous_in_text;
pub use xargs::analyze_xargs;

use crate::decision::Decision;
use crate::shell::EffectiveCommand;
use std::fmt;

/// Analyzes a full nested command line (a `bash -c` body run by `parallel`).
pub type NestedAnalyzer<'a> = &'a dyn Fn(&str) -> Decision;

/// Read-only environment handed to every analyzer.
#[derive(Clone, Copy, Default)]
pub struct RuleContext<'a> {
    /// None when unknown, including after a `cd` earlier in the line.
    pub cwd: Option<&'a str>,
    pub home: Option<&'a str>,
    pub tmpdir: Option<&'a str>,
    /// Paranoid mode for rm (either paranoid variable).
    pub paranoid_rm: bool,
    /// Block `python -c`, `node -e` and friends outright.
    pub paranoid_interpreters: bool,
    pub nested: Option<NestedAnalyzer<'a>>,
}

impl fmt::Debug for RuleContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleContext")
            .field("cwd", &self.cwd)
            .field("home", &self.home)
            .field("tmpdir", &self.tmpdir)
            .field("paranoid_rm", &self.paranoid_rm)
            .field("paranoid_interpreters", &self.paranoid_interpreters)
            .field("nested", &self.nested.is_some())
            .finish()
    }
}

impl RuleContext<'_> {
    /// Run the nested analyzer, or allow when there is none.
    pub fn analyze_nested(&self, command: &str) -> Decision {
        match self.nested {
            Some(nested) => nested(command),
            None => Decision::allow(),
        }
    }
}

/// An analyzer for one program family.
pub type Analyzer = fn(&EffectiveCommand, &RuleContext<'_>) -> Decision;

pub const REASON_TOO_DEEP: &str =
    "Command exceeds maximum nesting depth and cannot be safely analyzed.";

/// Block for commands nested past the wrapper/shell depth cap.
pub fn too_deep() -> Decision {
    Decision::block("nesting.too_deep", REASON_TOO_DEEP)
}

pub const REASON_STRICT_UNPARSEABLE: &str =
    "Command could not be safely analyzed (strict mode). Verify manually.";

/// Block for input the tokenizer could not fully read (unterminated quote
/// or substitution) when strict mode is on.
pub fn unparseable() -> Decision {
    Decision::block("strict.unparseable", REASON_STRICT_UNPARSEABLE)
}

/// Program name -> analyzer. Add a line here to cover a new family.
const ANALYZERS: &[(&str, Analyzer)] = &[
    ("find", analyze_find),
    ("git", analyze_git),
    ("node", analyze_interpreter),
    ("parallel", analyze_parallel),
    ("perl", analyze_interpreter),
    ("python", analyze_interpreter),
    ("python2", analyze_interpreter),
    ("python3", analyze_interpreter),
    ("rm", analyze_rm),
    ("ruby", analyze_interpreter),
    ("xargs", analyze_xargs),
];

/// Find the analyzer for a (lowercased basename) program name.
pub fn lookup(name: &str) -> Option<Analyzer> {
    ANALYZERS
        .iter()
        .find(|(program, _)| *program == name)
        .map(|(_, analyzer)| *analyzer)
}

/// Run the registered analyzer for a command. Unregistered programs only
/// have their arguments scanned for an embedded rm, git or find.
pub fn dispatch(cmd: &EffectiveCommand, ctx: &RuleContext<'_>) -> Decision {
    let name = cmd.name();
    match lookup(&name) {
        Some(analyzer) => {
            log::debug!("dispatching {name} with {} args", cmd.args.len());
            analyzer(cmd, ctx)
        }
        None => analyze_embedded(cmd, ctx),
    }
}
