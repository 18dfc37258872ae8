//! Inline interpreter code (`python -c`, `node -e`, ...).

use super::{RuleContext, analyze_embedded};
use crate::decision::Decision;
use crate::shell::EffectiveCommand;

pub const REASON_INTERPRETER_BLOCKED: &str =
    "Interpreter one-liners are blocked in paranoid mode.";
pub const PARANOID_INTERPRETERS_SUFFIX: &str =
    " [paranoid mode - disable with: unset SAFETY_NET_PARANOID SAFETY_NET_PARANOID_INTERPRETERS]";

/// The inline program passed with `-c` or `-e`.
fn code_arg(args: &[String]) -> Option<&str> {
    args.iter()
        .position(|a| a == "-c" || a == "-e")
        .and_then(|idx| args.get(idx + 1))
        .map(String::as_str)
}

/// Inline code is opaque. In paranoid mode any one-liner is blocked;
/// otherwise the arguments get the same embedded-command scan as any
/// unregistered program.
pub fn analyze_interpreter(cmd: &EffectiveCommand, ctx: &RuleContext<'_>) -> Decision {
    if ctx.paranoid_interpreters && code_arg(&cmd.args).is_some() {
        log::debug!("{} one-liner blocked", cmd.name());
        return Decision::block(
            "interpreter.paranoid",
            format!("{REASON_INTERPRETER_BLOCKED}{PARANOID_INTERPRETERS_SUFFIX}"),
        );
    }
    analyze_embedded(cmd, ctx)
}
