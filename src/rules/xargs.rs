//! xargs command analysis.

use super::rm::is_recursive_force;
use super::{RuleContext, dispatch, too_deep};
use crate::decision::Decision;
use crate::shell::{EffectiveCommand, Resolution, is_shell, resolve};

const REASON_XARGS_RM: &str =
    "xargs rm -rf with dynamic input is dangerous. Use explicit file list instead.";
const REASON_XARGS_SHELL: &str =
    "xargs with shell -c can execute arbitrary commands from dynamic input.";

/// xargs options whose value is the next word. Attached forms (`-n5`,
/// `--max-args=5`) are a single word.
const VALUE_OPTIONS: &[&str] = &[
    "-I", "-L", "-n", "-P", "-s", "-a", "-E", "-e", "-d", "-J", "--max-args", "--max-procs",
    "--max-chars", "--arg-file", "--eof", "--delimiter", "--max-lines",
];

/// The command xargs runs, after its own options.
pub fn child_command(args: &[String]) -> &[String] {
    let mut idx = 0;
    while let Some(word) = args.get(idx) {
        if word == "--" {
            return &args[idx + 1..];
        }
        if !word.starts_with('-') || word == "-" {
            return &args[idx..];
        }
        idx += if VALUE_OPTIONS.contains(&word.as_str()) { 2 } else { 1 };
    }
    &[]
}

/// Analyze xargs by looking at the command it feeds input to.
pub fn analyze_xargs(cmd: &EffectiveCommand, ctx: &RuleContext<'_>) -> Decision {
    let child = child_command(&cmd.args);
    if child.is_empty() {
        return Decision::allow();
    }

    let effective = match resolve(child) {
        Resolution::Command(effective) => effective,
        // Input lines become script text or arguments to it.
        Resolution::Shell { .. } => return Decision::block("xargs.shell", REASON_XARGS_SHELL),
        Resolution::TooDeep => return too_deep(),
        Resolution::Empty => return Decision::allow(),
    };

    let name = effective.name();
    if is_shell(&name) {
        return Decision::block("xargs.shell", REASON_XARGS_SHELL);
    }

    let decision = dispatch(&effective, ctx);
    if decision.is_blocked() {
        return decision;
    }
    // Input paths are unknown, so even temp-looking targets are refused.
    if name == "rm" && is_recursive_force(&effective.args) {
        return Decision::block("xargs.rm_rf", REASON_XARGS_RM);
    }
    Decision::allow()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::REASON_RM_RF;

    fn xargs(args: &str) -> EffectiveCommand {
        EffectiveCommand {
            program: "xargs".to_string(),
            args: args.split_whitespace().map(String::from).collect(),
            ..Default::default()
        }
    }

    fn ctx() -> RuleContext<'static> {
        RuleContext {
            cwd: Some("/home/user/project"),
            home: Some("/home/user"),
            tmpdir: Some("/tmp"),
            ..Default::default()
        }
    }

    fn check(args: &str) -> Decision {
        analyze_xargs(&xargs(args), &ctx())
    }

    #[test]
    fn test_child_command() {
        let args: Vec<String> = ["-0", "-n", "1", "-I{}", "rm", "{}"].map(String::from).to_vec();
        assert_eq!(child_command(&args), &args[4..]);
        let args: Vec<String> = ["-P", "4", "--", "-weird"].map(String::from).to_vec();
        assert_eq!(child_command(&args), &args[3..]);
        assert!(child_command(&["-r".to_string()]).is_empty());
    }

    #[test]
    fn test_xargs_rm_rf() {
        let decision = check("rm -rf");
        assert_eq!(decision.block_info().unwrap().rule, "rm.recursive_force");
        assert_eq!(decision.reason(), Some(REASON_RM_RF));

        // Temp targets are fine for rm itself but input is dynamic.
        let decision = check("-I {} rm -rf /tmp/{}");
        assert_eq!(decision.block_info().unwrap().rule, "xargs.rm_rf");
    }

    #[test]
    fn test_xargs_shell() {
        assert_eq!(check("bash -c").block_info().unwrap().rule, "xargs.shell");
        assert_eq!(check("-n1 sh -c 'echo $0'").block_info().unwrap().rule, "xargs.shell");
        assert_eq!(check("sh").block_info().unwrap().rule, "xargs.shell");
    }

    #[test]
    fn test_xargs_git_and_find() {
        assert_eq!(check("git branch -D").block_info().unwrap().rule, "git.branch.force_delete");
        assert_eq!(check("-0 find -delete").block_info().unwrap().rule, "find.delete");
    }

    #[test]
    fn test_xargs_safe() {
        assert!(!check("cat").is_blocked());
        assert!(!check("-I {} echo {}").is_blocked());
        assert!(!check("rm").is_blocked());
        assert!(!check("").is_blocked());
    }
}
