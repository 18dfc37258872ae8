//! rm command analysis.

use super::RuleContext;
use super::paths::{PathClass, PathEnv, classify, normalize, tmpdir_trusted};
use crate::decision::Decision;
use crate::shell::EffectiveCommand;

pub const REASON_RM_RF: &str =
    "rm -rf is destructive. List files first, then delete individually.";
pub const REASON_RM_RF_ROOT_HOME: &str = "rm -rf on root or home paths is extremely dangerous.";
pub const PARANOID_SUFFIX: &str =
    " [paranoid mode - disable with: unset SAFETY_NET_PARANOID SAFETY_NET_PARANOID_RM]";

/// Options (everything dash-prefixed before `--`) and targets.
fn split_args(args: &[String]) -> (Vec<&str>, Vec<&str>) {
    let mut options = Vec::new();
    let mut targets = Vec::new();
    let mut after_dash = false;
    for arg in args {
        if after_dash {
            targets.push(arg.as_str());
        } else if arg == "--" {
            after_dash = true;
        } else if arg.len() > 1 && arg.starts_with('-') {
            options.push(arg.as_str());
        } else {
            targets.push(arg.as_str());
        }
    }
    (options, targets)
}

fn has_short(options: &[&str], letters: &[char]) -> bool {
    options
        .iter()
        .filter(|o| !o.starts_with("--"))
        .any(|o| o.chars().skip(1).any(|c| letters.contains(&c)))
}

fn recursive_force(options: &[&str]) -> bool {
    let recursive = options.contains(&"--recursive") || has_short(options, &['r', 'R']);
    let force = options.contains(&"--force") || has_short(options, &['f']);
    recursive && force
}

/// Whether rm arguments ask for a recursive forced delete.
pub fn is_recursive_force(args: &[String]) -> bool {
    recursive_force(&split_args(args).0)
}

/// Analyze rm for recursive force deletes outside safe locations.
pub fn analyze_rm(cmd: &EffectiveCommand, ctx: &RuleContext<'_>) -> Decision {
    let (options, targets) = split_args(&cmd.args);
    if !recursive_force(&options) {
        return Decision::allow();
    }

    let env = PathEnv {
        cwd: ctx.cwd,
        home: ctx.home,
        tmpdir: ctx.tmpdir,
        allow_tmpdir_var: tmpdir_trusted(cmd.assignment("TMPDIR"), ctx.tmpdir),
    };

    let classes: Vec<PathClass> = targets.iter().map(|t| classify(t, &env)).collect();
    log::trace!("rm -rf targets {targets:?} classified as {classes:?}");

    if classes.contains(&PathClass::RootOrHome) {
        return Decision::block("rm.root_or_home", REASON_RM_RF_ROOT_HOME);
    }

    if !classes.is_empty() && classes.iter().all(|c| *c == PathClass::Temp) {
        log::debug!("rm -rf allowed: temp targets {targets:?}");
        return Decision::allow();
    }

    if ctx.paranoid_rm {
        return Decision::block("rm.paranoid", format!("{REASON_RM_RF}{PARANOID_SUFFIX}"));
    }

    if let Some(cwd) = env.cwd
        && !classes.is_empty()
    {
        if env.home.is_some_and(|home| normalize(home) == normalize(cwd)) {
            return Decision::block("rm.root_or_home", REASON_RM_RF_ROOT_HOME);
        }
        if classes.iter().all(|c| *c == PathClass::WithinCwd) {
            log::debug!("rm -rf allowed: targets inside {cwd}");
            return Decision::allow();
        }
    }

    Decision::block("rm.recursive_force", REASON_RM_RF)
}
