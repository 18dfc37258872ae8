//! find command analysis.

use super::RuleContext;
use super::rm::is_recursive_force;
use crate::decision::Decision;
use crate::shell::{EffectiveCommand, Resolution, resolve};

const REASON_FIND_DELETE: &str =
    "find -delete permanently removes files. Use -print first to preview.";
const REASON_FIND_EXEC_RM: &str = "find -exec rm -rf is dangerous. Use explicit file list instead.";

/// Primaries whose next word is a value, so `-name -delete` is a pattern.
const VALUE_PRIMARIES: &[&str] = &[
    "-name", "-iname", "-path", "-ipath", "-wholename", "-iwholename", "-regex", "-iregex",
    "-type", "-user", "-group", "-perm", "-size", "-mtime", "-ctime", "-atime", "-mmin",
    "-cmin", "-amin", "-newer", "-printf", "-fprint", "-fprintf", "-maxdepth", "-mindepth",
];

const EXEC_ACTIONS: &[&str] = &["-exec", "-execdir", "-ok", "-okdir"];

fn is_terminator(word: &str) -> bool {
    word == ";" || word == "+"
}

/// The `-exec ... ;` bodies of a find invocation. An unterminated body runs
/// to the end of the arguments.
fn exec_bodies(args: &[String]) -> Vec<&[String]> {
    let mut bodies = Vec::new();
    let mut idx = 0;
    while idx < args.len() {
        if EXEC_ACTIONS.contains(&args[idx].as_str()) {
            let start = idx + 1;
            let end = args[start..]
                .iter()
                .position(|w| is_terminator(w))
                .map_or(args.len(), |p| start + p);
            bodies.push(&args[start..end]);
            idx = end + 1;
        } else {
            idx += 1;
        }
    }
    bodies
}

/// `-delete` used as an action, not inside an exec body or as a value.
pub fn has_delete_action(args: &[String]) -> bool {
    let mut idx = 0;
    while let Some(word) = args.get(idx) {
        if EXEC_ACTIONS.contains(&word.as_str()) {
            idx += args[idx + 1..]
                .iter()
                .position(|w| is_terminator(w))
                .map_or(args.len(), |p| p + 2);
            continue;
        }
        if VALUE_PRIMARIES.contains(&word.as_str()) {
            idx += 2;
            continue;
        }
        if word == "-delete" {
            return true;
        }
        idx += 1;
    }
    false
}

/// Analyze find for `-delete` and `-exec rm -rf`. Path context is not
/// consulted.
pub fn analyze_find(cmd: &EffectiveCommand, _ctx: &RuleContext<'_>) -> Decision {
    if has_delete_action(&cmd.args) {
        return Decision::block("find.delete", REASON_FIND_DELETE);
    }

    for body in exec_bodies(&cmd.args) {
        if let Resolution::Command(child) = resolve(body)
            && child.name() == "rm"
            && is_recursive_force(&child.args)
        {
            return Decision::block("find.exec_rm", REASON_FIND_EXEC_RM);
        }
    }

    Decision::allow()
}
