//! Git command analysis.

use super::RuleContext;
use crate::decision::Decision;
use crate::shell::EffectiveCommand;
use crate::shell::options::{Item, OptSpec, UnknownLong, next_item, scan_args, short_flags};

const REASON_CHECKOUT_DOUBLE_DASH: &str =
    "git checkout -- discards uncommitted changes permanently. Use 'git stash' first.";
const REASON_CHECKOUT_REF_DASH_PATH: &str = "git checkout <ref> -- <path> overwrites working tree \
     with contents from the ref. Use 'git stash' first.";
const REASON_CHECKOUT_REF_PATH: &str = "git checkout <ref> <path> overwrites working tree \
     with contents from the ref. Use 'git stash' first or 'git switch' for branches.";
const REASON_CHECKOUT_PATHSPEC_FILE: &str = "git checkout --pathspec-from-file can overwrite \
     multiple files. Use 'git stash' first.";
const REASON_CHECKOUT_FORCE: &str =
    "git checkout --force discards uncommitted changes. Use 'git stash' first.";
const REASON_RESTORE: &str = "git restore discards uncommitted changes. Use 'git stash' first, \
     or use --staged to only unstage.";
const REASON_RESTORE_WORKTREE: &str =
    "git restore --worktree explicitly discards working tree changes. Use 'git stash' first.";
const REASON_RESET_HARD: &str =
    "git reset --hard destroys all uncommitted changes permanently. Use 'git stash' first.";
const REASON_RESET_MERGE: &str =
    "git reset --merge can lose uncommitted changes. Use 'git stash' first.";
const REASON_CLEAN: &str =
    "git clean -f removes untracked files permanently. Review with 'git clean -n' first.";
const REASON_CLEAN_DIRS: &str = "git clean with -f and -d/-x removes untracked directories \
     and ignored files permanently. Review with 'git clean -n' first.";
const REASON_PUSH_FORCE: &str =
    "Force push can destroy remote history. Use --force-with-lease if necessary.";
const REASON_BRANCH_DELETE: &str =
    "git branch -D force-deletes without merge check. Use -d for safe delete.";
const REASON_STASH_DROP: &str =
    "git stash drop permanently deletes stashed changes. List stashes first with 'git stash list'.";
const REASON_STASH_CLEAR: &str = "git stash clear permanently deletes ALL stashed changes.";
const REASON_WORKTREE_FORCE: &str =
    "git worktree remove --force can delete uncommitted changes. Remove --force flag.";

/// Options accepted between `git` and the subcommand.
const GLOBAL_OPTIONS: &[OptSpec] = &[
    OptSpec::flag(&[
        "-p",
        "--paginate",
        "-P",
        "--no-pager",
        "--bare",
        "--no-replace-objects",
        "--no-lazy-fetch",
        "--no-optional-locks",
        "--no-advice",
        "--literal-pathspecs",
        "--glob-pathspecs",
        "--noglob-pathspecs",
        "--icase-pathspecs",
        "-h",
        "--help",
        "-v",
        "--version",
        "--html-path",
        "--man-path",
        "--info-path",
    ]),
    OptSpec::value(&[
        "-C",
        "-c",
        "--git-dir",
        "--work-tree",
        "--exec-path",
        "--namespace",
        "--super-prefix",
        "--config-env",
        "--attr-source",
    ]),
];

const CHECKOUT_OPTIONS: &[OptSpec] = &[
    OptSpec::flag(&[
        "-q",
        "--quiet",
        "-f",
        "--force",
        "-m",
        "--merge",
        "-d",
        "--detach",
        "-l",
        "-p",
        "--patch",
        "--ours",
        "--theirs",
        "--progress",
        "--no-progress",
        "--guess",
        "--no-guess",
        "--no-track",
        "--overlay",
        "--no-overlay",
        "--overwrite-ignore",
        "--no-overwrite-ignore",
        "--ignore-other-worktrees",
        "--ignore-skip-worktree-bits",
        "--no-recurse-submodules",
        "--pathspec-file-nul",
    ]),
    OptSpec::value(&[
        "-b",
        "-B",
        "--orphan",
        "--conflict",
        "-U",
        "--unified",
        "--pathspec-from-file",
    ]),
    OptSpec::choice(&["--recurse-submodules"], &["checkout", "on-demand"]),
    OptSpec::choice(&["-t", "--track"], &["direct", "inherit"]),
];

const RESTORE_OPTIONS: &[OptSpec] = &[
    OptSpec::flag(&[
        "-W",
        "--worktree",
        "-S",
        "--staged",
        "-q",
        "--quiet",
        "-p",
        "--patch",
        "-m",
        "--merge",
        "--ours",
        "--theirs",
        "--progress",
        "--no-progress",
        "--overlay",
        "--no-overlay",
        "--ignore-unmerged",
        "--ignore-skip-worktree-bits",
        "--recurse-submodules",
        "--no-recurse-submodules",
        "--pathspec-file-nul",
        "-h",
        "--help",
    ]),
    OptSpec::value(&["-s", "--source", "--pathspec-from-file"]),
    OptSpec::attached(&["--conflict"]),
];

const CLEAN_OPTIONS: &[OptSpec] = &[
    OptSpec::flag(&[
        "-f",
        "--force",
        "-d",
        "-x",
        "-X",
        "-n",
        "--dry-run",
        "-q",
        "--quiet",
        "-i",
        "--interactive",
    ]),
    OptSpec::value(&["-e", "--exclude"]),
];

const PUSH_OPTIONS: &[OptSpec] = &[
    OptSpec::flag(&[
        "-f",
        "--force",
        "--force-if-includes",
        "--no-force-if-includes",
        "--no-force-with-lease",
        "-u",
        "--set-upstream",
        "-v",
        "--verbose",
        "-q",
        "--quiet",
        "-n",
        "--dry-run",
        "-d",
        "--delete",
        "--all",
        "--branches",
        "--mirror",
        "--tags",
        "--follow-tags",
        "--no-follow-tags",
        "--atomic",
        "--no-atomic",
        "--porcelain",
        "--prune",
        "--no-verify",
        "--verify",
        "--thin",
        "--no-thin",
        "--progress",
        "--no-progress",
        "--no-signed",
        "-4",
        "--ipv4",
        "-6",
        "--ipv6",
    ]),
    OptSpec::value(&[
        "-o",
        "--push-option",
        "--repo",
        "--receive-pack",
        "--exec",
    ]),
    OptSpec::attached(&["--force-with-lease", "--signed", "--recurse-submodules"]),
];

const BRANCH_OPTIONS: &[OptSpec] = &[
    OptSpec::value(&[
        "-u",
        "--set-upstream-to",
        "--contains",
        "--no-contains",
        "--merged",
        "--no-merged",
        "--points-at",
        "--sort",
        "--format",
    ]),
    OptSpec::attached(&["--color", "--column", "--abbrev"]),
];

type SubcommandAnalyzer = fn(&[String]) -> Decision;

/// Registered git subcommands. Anything else is allowed.
const SUBCOMMANDS: &[(&str, SubcommandAnalyzer)] = &[
    ("checkout", analyze_checkout),
    ("restore", analyze_restore),
    ("reset", analyze_reset),
    ("clean", analyze_clean),
    ("push", analyze_push),
    ("branch", analyze_branch),
    ("stash", analyze_stash),
    ("worktree", analyze_worktree),
];

/// Skip git's global options and return the subcommand and its arguments.
///
/// Unknown global options never consume the next word.
pub fn locate_subcommand(args: &[String]) -> Option<(&str, &[String])> {
    let mut idx = 0;
    while idx < args.len() {
        match next_item(args, idx, GLOBAL_OPTIONS, UnknownLong::Alone) {
            Item::DoubleDash => {
                let sub = args.get(idx + 1)?;
                return Some((sub.as_str(), &args[idx + 2..]));
            }
            Item::Positional => return Some((args[idx].as_str(), &args[idx + 1..])),
            Item::Options(_, consumed) => idx += consumed,
        }
    }
    None
}

/// Analyze a git command for destructive operations.
///
/// Git rules depend only on the arguments; the context is unused but kept so
/// this fits the shared [`Analyzer`](super::Analyzer) signature.
pub fn analyze_git(cmd: &EffectiveCommand, _ctx: &RuleContext<'_>) -> Decision {
    let Some((subcommand, args)) = locate_subcommand(&cmd.args) else {
        return Decision::allow();
    };
    log::trace!("git subcommand {subcommand:?} with {} args", args.len());

    SUBCOMMANDS
        .iter()
        .find(|(name, _)| *name == subcommand)
        .map(|(_, analyze)| analyze(args))
        .unwrap_or(Decision::Allow)
}

fn analyze_checkout(args: &[String]) -> Decision {
    let parsed = scan_args(args, CHECKOUT_OPTIONS, UnknownLong::MaybeValue);

    if parsed.has(&["-b", "-B", "--orphan"]) {
        return Decision::allow();
    }
    if parsed.has(&["--pathspec-from-file"]) {
        return Decision::block("git.checkout.pathspec_from_file", REASON_CHECKOUT_PATHSPEC_FILE);
    }
    if parsed.has(&["-f", "--force"]) {
        return Decision::block("git.checkout.force", REASON_CHECKOUT_FORCE);
    }
    if let Some(paths) = &parsed.after_double_dash
        && !paths.is_empty()
    {
        return if parsed.positionals.is_empty() {
            Decision::block("git.checkout.double_dash", REASON_CHECKOUT_DOUBLE_DASH)
        } else {
            Decision::block("git.checkout.ref_path", REASON_CHECKOUT_REF_DASH_PATH)
        };
    }
    if parsed.positionals.len() >= 2 {
        return Decision::block("git.checkout.ref_path", REASON_CHECKOUT_REF_PATH);
    }
    Decision::allow()
}

fn analyze_restore(args: &[String]) -> Decision {
    let parsed = scan_args(args, RESTORE_OPTIONS, UnknownLong::MaybeValue);

    if parsed.has(&["-h", "--help", "--version"]) {
        return Decision::allow();
    }
    if parsed.has(&["-W", "--worktree"]) {
        return Decision::block("git.restore.worktree", REASON_RESTORE_WORKTREE);
    }
    if parsed.has(&["-S", "--staged"]) {
        return Decision::allow();
    }
    let has_paths = !parsed.positionals.is_empty()
        || parsed.after_double_dash.as_ref().is_some_and(|p| !p.is_empty())
        || parsed.has(&["--pathspec-from-file"]);
    if has_paths {
        return Decision::block("git.restore", REASON_RESTORE);
    }
    Decision::allow()
}

fn analyze_reset(args: &[String]) -> Decision {
    if args.iter().any(|a| a == "--hard") {
        return Decision::block("git.reset.hard", REASON_RESET_HARD);
    }
    if args.iter().any(|a| a == "--merge") {
        return Decision::block("git.reset.merge", REASON_RESET_MERGE);
    }
    Decision::allow()
}

fn analyze_clean(args: &[String]) -> Decision {
    let parsed = scan_args(args, CLEAN_OPTIONS, UnknownLong::Alone);

    if !parsed.has(&["-f", "--force"]) {
        return Decision::allow();
    }
    if parsed.has(&["-d", "-x", "-X"]) {
        return Decision::block("git.clean.force", REASON_CLEAN_DIRS);
    }
    Decision::block("git.clean.force", REASON_CLEAN)
}

fn analyze_push(args: &[String]) -> Decision {
    let parsed = scan_args(args, PUSH_OPTIONS, UnknownLong::MaybeValue);

    // Plain force wins even when a lease is also given.
    if parsed.has(&["-f", "--force"]) {
        return Decision::block("git.push.force", REASON_PUSH_FORCE);
    }
    let leased = parsed.has(&["--force-with-lease"]);
    let forced_refspec = parsed
        .positionals
        .iter()
        .any(|p| p.len() > 1 && p.starts_with('+'));
    if forced_refspec && !leased {
        return Decision::block("git.push.force", REASON_PUSH_FORCE);
    }
    Decision::allow()
}

fn analyze_branch(args: &[String]) -> Decision {
    let parsed = scan_args(args, BRANCH_OPTIONS, UnknownLong::Alone);

    let force_delete = parsed.has(&["-D"])
        || (parsed.has(&["-d", "--delete"]) && parsed.has(&["-f", "--force"]));
    if force_delete {
        return Decision::block("git.branch.force_delete", REASON_BRANCH_DELETE);
    }
    Decision::allow()
}

fn analyze_stash(args: &[String]) -> Decision {
    match args.iter().find(|a| !a.starts_with('-')).map(String::as_str) {
        Some("drop") => Decision::block("git.stash.drop", REASON_STASH_DROP),
        Some("clear") => Decision::block("git.stash.clear", REASON_STASH_CLEAR),
        _ => Decision::allow(),
    }
}

fn analyze_worktree(args: &[String]) -> Decision {
    let Some(pos) = args.iter().position(|a| !a.starts_with('-')) else {
        return Decision::allow();
    };
    if args[pos] != "remove" {
        return Decision::allow();
    }
    let rest = &args[pos + 1..];
    let forced = rest
        .iter()
        .take_while(|a| *a != "--")
        .any(|a| a == "--force")
        || short_flags(rest).contains(&'f');
    if forced {
        return Decision::block("git.worktree.remove_force", REASON_WORKTREE_FORCE);
    }
    Decision::allow()
}
