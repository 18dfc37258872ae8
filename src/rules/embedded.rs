//! rm, git and find passed as arguments to a program with no analyzer
//! (`ssh host rm -rf /`, `ionice -c3 git reset --hard`).

use super::{RuleContext, lookup};
use crate::decision::Decision;
use crate::shell::{EffectiveCommand, program_name};

/// Programs that only print or inspect their arguments.
const DISPLAY_COMMANDS: &[&str] = &[
    "echo", "printf", "cat", "head", "tail", "less", "more", "grep", "rg", "ag", "ack", "sed",
    "awk", "cut", "tr", "sort", "uniq", "wc", "tee", "man", "help", "info", "type", "which",
    "whereis", "whatis", "apropos", "file", "stat", "ls", "ll", "dir", "tree", "pwd", "date",
    "cal", "uptime", "whoami", "id", "groups", "hostname", "uname", "env", "printenv", "set",
    "export", "alias", "history", "jobs", "fg", "bg", "test", "true", "false", "read", "return",
    "exit", "break", "continue", "shift", "wait", "trap", "basename", "dirname", "realpath",
    "readlink", "md5sum", "sha256sum", "base64", "xxd", "od", "hexdump", "strings", "diff",
    "cmp", "comm", "join", "paste", "column", "fmt", "fold", "nl", "pr", "expand", "unexpand",
    "rev", "tac", "shuf", "seq", "yes", "sleep", "logger", "write", "wall", "mesg",
    "notify-send", "command",
];

/// Programs looked for among the arguments.
const EMBEDDED: &[&str] = &["rm", "git", "find"];

pub fn is_display_command(name: &str) -> bool {
    DISPLAY_COMMANDS.contains(&name)
}

/// Analyze each rm/git/find found among the arguments as if it started the
/// command. Display programs are skipped.
pub fn analyze_embedded(cmd: &EffectiveCommand, ctx: &RuleContext<'_>) -> Decision {
    let head = cmd.name();
    if is_display_command(&head) {
        return Decision::allow();
    }

    for (idx, arg) in cmd.args.iter().enumerate() {
        let name = program_name(arg);
        if !EMBEDDED.contains(&name.as_str()) {
            continue;
        }
        let Some(analyzer) = lookup(&name) else {
            continue;
        };
        let mut wrappers = cmd.wrappers.clone();
        wrappers.push(head.clone());
        let inner = EffectiveCommand {
            program: arg.clone(),
            args: cmd.args[idx + 1..].to_vec(),
            assignments: cmd.assignments.clone(),
            wrappers,
        };
        let decision = analyzer(&inner, ctx);
        if decision.is_blocked() {
            log::debug!("{name} found in arguments of {head}");
            return decision;
        }
    }
    Decision::allow()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(line: &str) -> Decision {
        let tokens = crate::shell::tokenize(line);
        let words: Vec<String> = crate::shell::words(&tokens)
            .into_iter()
            .map(String::from)
            .collect();
        let ctx = RuleContext {
            cwd: Some("/home/u/project"),
            home: Some("/home/u"),
            tmpdir: Some("/tmp"),
            ..Default::default()
        };
        let cmd = EffectiveCommand {
            program: words[0].clone(),
            args: words[1..].to_vec(),
            ..Default::default()
        };
        analyze_embedded(&cmd, &ctx)
    }

    #[test]
    fn test_embedded_rm_and_git() {
        assert_eq!(
            check("ssh prod rm -rf /").block_info().unwrap().rule,
            "rm.root_or_home"
        );
        assert_eq!(
            check("ionice -c3 /usr/bin/git clean -fd").block_info().unwrap().rule,
            "git.clean.force"
        );
        assert_eq!(
            check("chroot /srv find . -delete").block_info().unwrap().rule,
            "find.delete"
        );
    }

    #[test]
    fn test_embedded_rm_keeps_cwd_allowance() {
        assert!(!check("ssh prod rm -rf build").is_blocked());
        assert!(!check("taskset 1 rm -rf /tmp/x").is_blocked());
    }

    #[test]
    fn test_display_commands_skipped() {
        for line in [
            "echo rm -rf /",
            "grep -r 'git reset --hard' .",
            "printf git push --force",
            "man git",
        ] {
            assert!(!check(line).is_blocked(), "{line}");
        }
    }

    #[test]
    fn test_harmless_mentions() {
        assert!(!check("mkdir -p git rm find").is_blocked());
        assert!(!check("make git").is_blocked());
    }
}
