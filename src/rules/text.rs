//! Pattern checks on raw command text that could not be split into words
//! (a quoted `'git reset --hard'` used as the program, unterminated quotes).

use crate::decision::Decision;
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Clone, Copy)]
enum Filter {
    None,
    /// The captured push arguments hold `-f`/`--force`, not only
    /// `--force-with-lease`.
    ForceNotLease,
    /// Nothing after the match on the same line mentions `--staged`/`--help`.
    NoStagedOrHelp,
    /// Skipped when the text starts with `echo` or `rg`.
    NotEchoOrRg,
}

struct TextCheck {
    rule: &'static str,
    label: &'static str,
    pattern: &'static str,
    case_sensitive: bool,
    filter: Filter,
}

const fn check(rule: &'static str, label: &'static str, pattern: &'static str) -> TextCheck {
    TextCheck {
        rule,
        label,
        pattern,
        case_sensitive: false,
        filter: Filter::None,
    }
}

/// First hit wins.
const CHECKS: &[TextCheck] = &[
    check(
        "text.rm_rf",
        "rm -rf",
        r"\brm\s+(-\S*r\S*\s+-\S*f|-\S*f\S*\s+-\S*r|-\S*rf|-\S*fr)\b",
    ),
    check("text.git_reset_hard", "git reset --hard", r"\bgit\s+reset\s+--hard\b"),
    check("text.git_reset_merge", "git reset --merge", r"\bgit\s+reset\s+--merge\b"),
    check("text.git_clean_force", "git clean -f", r"\bgit\s+clean\s+(-\S*f|-f)\b"),
    TextCheck {
        filter: Filter::ForceNotLease,
        ..check(
            "text.git_push_force",
            "git push --force (use --force-with-lease instead)",
            r"\bgit\s+push\s+([^|;]*)",
        )
    },
    TextCheck {
        case_sensitive: true,
        ..check("text.git_branch_force_delete", "git branch -D", r"\bgit\s+branch\s+-D\b")
    },
    check(
        "text.git_stash_drop",
        "git stash drop/clear",
        r"\bgit\s+stash\s+(drop|clear)\b",
    ),
    check("text.git_checkout_double_dash", "git checkout --", r"\bgit\s+checkout\s+--\s"),
    TextCheck {
        filter: Filter::NoStagedOrHelp,
        ..check("text.git_restore", "git restore (without --staged)", r"\bgit\s+restore\b")
    },
    TextCheck {
        filter: Filter::NotEchoOrRg,
        ..check("text.find_delete", "find -delete", r"\bfind\b[^\n;|&]*\s-delete\b")
    },
];

static COMPILED: Lazy<Vec<(&'static TextCheck, Regex)>> = Lazy::new(|| {
    CHECKS
        .iter()
        .filter_map(|c| Regex::new(c.pattern).ok().map(|re| (c, re)))
        .collect()
});

fn is_hit(check: &TextCheck, re: &Regex, target: &str, lower: &str) -> bool {
    match check.filter {
        Filter::None => re.is_match(target),
        Filter::NotEchoOrRg => {
            let start = lower.trim_start();
            !(start.starts_with("echo ") || start.starts_with("rg ")) && re.is_match(target)
        }
        Filter::ForceNotLease => re.captures_iter(target).any(|caps| {
            caps.get(1).is_some_and(|tail| {
                tail.as_str()
                    .split_whitespace()
                    .any(|w| w == "-f" || w == "--force")
            })
        }),
        Filter::NoStagedOrHelp => re.find_iter(target).any(|m| {
            let rest = target[m.end()..].split('\n').next().unwrap_or_default();
            !rest.contains("--staged") && !rest.contains("--help")
        }),
    }
}

/// Look for a destructive command spelled out in raw text.
pub fn dangerous_in_text(text: &str) -> Decision {
    let lower = text.to_lowercase();
    for (check, re) in COMPILED.iter() {
        let target = if check.case_sensitive { text } else { lower.as_str() };
        if is_hit(check, re, target, &lower) {
            log::debug!("text check {} matched", check.rule);
            return Decision::block(
                check.rule,
                format!("Detected {} in command text that could not be parsed.", check.label),
            );
        }
    }
    Decision::allow()
}
