//! Custom user-defined rules.

use super::git::locate_subcommand;
use crate::config::{CustomRule, RuleOverrides};
use crate::decision::Decision;
use crate::shell::EffectiveCommand;
use crate::shell::options::short_flags;

/// The subcommand of a command: git's is found past its global options,
/// everything else uses the first non-option argument.
fn subcommand_of<'a>(name: &str, args: &'a [String]) -> Option<&'a str> {
    if name == "git" {
        return locate_subcommand(args).map(|(sub, _)| sub);
    }
    args.iter()
        .take_while(|a| *a != "--")
        .find(|a| !a.starts_with('-'))
        .map(String::as_str)
}

fn matches_args(rule: &CustomRule, args: &[String], shorts: &[char]) -> bool {
    rule.block_args.iter().any(|blocked| {
        if args.iter().any(|arg| {
            arg == blocked
                || (blocked.starts_with("--")
                    && arg
                        .strip_prefix(blocked.as_str())
                        .is_some_and(|rest| rest.starts_with('=')))
        }) {
            return true;
        }
        let mut letters = blocked.strip_prefix('-').unwrap_or_default().chars();
        match (letters.next(), letters.next()) {
            (Some(letter), None) if letter != '-' => shorts.contains(&letter),
            _ => false,
        }
    })
}

/// Check user rules against an effective command. Rules only add blocks.
pub fn check_custom_rules(cmd: &EffectiveCommand, overrides: &RuleOverrides) -> Decision {
    if overrides.rules.is_empty() {
        return Decision::allow();
    }

    let name = cmd.name();
    let subcommand = subcommand_of(&name, &cmd.args);
    let shorts = short_flags(&cmd.args);

    for rule in &overrides.rules {
        if !rule.command.eq_ignore_ascii_case(&name) {
            continue;
        }
        if let Some(wanted) = &rule.subcommand
            && subcommand != Some(wanted.as_str())
        {
            continue;
        }
        if matches_args(rule, &cmd.args, &shorts) {
            log::debug!("custom rule {} matched {name}", rule.name);
            return Decision::block(
                format!("custom.{}", rule.name),
                format!("[{}] {}", rule.name, rule.reason),
            );
        }
    }

    Decision::allow()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(
        name: &str,
        command: &str,
        subcommand: Option<&str>,
        block_args: &[&str],
    ) -> CustomRule {
        CustomRule {
            name: name.to_string(),
            command: command.to_string(),
            subcommand: subcommand.map(String::from),
            block_args: block_args.iter().map(|a| a.to_string()).collect(),
            reason: "not here".to_string(),
        }
    }

    fn overrides(rules: Vec<CustomRule>) -> RuleOverrides {
        RuleOverrides { rules }
    }

    fn command(program: &str, args: &str) -> EffectiveCommand {
        EffectiveCommand {
            program: program.to_string(),
            args: args.split_whitespace().map(String::from).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_block_arg_matches() {
        let o = overrides(vec![rule("no-prune", "docker", Some("system"), &["prune"])]);
        let decision = check_custom_rules(&command("docker", "system prune -a"), &o);
        let info = decision.block_info().unwrap();
        assert_eq!(info.rule, "custom.no-prune");
        assert_eq!(info.reason, "[no-prune] not here");

        assert!(!check_custom_rules(&command("docker", "image prune"), &o).is_blocked());
        assert!(!check_custom_rules(&command("podman", "system prune"), &o).is_blocked());
    }

    #[test]
    fn test_git_subcommand_after_global_options() {
        let o = overrides(vec![rule(
            "no-force-push",
            "git",
            Some("push"),
            &["--force-with-lease"],
        )]);
        assert!(
            check_custom_rules(&command("git", "-C repo push --force-with-lease origin"), &o)
                .is_blocked()
        );
        let fetch = command("git", "-C push fetch --force-with-lease");
        assert!(!check_custom_rules(&fetch, &o).is_blocked());
    }

    #[test]
    fn test_short_cluster_and_long_value() {
        let o = overrides(vec![rule("npm-guard", "npm", None, &["-g", "--registry"])]);
        assert!(check_custom_rules(&command("npm", "install -dg left-pad"), &o).is_blocked());
        assert!(
            check_custom_rules(&command("npm", "install --registry=http://x"), &o).is_blocked()
        );
        assert!(!check_custom_rules(&command("npm", "install --registryx"), &o).is_blocked());
        assert!(!check_custom_rules(&command("npm", "install -- -dg"), &o).is_blocked());
    }

    #[test]
    fn test_command_by_basename() {
        let o = overrides(vec![rule("no-kill", "kubectl", Some("delete"), &["--all"])]);
        assert!(
            check_custom_rules(&command("/usr/local/bin/kubectl", "delete pods --all"), &o)
                .is_blocked()
        );
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let o = overrides(vec![
            rule("first", "make", None, &["clean"]),
            rule("second", "make", None, &["clean"]),
        ]);
        let decision = check_custom_rules(&command("make", "clean"), &o);
        assert_eq!(decision.block_info().unwrap().rule, "custom.first");
    }

    #[test]
    fn test_no_rules() {
        let none = RuleOverrides::default();
        assert!(!check_custom_rules(&command("rm", "-rf /"), &none).is_blocked());
    }
}
