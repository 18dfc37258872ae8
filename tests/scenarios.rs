//! End-to-end analysis scenarios against the library API.

use cc_safety_net::analysis::{AnalyzeOptions, Environment, analyze_command};
use cc_safety_net::config::{Config, RuleOverrides, merge};
use cc_safety_net::decision::Decision;
use cc_safety_net::rules::{
    PARANOID_SUFFIX, REASON_RM_RF, REASON_RM_RF_ROOT_HOME, REASON_STRICT_UNPARSEABLE,
};

const CWD: &str = "/home/u/project";
const HOME: &str = "/home/u";

fn opts_with(cwd: Option<&str>, paranoid_rm: bool) -> AnalyzeOptions {
    AnalyzeOptions::new(
        cwd.map(String::from),
        Environment {
            home: Some(HOME.to_string()),
            tmpdir: Some("/tmp".to_string()),
            paranoid_rm,
            ..Default::default()
        },
        RuleOverrides::default(),
    )
}

fn opts() -> AnalyzeOptions {
    opts_with(Some(CWD), false)
}

fn check(cmd: &str) -> Decision {
    analyze_command(cmd, &opts())
}

fn reason(cmd: &str) -> Option<String> {
    check(cmd).reason().map(String::from)
}

const DANGEROUS: &[&str] = &[
    "git reset --hard",
    "git checkout -- .",
    "git clean -fd",
    "git push --force",
    "git branch -D topic",
    "git stash clear",
    "rm -rf /etc",
    "rm -rf ~",
];

const SAFE: &[&str] = &["ls -la", "git status", "echo done", "cargo build"];

#[test]
fn test_literal_scenarios() {
    assert!(reason("git reset --hard").unwrap().starts_with("git reset --hard"));
    assert!(reason("git -C repo reset --hard").unwrap().starts_with("git reset --hard"));
    assert!(!check("git checkout -b new-branch").is_blocked());
    assert!(reason("git checkout HEAD file.txt")
        .unwrap()
        .starts_with("git checkout <ref> <path>"));
    assert!(!check("rm -rf /tmp/build").is_blocked());
    assert_eq!(reason("rm -rf .").as_deref(), Some(REASON_RM_RF));
    assert!(!check("git push --force-with-lease").is_blocked());
    assert!(reason("git push --force --force-with-lease")
        .unwrap()
        .starts_with("Force push"));
    assert!(reason("sh -c 'git reset --hard'").unwrap().starts_with("git reset --hard"));
}

#[test]
fn test_wrapper_invariance() {
    for cmd in DANGEROUS {
        let expected = reason(cmd).unwrap_or_else(|| panic!("{cmd} should block"));
        for wrapped in [
            format!("sudo {cmd}"),
            format!("env VAR=1 {cmd}"),
            format!("command -- {cmd}"),
            format!("env -u PATH {cmd}"),
            format!("exec {cmd}"),
            format!("exec -a name {cmd}"),
            format!("setsid {cmd}"),
            format!("stdbuf -oL {cmd}"),
            format!("eval {cmd}"),
            format!("eval '{cmd}'"),
            format!("watch -n 5 {cmd}"),
            format!("bash -c $'{cmd}'"),
        ] {
            assert_eq!(reason(&wrapped).as_deref(), Some(expected.as_str()), "{wrapped}");
        }
    }
}

/// `$'...'` around each option word.
fn ansi_c_options(cmd: &str) -> String {
    cmd.split(' ')
        .map(|w| {
            if w.starts_with('-') {
                format!("$'{w}'")
            } else {
                w.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn test_ansi_c_quoting_invariance() {
    for cmd in DANGEROUS {
        let expected = reason(cmd).unwrap_or_else(|| panic!("{cmd} should block"));
        let quoted = ansi_c_options(cmd);
        assert_eq!(reason(&quoted).as_deref(), Some(expected.as_str()), "{quoted}");
    }
    assert!(check("git reset $'--hard'").is_blocked());
    assert!(check("git push origin $'--force'").is_blocked());
    assert!(check(r"git push origin $'\x2d\x2dforce'").is_blocked());
    assert!(check("git push origin $\"--force\"").is_blocked());
}

#[test]
fn test_pipeline_propagation() {
    for cmd in DANGEROUS {
        for safe in SAFE {
            for line in [
                format!("{safe} | {cmd}"),
                format!("{cmd} ; {safe}"),
                format!("{safe} && {cmd}"),
            ] {
                assert!(check(&line).is_blocked(), "{line}");
            }
        }
    }
}

#[test]
fn test_safe_commands_allowed() {
    for safe in SAFE {
        assert!(!check(safe).is_blocked(), "{safe}");
    }
    assert!(!check(&SAFE.join(" && ")).is_blocked());
}

#[test]
fn test_idempotence() {
    for cmd in DANGEROUS.iter().chain(SAFE) {
        let o = opts();
        assert_eq!(analyze_command(cmd, &o), analyze_command(cmd, &o), "{cmd}");
    }
}

#[test]
fn test_rm_under_cwd_allowed() {
    for path in [
        "/home/u/project/build",
        "/home/u/project/a/b/c",
        "/home/u/project/./x",
        "/home/u/project/a/../b",
    ] {
        assert!(!check(&format!("rm -rf {path}")).is_blocked(), "{path}");
    }
    assert!(check("rm -rf /home/u/project/..").is_blocked());
    assert!(check("rm -rf /home/u/project").is_blocked());
}

#[test]
fn test_root_and_home_always_blocked() {
    for cwd in [Some(CWD), Some("/tmp"), Some(HOME), Some("/"), None] {
        for paranoid in [false, true] {
            let o = opts_with(cwd, paranoid);
            for cmd in ["rm -rf $HOME", "rm -rf ~", "rm -rf /"] {
                assert_eq!(
                    analyze_command(cmd, &o).reason(),
                    Some(REASON_RM_RF_ROOT_HOME),
                    "{cmd} in {cwd:?} paranoid={paranoid}"
                );
            }
        }
    }
}

#[test]
fn test_paranoid_rm() {
    let o = opts_with(Some(CWD), true);
    let expected = format!("{REASON_RM_RF}{PARANOID_SUFFIX}");
    assert_eq!(analyze_command("rm -rf build", &o).reason(), Some(expected.as_str()));
    assert_eq!(analyze_command("rm -rf ./dist", &o).reason(), Some(expected.as_str()));
    // Temp paths still win over paranoid mode.
    assert!(!analyze_command("rm -rf /tmp/build", &o).is_blocked());
}

#[test]
fn test_nested_shells() {
    assert!(check(r#"bash -c "sh -c 'git reset --hard'""#).is_blocked());
    assert!(check("sudo env FOO=1 bash -lc 'cd x && rm -rf /'").is_blocked());
    assert!(!check("bash -c 'git log --oneline | head'").is_blocked());
}

#[test]
fn test_malformed_input() {
    let cases: &[(&str, Option<&str>)] = &[
        ("'unterminated", None),
        ("\"half", None),
        ("$(", None),
        ("`", None),
        ("((", None),
        ("|||", None),
        ("&&", None),
        // Unterminated quotes: the words read so far are analyzed, then the raw text.
        ("git reset --hard '", Some("git.reset.hard")),
        ("git reset --hard 'oops", Some("git.reset.hard")),
        ("echo 'rm -rf /", Some("text.rm_rf")),
        // A stray parenthesis only separates commands.
        ("git status ) rm -rf /", Some("rm.root_or_home")),
        ("(git reset --hard", Some("git.reset.hard")),
        ("ls )", None),
    ];
    for (cmd, expected) in cases {
        let rule = check(cmd).block_info().map(|i| i.rule.clone());
        assert_eq!(rule.as_deref(), *expected, "{cmd}");
    }
}

#[test]
fn test_strict_mode_blocks_unterminated_input() {
    let mut o = opts();
    o.env.strict = true;
    for cmd in ["'unterminated", "echo \"half", "echo $(date", "ls `pwd"] {
        let decision = analyze_command(cmd, &o);
        assert_eq!(decision.reason(), Some(REASON_STRICT_UNPARSEABLE), "{cmd}");
    }
    assert!(!analyze_command("echo 'done' && ls", &o).is_blocked());
}

#[test]
fn test_embedded_commands_under_unknown_programs() {
    assert!(check("ssh host rm -rf /").is_blocked());
    assert!(check("ionice -c3 git reset --hard").is_blocked());
    assert!(!check("ssh host rm -rf build").is_blocked());
    assert!(!check("echo git reset --hard").is_blocked());
}

#[test]
fn test_custom_rules_only_add() {
    let mut o = opts();
    let config = Config::parse(
        r#"{"version":1,"rules":[{"name":"no-rsync-delete","command":"rsync","block_args":["--delete"],"reason":"mirror deletes"}]}"#,
    )
    .unwrap();
    o.overrides = merge(None, Some(config));

    assert_eq!(
        analyze_command("rsync -a --delete src/ dst/", &o).reason(),
        Some("[no-rsync-delete] mirror deletes")
    );
    assert!(analyze_command("git reset --hard", &o).is_blocked());
    assert!(!analyze_command("rsync -a src/ dst/", &o).is_blocked());
}
