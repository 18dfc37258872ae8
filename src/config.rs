//! Configuration loading, validation and merging.
//!
//! Two optional JSON files add custom blocking rules: a user-level one in
//! `~/.cc-safety-net/config.json` and a project-level `.safety-net.json` in
//! the working directory. Project rules replace user rules of the same name.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Env var overriding the user config path (used by tests).
pub const USER_CONFIG_ENV: &str = "SAFETY_NET_USER_CONFIG";
pub const PROJECT_CONFIG_FILE: &str = ".safety-net.json";
pub const STATE_DIR: &str = ".cc-safety-net";

const MAX_REASON_LENGTH: usize = 256;
const TOP_LEVEL_KEYS: &[&str] = &["$schema", "version", "rules"];
const RULE_KEYS: &[&str] = &["name", "command", "subcommand", "block_args", "reason"];

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]{0,63}$").expect("valid regex"));
static COMMAND_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").expect("valid regex"));

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config file is empty")]
    Empty,

    /// Validation failures, joined with "; ".
    #[error("{}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// A user-defined rule that blocks specific arguments of one command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomRule {
    /// Rule name, shown in block messages.
    pub name: String,
    /// Program basename (`docker`, `git`, ...).
    pub command: String,
    /// Optional subcommand that must match (`push` for `git push`).
    #[serde(default)]
    pub subcommand: Option<String>,
    /// Arguments that trigger the block.
    pub block_args: Vec<String>,
    pub reason: String,
}

/// One configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub version: u32,
    #[serde(default)]
    pub rules: Vec<CustomRule>,
}

/// Merged custom rules, read-only input to the analysis core.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOverrides {
    pub rules: Vec<CustomRule>,
}

/// Where a config file comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    User,
    Project,
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigScope::User => write!(f, "User"),
            ConfigScope::Project => write!(f, "Project"),
        }
    }
}

impl Config {
    /// Parse and validate a config document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Err(ConfigError::Empty);
        }
        let value: Value = serde_json::from_str(content)?;
        let errors = validate(&value);
        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Load a config file. A missing or empty file is `Ok(None)`.
    pub fn load_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        match Self::parse(&content) {
            Err(ConfigError::Empty) => Ok(None),
            other => other.map(Some),
        }
    }

    /// Get user config path.
    /// Respects SAFETY_NET_USER_CONFIG env var for testing.
    pub fn user_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(USER_CONFIG_ENV)
            && !path.is_empty()
        {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|h| h.join(STATE_DIR).join("config.json"))
    }

    pub fn project_config_path(cwd: &Path) -> PathBuf {
        cwd.join(PROJECT_CONFIG_FILE)
    }
}

/// Validate a parsed config document, collecting every problem.
pub fn validate(value: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(object) = value.as_object() else {
        errors.push("config must be a JSON object".to_string());
        return errors;
    };

    for key in object.keys() {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            errors.push(format!("unknown top-level key '{key}'"));
        }
    }

    match object.get("version") {
        None => errors.push("missing required field 'version'".to_string()),
        Some(v) if v.as_u64() == Some(1) => {}
        Some(v) => errors.push(format!("unsupported version {v} (expected 1)")),
    }

    match object.get("rules") {
        None => {}
        Some(Value::Array(rules)) => validate_rules(rules, &mut errors),
        Some(_) => errors.push("'rules' must be an array".to_string()),
    }

    errors
}

fn validate_rules(rules: &[Value], errors: &mut Vec<String>) {
    let mut seen: Vec<String> = Vec::new();

    for (i, rule) in rules.iter().enumerate() {
        let at = format!("rules[{i}]");
        let Some(rule) = rule.as_object() else {
            errors.push(format!("{at} must be an object"));
            continue;
        };

        for key in rule.keys() {
            if !RULE_KEYS.contains(&key.as_str()) {
                errors.push(format!("{at}: unknown key '{key}'"));
            }
        }

        match rule.get("name").and_then(Value::as_str) {
            None => errors.push(format!("{at}.name must be a string")),
            Some(name) if !NAME_PATTERN.is_match(name) => errors.push(format!(
                "{at}.name '{name}' must start with a letter and contain only letters, digits, '_' or '-' (max 64)"
            )),
            Some(name) => {
                let folded = name.to_lowercase();
                if seen.contains(&folded) {
                    errors.push(format!(
                        "{at}.name '{name}' is a duplicate (names are case-insensitive)"
                    ));
                } else {
                    seen.push(folded);
                }
            }
        }

        match rule.get("command").and_then(Value::as_str) {
            None => errors.push(format!("{at}.command must be a string")),
            Some(command) if !COMMAND_PATTERN.is_match(command) => {
                errors.push(format!("{at}.command '{command}' is not a valid command name"))
            }
            Some(_) => {}
        }

        match rule.get("subcommand") {
            None | Some(Value::Null) => {}
            Some(Value::String(sub)) if COMMAND_PATTERN.is_match(sub) => {}
            Some(_) => errors.push(format!("{at}.subcommand is not a valid subcommand name")),
        }

        let block_args_ok = rule
            .get("block_args")
            .and_then(Value::as_array)
            .is_some_and(|args| {
                !args.is_empty()
                    && args
                        .iter()
                        .all(|a| a.as_str().is_some_and(|s| !s.is_empty()))
            });
        if !block_args_ok {
            errors.push(format!(
                "{at}.block_args must be a non-empty array of non-empty strings"
            ));
        }

        match rule.get("reason").and_then(Value::as_str) {
            None => errors.push(format!("{at}.reason must be a string")),
            Some("") => errors.push(format!("{at}.reason must not be empty")),
            Some(reason) if reason.chars().count() > MAX_REASON_LENGTH => errors.push(format!(
                "{at}.reason exceeds {MAX_REASON_LENGTH} characters"
            )),
            Some(_) => {}
        }
    }
}

/// Merge user and project configs. Project rules replace same-named user rules.
pub fn merge(user: Option<Config>, project: Option<Config>) -> RuleOverrides {
    let user_rules = user.map(|c| c.rules).unwrap_or_default();
    let project_rules = project.map(|c| c.rules).unwrap_or_default();

    let mut rules: Vec<CustomRule> = user_rules
        .into_iter()
        .filter(|u| {
            !project_rules
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&u.name))
        })
        .collect();
    rules.extend(project_rules);
    RuleOverrides { rules }
}

/// Load one scope for the hook path: invalid files are logged and ignored.
fn load_scope(scope: ConfigScope, path: Option<PathBuf>) -> Option<Config> {
    let path = path?;
    match Config::load_file(&path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring {scope} config {}: {e}", path.display());
            None
        }
    }
}

/// Load and merge both scopes. Never fails; built-in rules always apply.
pub fn load_overrides(cwd: Option<&Path>) -> RuleOverrides {
    let user = load_scope(ConfigScope::User, Config::user_config_path());
    let project = load_scope(
        ConfigScope::Project,
        cwd.map(Config::project_config_path),
    );
    let overrides = merge(user, project);
    log::debug!("loaded {} custom rules", overrides.rules.len());
    overrides
}

/// Validation result for one existing config file.
#[derive(Debug)]
pub struct ScopeReport {
    pub scope: ConfigScope,
    pub path: PathBuf,
    /// Rules defined in the file, when it is valid.
    pub rules: usize,
    pub errors: Vec<String>,
}

/// Validate every config file that exists, for `verify-config`.
pub fn verify(cwd: Option<&Path>) -> Vec<ScopeReport> {
    let candidates = [
        (ConfigScope::User, Config::user_config_path()),
        (ConfigScope::Project, cwd.map(Config::project_config_path)),
    ];

    candidates
        .into_iter()
        .filter_map(|(scope, path)| path.map(|p| (scope, p)))
        .filter(|(_, path)| path.exists())
        .map(|(scope, path)| {
            let result = fs::read_to_string(&path)
                .map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })
                .and_then(|content| Config::parse(&content));
            let (rules, errors) = match result {
                Ok(config) => (config.rules.len(), Vec::new()),
                Err(ConfigError::Invalid(errors)) => (0, errors),
                Err(e) => (0, vec![e.to_string()]),
            };
            ScopeReport {
                scope,
                path,
                rules,
                errors,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rule(name: &str, command: &str, reason: &str) -> CustomRule {
        CustomRule {
            name: name.to_string(),
            command: command.to_string(),
            subcommand: None,
            block_args: vec!["--force".to_string()],
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_parse_valid_config() {
        let config = Config::parse(
            r#"{
                "version": 1,
                "rules": [{
                    "name": "no-docker-prune",
                    "command": "docker",
                    "subcommand": "system",
                    "block_args": ["prune"],
                    "reason": "Prunes everything"
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.rules[0].subcommand.as_deref(), Some("system"));
    }

    #[test]
    fn test_rules_optional() {
        let config = Config::parse(r#"{"version": 1}"#).unwrap();
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_invalid_version() {
        let err = Config::parse(r#"{"version": 2}"#).unwrap_err();
        assert!(err.to_string().contains("unsupported version 2"));
        let err = Config::parse(r#"{"rules": []}"#).unwrap_err();
        assert!(err.to_string().contains("missing required field 'version'"));
    }

    #[test]
    fn test_errors_are_collected() {
        let err = Config::parse(
            r#"{
                "version": 1,
                "extra": true,
                "rules": [
                    {"name": "1bad", "command": "git push", "block_args": [], "reason": ""},
                    {"name": "Dup", "command": "git", "block_args": ["-f"], "reason": "x"},
                    {"name": "dup", "command": "git", "block_args": [""], "reason": "x", "color": 1}
                ]
            }"#,
        )
        .unwrap_err();
        let ConfigError::Invalid(errors) = err else {
            panic!("expected validation errors");
        };
        let joined = errors.join("\n");
        assert!(joined.contains("unknown top-level key 'extra'"));
        assert!(joined.contains("rules[0].name '1bad'"));
        assert!(joined.contains("rules[0].command 'git push'"));
        assert!(joined.contains("rules[0].block_args"));
        assert!(joined.contains("rules[0].reason must not be empty"));
        assert!(joined.contains("rules[2].name 'dup' is a duplicate"));
        assert!(joined.contains("rules[2].block_args"));
        assert!(joined.contains("rules[2]: unknown key 'color'"));
        assert!(!joined.contains("rules[1]"));
    }

    #[test]
    fn test_reason_length_limit() {
        let long = "x".repeat(MAX_REASON_LENGTH + 1);
        let doc = format!(
            r#"{{"version":1,"rules":[{{"name":"a","command":"b","block_args":["c"],"reason":"{long}"}}]}}"#
        );
        assert!(Config::parse(&doc).unwrap_err().to_string().contains("exceeds 256"));
    }

    #[test]
    fn test_not_an_object() {
        assert_eq!(validate(&serde_json::json!([1])), vec!["config must be a JSON object"]);
        assert!(matches!(Config::parse("not json"), Err(ConfigError::Json(_))));
        assert!(matches!(Config::parse("  "), Err(ConfigError::Empty)));
    }

    #[test]
    fn test_merge_project_overrides_user() {
        let user = Config {
            version: 1,
            rules: vec![rule("shared", "git", "user"), rule("only-user", "npm", "u")],
        };
        let project = Config {
            version: 1,
            rules: vec![rule("SHARED", "git", "project")],
        };
        let merged = merge(Some(user), Some(project));
        let names: Vec<&str> = merged.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["only-user", "SHARED"]);
        assert_eq!(merged.rules[1].reason, "project");
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge(None, None).rules.is_empty());
    }

    #[test]
    fn test_load_file_missing_and_empty() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_file(&dir.path().join("nope.json")).unwrap().is_none());

        let empty = dir.path().join("empty.json");
        fs::write(&empty, "").unwrap();
        assert!(Config::load_file(&empty).unwrap().is_none());
    }

    #[test]
    fn test_verify_reports_project_errors() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_CONFIG_FILE), r#"{"version": 3}"#).unwrap();
        let reports = verify(Some(dir.path()));
        let project = reports
            .iter()
            .find(|r| r.scope == ConfigScope::Project)
            .unwrap();
        assert_eq!(project.errors.len(), 1);
        assert!(project.errors[0].contains("unsupported version 3"));
    }
}
