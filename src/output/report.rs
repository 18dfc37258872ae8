//! Config verification report for `verify-config`.

use crate::config::ScopeReport;

const SEPARATOR_WIDTH: usize = 60;

/// Render the verification report. Returns the text and whether any
/// config file failed validation.
pub fn format_config_report(reports: &[ScopeReport]) -> (String, bool) {
    if reports.is_empty() {
        return (
            "No config files found. Using built-in rules only.".to_string(),
            false,
        );
    }

    let separator = "-".repeat(SEPARATOR_WIDTH);
    let mut lines = Vec::new();
    let mut failed = false;

    for report in reports {
        lines.push(format!("{} config: {}", report.scope, report.path.display()));
        lines.push(separator.clone());
        if report.errors.is_empty() {
            lines.push(format!("✓ {} rule(s)", report.rules));
        } else {
            failed = true;
            for error in &report.errors {
                for part in error.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                    lines.push(format!("✗ {part}"));
                }
            }
        }
        lines.push(String::new());
    }

    if failed {
        lines.push("Config validation failed".to_string());
    } else {
        let scopes: Vec<String> = reports.iter().map(|r| r.scope.to_string()).collect();
        lines.push(format!("Config OK ({})", scopes.join(", ")));
    }

    (lines.join("\n"), failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigScope;
    use std::path::PathBuf;

    fn report(scope: ConfigScope, errors: &[&str]) -> ScopeReport {
        ScopeReport {
            scope,
            path: PathBuf::from("/x/config.json"),
            rules: if errors.is_empty() { 2 } else { 0 },
            errors: errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_no_files() {
        let (text, failed) = format_config_report(&[]);
        assert_eq!(text, "No config files found. Using built-in rules only.");
        assert!(!failed);
    }

    #[test]
    fn test_ok() {
        let (text, failed) = format_config_report(&[
            report(ConfigScope::User, &[]),
            report(ConfigScope::Project, &[]),
        ]);
        assert!(!failed);
        assert!(text.contains("User config: /x/config.json"));
        assert!(text.contains(&"-".repeat(60)));
        assert!(text.ends_with("Config OK (User, Project)"));
    }

    #[test]
    fn test_errors_split() {
        let (text, failed) =
            format_config_report(&[report(ConfigScope::Project, &["bad version; bad rules"])]);
        assert!(failed);
        assert!(text.contains("Project config: /x/config.json"));
        assert!(text.contains("✗ bad version\n✗ bad rules"));
        assert!(text.ends_with("Config validation failed"));
    }
}
