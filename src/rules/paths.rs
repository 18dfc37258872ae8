//! String-only path classification for `rm` targets.
//!
//! Nothing here touches the filesystem: symlinks, mounts and permissions are
//! invisible, so this is a heuristic and not a security boundary.

/// Where a path points, as far as its text can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    RootOrHome,
    Temp,
    WithinCwd,
    Unknown,
}

/// Environment values the classifier needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEnv<'a> {
    pub cwd: Option<&'a str>,
    pub home: Option<&'a str>,
    /// The process TMPDIR.
    pub tmpdir: Option<&'a str>,
    /// Whether `$TMPDIR` in a path may be trusted to mean a temp directory.
    pub allow_tmpdir_var: bool,
}

const TEMP_ROOTS: &[&str] = &["/tmp", "/var/tmp"];

/// Lexically normalize a POSIX path: collapse `//`, drop `.`, resolve `..`.
///
/// Relative paths stay relative and keep leading `..` segments. The empty
/// path normalizes to `.`.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

fn is_under(path: &str, root: &str) -> bool {
    path == root || is_strictly_under(path, root)
}

fn is_strictly_under(path: &str, root: &str) -> bool {
    if root == "/" {
        return path != "/" && path.starts_with('/');
    }
    path.strip_prefix(root)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// `/`, `~`, `$HOME` and everything spelled relative to home.
pub fn is_root_or_home(path: &str, home: Option<&str>) -> bool {
    if path == "/" || path == "/*" {
        return true;
    }
    if path == "~" || path.starts_with("~/") {
        return true;
    }
    if path == "$HOME" || path.starts_with("$HOME/") || path.starts_with("${HOME}") {
        return true;
    }
    if path.starts_with('/') {
        let normalized = normalize(path);
        if normalized == "/" {
            return true;
        }
        if let Some(home) = home.filter(|h| h.starts_with('/')) {
            return normalized == normalize(home);
        }
    }
    false
}

/// `/tmp`, `/var/tmp` and a trusted `$TMPDIR`.
pub fn is_temp(path: &str, env: &PathEnv<'_>) -> bool {
    if path.contains('$') {
        return env.allow_tmpdir_var && is_tmpdir_var_path(path);
    }
    if path.contains('`') || !path.starts_with('/') {
        return false;
    }
    let normalized = normalize(path);
    if TEMP_ROOTS.iter().any(|root| is_under(&normalized, root)) {
        return true;
    }
    match trusted_tmpdir(env) {
        Some(tmpdir) => is_under(&normalized, &tmpdir),
        None => false,
    }
}

fn trusted_tmpdir(env: &PathEnv<'_>) -> Option<String> {
    if !env.allow_tmpdir_var {
        return None;
    }
    let tmpdir = env.tmpdir.filter(|t| t.starts_with('/'))?;
    let normalized = normalize(tmpdir);
    (normalized != "/").then_some(normalized)
}

fn is_tmpdir_var_path(path: &str) -> bool {
    ["$TMPDIR", "${TMPDIR}"].iter().any(|prefix| {
        match path.strip_prefix(prefix) {
            Some("") => true,
            Some(rest) => {
                rest.starts_with('/')
                    && !rest.contains('$')
                    && !rest.contains('`')
                    && !rest.split('/').any(|seg| seg == "..")
            }
            None => false,
        }
    })
}

/// Whether `$TMPDIR` in a command can be taken to mean a temp directory.
///
/// The process TMPDIR must be set to something other than `/`, and a
/// `TMPDIR=` assignment on the command itself must point at a temp location.
pub fn tmpdir_trusted(assigned: Option<&str>, env_tmpdir: Option<&str>) -> bool {
    let Some(env_tmpdir) = env_tmpdir.filter(|t| t.starts_with('/')) else {
        return false;
    };
    let env_tmpdir = normalize(env_tmpdir);
    if env_tmpdir == "/" {
        return false;
    }
    match assigned {
        None => true,
        Some(value) if !value.starts_with('/') => false,
        Some(value) => {
            let value = normalize(value);
            value != "/"
                && (TEMP_ROOTS.iter().any(|root| is_under(&value, root))
                    || is_under(&value, &env_tmpdir))
        }
    }
}

/// Strict descendant of cwd. cwd itself (and `.`) is rejected.
pub fn is_within_cwd(path: &str, cwd: Option<&str>) -> bool {
    let Some(cwd) = cwd.filter(|c| c.starts_with('/')) else {
        return false;
    };
    if path.starts_with('~') || path.contains('$') || path.contains('`') {
        return false;
    }
    let normalized = normalize(path);
    if normalized == "." {
        return false;
    }
    let cwd = normalize(cwd);
    if cwd == "/" {
        // Everything is "within" the root; never treat that as safe.
        return false;
    }
    let resolved = if normalized.starts_with('/') {
        normalized
    } else {
        normalize(&format!("{cwd}/{normalized}"))
    };
    is_strictly_under(&resolved, &cwd)
}

/// Classify a path. Root/home wins over temp, which wins over cwd.
pub fn classify(path: &str, env: &PathEnv<'_>) -> PathClass {
    if is_root_or_home(path, env.home) {
        PathClass::RootOrHome
    } else if is_temp(path, env) {
        PathClass::Temp
    } else if is_within_cwd(path, env.cwd) {
        PathClass::WithinCwd
    } else {
        PathClass::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(cwd: &'a str) -> PathEnv<'a> {
        PathEnv {
            cwd: Some(cwd),
            home: Some("/home/u"),
            tmpdir: Some("/var/folders/xy/T"),
            allow_tmpdir_var: true,
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("//a//b/"), "/a/b");
        assert_eq!(normalize("/a/./b/../c"), "/a/c");
        assert_eq!(normalize("/.."), "/");
        assert_eq!(normalize("/tmp/../etc"), "/etc");
        assert_eq!(normalize(""), ".");
        assert_eq!(normalize("./"), ".");
        assert_eq!(normalize("a/.."), ".");
        assert_eq!(normalize("../x"), "../x");
        assert_eq!(normalize("a/../../b"), "../b");
    }

    #[test]
    fn test_root_or_home() {
        let blocked = [
            "/", "/*", "/..", "//", "/./", "~", "~/", "~/code", "$HOME", "$HOME/x", "${HOME}",
            "${HOME}/x", "/home/u", "/home/u/",
        ];
        for path in blocked {
            assert!(is_root_or_home(path, Some("/home/u")), "{path}");
        }
        for path in ["/home/u/project", "/etc", "./~", "home", "$HOMEDIR"] {
            assert!(!is_root_or_home(path, Some("/home/u")), "{path}");
        }
    }

    #[test]
    fn test_temp_paths() {
        let e = env("/home/u/project");
        assert!(is_temp("/tmp", &e));
        assert!(is_temp("/tmp/build", &e));
        assert!(is_temp("/var/tmp/x/y", &e));
        assert!(is_temp("/var/folders/xy/T/cache", &e));
        assert!(is_temp("$TMPDIR", &e));
        assert!(is_temp("${TMPDIR}/x", &e));
        assert!(!is_temp("/tmp/../etc", &e));
        assert!(!is_temp("/tmpfoo", &e));
        assert!(!is_temp("tmp/x", &e));
        assert!(!is_temp("$TMPDIR/../etc", &e));
        assert!(!is_temp("$TMPDIRX", &e));
        assert!(!is_temp("/tmp/`whoami`", &e));
    }

    #[test]
    fn test_untrusted_tmpdir_var() {
        let e = PathEnv {
            allow_tmpdir_var: false,
            ..env("/home/u/project")
        };
        assert!(!is_temp("$TMPDIR/x", &e));
        assert!(!is_temp("/var/folders/xy/T/cache", &e));
        assert!(is_temp("/tmp/x", &e));
    }

    #[test]
    fn test_tmpdir_trust() {
        assert!(tmpdir_trusted(None, Some("/var/folders/T")));
        assert!(tmpdir_trusted(Some("/tmp/work"), Some("/var/folders/T")));
        assert!(tmpdir_trusted(Some("/var/folders/T/x"), Some("/var/folders/T")));
        assert!(!tmpdir_trusted(Some("/etc"), Some("/var/folders/T")));
        assert!(!tmpdir_trusted(Some(""), Some("/tmp")));
        assert!(!tmpdir_trusted(Some("relative"), Some("/tmp")));
        assert!(!tmpdir_trusted(None, None));
        assert!(!tmpdir_trusted(None, Some("")));
        assert!(!tmpdir_trusted(None, Some("/")));
    }

    #[test]
    fn test_within_cwd() {
        let cwd = Some("/home/u/project");
        assert!(is_within_cwd("build", cwd));
        assert!(is_within_cwd("./build/out", cwd));
        assert!(is_within_cwd("/home/u/project/dist", cwd));
        assert!(is_within_cwd("a/../b", cwd));
        assert!(!is_within_cwd(".", cwd));
        assert!(!is_within_cwd("", cwd));
        assert!(!is_within_cwd("a/..", cwd));
        assert!(!is_within_cwd("..", cwd));
        assert!(!is_within_cwd("../other", cwd));
        assert!(!is_within_cwd("/home/u/project", cwd));
        assert!(!is_within_cwd("/home/u/projectx", cwd));
        assert!(!is_within_cwd("~/project/x", cwd));
        assert!(!is_within_cwd("$DIR/x", cwd));
        assert!(!is_within_cwd("`pwd`/x", cwd));
        assert!(!is_within_cwd("build", None));
        assert!(!is_within_cwd("etc", Some("/")));
    }

    #[test]
    fn test_classify_precedence() {
        let e = env("/tmp");
        assert_eq!(classify("/", &e), PathClass::RootOrHome);
        assert_eq!(classify("/tmp/x", &e), PathClass::Temp);
        assert_eq!(classify("x", &e), PathClass::WithinCwd);
        assert_eq!(classify("../etc", &e), PathClass::Unknown);
        assert_eq!(classify("$X", &e), PathClass::Unknown);
    }
}
