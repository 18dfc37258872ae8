//! Unwind wrapper commands (sudo, env, exec, nice, sh -c, eval, ...).

use super::tokenizer::{Token, tokenize};

/// Maximum number of wrappers unwound from a single command, and maximum
/// nesting of `sh -c` bodies and command substitutions.
pub const MAX_WRAPPER_DEPTH: usize = 8;

/// Shell interpreters whose `-c` body is analyzed as a nested command line.
const SHELLS: &[&str] = &[
    "sh", "bash", "zsh", "ksh", "dash", "fish", "csh", "tcsh", "mksh", "ash",
];

/// Reserved words that may prefix a command without changing what runs.
const SHELL_KEYWORDS: &[&str] = &[
    "!", "{", "}", "if", "then", "else", "elif", "do", "while", "until",
];

/// Option shapes for a wrapper command.
struct WrapperOptions {
    /// Short option letters that take a value.
    short_values: &'static str,
    /// Long options that take a value when not written as `--opt=value`.
    long_values: &'static [&'static str],
}

const SUDO_OPTIONS: WrapperOptions = WrapperOptions {
    short_values: "ugCDhprtTU",
    long_values: &[
        "--user",
        "--group",
        "--close-from",
        "--chdir",
        "--host",
        "--prompt",
        "--role",
        "--type",
        "--command-timeout",
        "--other-user",
    ],
};

const DOAS_OPTIONS: WrapperOptions = WrapperOptions {
    short_values: "uC",
    long_values: &[],
};

const ENV_OPTIONS: WrapperOptions = WrapperOptions {
    short_values: "uCPS",
    long_values: &["--unset", "--chdir", "--split-string"],
};

const NICE_OPTIONS: WrapperOptions = WrapperOptions {
    short_values: "n",
    long_values: &["--adjustment"],
};

const TIME_OPTIONS: WrapperOptions = WrapperOptions {
    short_values: "fo",
    long_values: &["--format", "--output"],
};

const TIMEOUT_OPTIONS: WrapperOptions = WrapperOptions {
    short_values: "sk",
    long_values: &["--signal", "--kill-after"],
};

const EXEC_OPTIONS: WrapperOptions = WrapperOptions {
    short_values: "a",
    long_values: &[],
};

const STDBUF_OPTIONS: WrapperOptions = WrapperOptions {
    short_values: "ioe",
    long_values: &["--input", "--output", "--error"],
};

const WATCH_OPTIONS: WrapperOptions = WrapperOptions {
    short_values: "nq",
    long_values: &["--interval", "--equexit"],
};

const FLAGS_ONLY: WrapperOptions = WrapperOptions {
    short_values: "",
    long_values: &[],
};

/// A command with its wrappers removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveCommand {
    /// The program as written (may be a path).
    pub program: String,
    /// Arguments after the program.
    pub args: Vec<String>,
    /// `NAME=value` assignments that prefixed the command or its wrappers.
    pub assignments: Vec<(String, String)>,
    /// Wrappers that were unwound, outermost first.
    pub wrappers: Vec<String>,
}

impl EffectiveCommand {
    /// Lowercased basename of the program (`/usr/bin/Git` -> `git`).
    pub fn name(&self) -> String {
        program_name(&self.program)
    }

    /// Value of a leading `NAME=value` assignment, last one wins.
    pub fn assignment(&self, name: &str) -> Option<&str> {
        self.assignments
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Outcome of unwinding a simple command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A concrete program invocation.
    Command(EffectiveCommand),
    /// A shell interpreter running an inline script (`bash -c '...'`), or
    /// `eval`/`watch` running their arguments joined with spaces.
    Shell {
        shell: String,
        script: String,
        assignments: Vec<(String, String)>,
    },
    /// Nothing runs (only assignments or a bare wrapper).
    Empty,
    /// Wrappers nested deeper than [`MAX_WRAPPER_DEPTH`].
    TooDeep,
}

/// Whether a (lowercased basename) program is a shell interpreter.
pub fn is_shell(name: &str) -> bool {
    SHELLS.contains(&name)
}

/// Lowercased basename of a program word.
pub fn program_name(program: &str) -> String {
    program
        .rsplit('/')
        .next()
        .unwrap_or(program)
        .to_ascii_lowercase()
}

/// Parse `NAME=value` where NAME is a valid shell identifier.
pub fn parse_assignment(word: &str) -> Option<(String, String)> {
    let (name, value) = word.split_once('=')?;
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((name.to_string(), value.to_string()))
}

/// Unwind wrappers from a simple command's words to find what actually runs.
pub fn resolve(words: &[String]) -> Resolution {
    let mut rest: Vec<String> = words.to_vec();
    let mut assignments = Vec::new();
    let mut wrappers = Vec::new();

    loop {
        let start = take_assignments(&rest, &mut assignments);
        rest.drain(..start);

        let Some(first) = rest.first() else {
            return Resolution::Empty;
        };
        let name = program_name(first);

        if wrappers.len() >= MAX_WRAPPER_DEPTH && is_wrapper(&name, &rest) {
            log::debug!("wrapper chain deeper than {MAX_WRAPPER_DEPTH}: {:?}", wrappers);
            return Resolution::TooDeep;
        }

        if SHELLS.contains(&name.as_str()) {
            return match shell_script(&rest[1..]) {
                Some(script) => Resolution::Shell {
                    shell: name,
                    script,
                    assignments,
                },
                None => Resolution::Command(effective(rest, assignments, wrappers)),
            };
        }

        if name == "eval" || name == "watch" {
            let skip = if name == "eval" {
                usize::from(rest.get(1).is_some_and(|w| w == "--")) + 1
            } else {
                skip_options(&rest, 1, &WATCH_OPTIONS)
            };
            if skip >= rest.len() {
                return Resolution::Empty;
            }
            return Resolution::Shell {
                script: rest[skip..].join(" "),
                shell: name,
                assignments,
            };
        }

        let skip = match name.as_str() {
            "sudo" => skip_options(&rest, 1, &SUDO_OPTIONS),
            "doas" => skip_options(&rest, 1, &DOAS_OPTIONS),
            "env" => {
                let (skip, split) = skip_env_options(&rest);
                if let Some(mut expanded) = split {
                    expanded.extend(rest[skip..].iter().cloned());
                    wrappers.push(name.clone());
                    rest = expanded;
                    continue;
                }
                skip
            }
            "command" => {
                if is_command_query(&rest) {
                    return Resolution::Command(effective(rest, assignments, wrappers));
                }
                skip_options(&rest, 1, &FLAGS_ONLY)
            }
            "builtin" | "nohup" | "busybox" | "setsid" => skip_options(&rest, 1, &FLAGS_ONLY),
            "exec" => skip_options(&rest, 1, &EXEC_OPTIONS),
            "stdbuf" => skip_options(&rest, 1, &STDBUF_OPTIONS),
            "nice" => skip_nice_options(&rest),
            "time" => skip_options(&rest, 1, &TIME_OPTIONS),
            "timeout" => {
                let after = skip_options(&rest, 1, &TIMEOUT_OPTIONS);
                // The duration comes before the command.
                (after + 1).min(rest.len())
            }
            k if SHELL_KEYWORDS.contains(&k) => 1,
            _ => return Resolution::Command(effective(rest, assignments, wrappers)),
        };

        log::trace!("unwrapping {name} ({skip} words)");
        wrappers.push(name);
        rest.drain(..skip.min(rest.len()));
    }
}

fn is_wrapper(name: &str, rest: &[String]) -> bool {
    matches!(
        name,
        "sudo"
            | "doas"
            | "env"
            | "builtin"
            | "nohup"
            | "busybox"
            | "nice"
            | "time"
            | "timeout"
            | "exec"
            | "setsid"
            | "stdbuf"
            | "eval"
            | "watch"
    ) || (name == "command" && !is_command_query(rest))
        || SHELL_KEYWORDS.contains(&name)
        || SHELLS.contains(&name)
}

fn effective(
    mut rest: Vec<String>,
    assignments: Vec<(String, String)>,
    wrappers: Vec<String>,
) -> EffectiveCommand {
    let program = rest.remove(0);
    EffectiveCommand {
        program,
        args: rest,
        assignments,
        wrappers,
    }
}

fn take_assignments(words: &[String], assignments: &mut Vec<(String, String)>) -> usize {
    let mut idx = 0;
    while let Some(pair) = words.get(idx).and_then(|w| parse_assignment(w)) {
        assignments.push(pair);
        idx += 1;
    }
    idx
}

fn is_option(word: &str) -> bool {
    word.len() > 1 && word.starts_with('-')
}

/// Whether an option word takes its value from the following word.
fn needs_separate_value(word: &str, spec: &WrapperOptions) -> bool {
    if word.starts_with("--") {
        return !word.contains('=') && spec.long_values.contains(&word);
    }
    match word.strip_prefix('-') {
        Some(cluster) => cluster
            .chars()
            .position(|c| spec.short_values.contains(c))
            .is_some_and(|pos| pos + 1 == cluster.chars().count()),
        None => false,
    }
}

fn option_width(word: &str, spec: &WrapperOptions) -> usize {
    if needs_separate_value(word, spec) { 2 } else { 1 }
}

/// Index of the first word after the wrapper's options (and an optional `--`).
fn skip_options(words: &[String], start: usize, spec: &WrapperOptions) -> usize {
    let mut idx = start;
    while let Some(word) = words.get(idx) {
        if word == "--" {
            return idx + 1;
        }
        if !is_option(word) {
            break;
        }
        idx += option_width(word, spec);
    }
    idx.min(words.len())
}

/// `env` options, returning the `-S` payload split into words if present.
fn skip_env_options(words: &[String]) -> (usize, Option<Vec<String>>) {
    let mut idx = 1;
    while let Some(word) = words.get(idx) {
        if word == "--" {
            return (idx + 1, None);
        }
        if let Some((value, consumed)) = env_split_string(words, idx) {
            let expanded = tokenize(&value)
                .into_iter()
                .filter_map(|t| match t {
                    Token::Word(w) => Some(w.text),
                    _ => None,
                })
                .collect();
            return ((idx + consumed).min(words.len()), Some(expanded));
        }
        if word == "-" {
            idx += 1;
            continue;
        }
        if !is_option(word) {
            break;
        }
        idx += option_width(word, &ENV_OPTIONS);
    }
    (idx.min(words.len()), None)
}

/// `-S string`, `-Sstring`, `-iS string`, `--split-string[=]string`.
fn env_split_string(words: &[String], idx: usize) -> Option<(String, usize)> {
    let word = &words[idx];
    if let Some(value) = word.strip_prefix("--split-string=") {
        return Some((value.to_string(), 1));
    }
    if word == "--split-string" {
        return words.get(idx + 1).map(|v| (v.clone(), 2));
    }
    if word.starts_with("--") {
        return None;
    }
    let cluster = word.strip_prefix('-')?;
    let pos = cluster.find('S')?;
    if cluster[..pos].chars().any(|c| "uCP".contains(c)) {
        return None;
    }
    let rest = &cluster[pos + 1..];
    if rest.is_empty() {
        words.get(idx + 1).map(|v| (v.clone(), 2))
    } else {
        Some((rest.to_string(), 1))
    }
}

/// `nice -n 5`, `nice -n5`, `nice -5`, `nice --adjustment=5`.
fn skip_nice_options(words: &[String]) -> usize {
    let mut idx = 1;
    while let Some(word) = words.get(idx) {
        if word == "--" {
            return idx + 1;
        }
        let numeric = word
            .strip_prefix('-')
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
        if numeric {
            idx += 1;
            continue;
        }
        if !word.starts_with('-') || word == "-" {
            break;
        }
        idx += option_width(word, &NICE_OPTIONS);
    }
    idx.min(words.len())
}

/// `command -v`/`-V` only looks a name up; it runs nothing.
fn is_command_query(words: &[String]) -> bool {
    words[1..]
        .iter()
        .take_while(|w| w.starts_with('-') && *w != "--")
        .any(|w| w.contains('v') || w.contains('V'))
}

/// Find the inline script of a shell invocation (`-c`, `-lc`, `-ec`, ...).
///
/// Returns None when the shell runs a script file or reads stdin.
fn shell_script(args: &[String]) -> Option<String> {
    let mut has_c = false;
    let mut idx = 0;
    while let Some(arg) = args.get(idx) {
        idx += 1;
        if arg == "--" || arg == "-" {
            break;
        }
        if arg.starts_with("--") {
            if matches!(arg.as_str(), "--rcfile" | "--init-file") {
                idx += 1;
            }
            continue;
        }
        if let Some(cluster) = arg.strip_prefix('-').or_else(|| arg.strip_prefix('+')) {
            if cluster.contains('c') {
                has_c = true;
            }
            if cluster.contains('o') || cluster.contains('O') {
                // `-o option` / `+O shopt` take the next word.
                idx += 1;
            }
            continue;
        }
        return has_c.then(|| arg.clone());
    }
    if has_c { args.get(idx).cloned() } else { None }
}
