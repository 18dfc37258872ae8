//! Table-driven option scanning.
//!
//! Each command family describes its options as a static list of [`OptSpec`]
//! entries. One scanner walks the arguments and splits them into options,
//! positionals and the words after `--`.

/// How an option takes its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// No value (`--quiet`, `-q`).
    Flag,
    /// Value only when glued: `--opt=value` or `-ovalue`.
    Attached,
    /// Glued value, or otherwise the next word.
    AttachedOrSeparate,
    /// Glued value, or the next word only when it is one of the choices.
    Choice(&'static [&'static str]),
}

/// One known option and its spellings.
#[derive(Debug, Clone, Copy)]
pub struct OptSpec {
    pub names: &'static [&'static str],
    pub arity: Arity,
}

impl OptSpec {
    pub const fn flag(names: &'static [&'static str]) -> Self {
        Self {
            names,
            arity: Arity::Flag,
        }
    }

    pub const fn value(names: &'static [&'static str]) -> Self {
        Self {
            names,
            arity: Arity::AttachedOrSeparate,
        }
    }

    pub const fn attached(names: &'static [&'static str]) -> Self {
        Self {
            names,
            arity: Arity::Attached,
        }
    }

    pub const fn choice(names: &'static [&'static str], choices: &'static [&'static str]) -> Self {
        Self {
            names,
            arity: Arity::Choice(choices),
        }
    }
}

/// What to do with a long option that is not in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownLong {
    /// Consume only the option itself.
    Alone,
    /// Also consume the next word when it does not start with `-`.
    MaybeValue,
}

/// An option occurrence, normalized to the spelling that was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOption {
    /// `--long` or `-s` (short clusters are split into letters).
    pub name: String,
    pub value: Option<String>,
}

/// Arguments split into options and positionals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    pub options: Vec<ParsedOption>,
    pub positionals: Vec<String>,
    /// Words after a bare `--`, if one was present.
    pub after_double_dash: Option<Vec<String>>,
}

impl ParsedArgs {
    /// Whether any of the given spellings was used.
    pub fn has(&self, names: &[&str]) -> bool {
        self.options.iter().any(|o| names.contains(&o.name.as_str()))
    }

    /// Value of the last occurrence of any of the given spellings.
    pub fn value_of(&self, names: &[&str]) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|o| names.contains(&o.name.as_str()))
            .and_then(|o| o.value.as_deref())
    }
}

/// One step of the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// One or more options (a short cluster yields several) and the number of
    /// words they consumed.
    Options(Vec<ParsedOption>, usize),
    /// A non-option word.
    Positional,
    /// A bare `--`.
    DoubleDash,
}

fn lookup<'t>(table: &'t [OptSpec], name: &str) -> Option<&'t OptSpec> {
    table.iter().find(|spec| spec.names.contains(&name))
}

/// Classify the word at `idx`. Unknown short options never take a value.
pub fn next_item(args: &[String], idx: usize, table: &[OptSpec], unknown: UnknownLong) -> Item {
    let word = args[idx].as_str();
    let next = args.get(idx + 1).map(String::as_str);

    if word == "--" {
        return Item::DoubleDash;
    }

    if let Some(long) = word.strip_prefix("--") {
        if let Some((name, value)) = long.split_once('=') {
            return Item::Options(vec![option(format!("--{name}"), Some(value))], 1);
        }
        let (value, consumed) = match lookup(table, word).map(|s| s.arity) {
            Some(arity) => separate_value(arity, next),
            None => match (unknown, next) {
                (UnknownLong::MaybeValue, Some(v)) if !v.starts_with('-') => (Some(v), 2),
                _ => (None, 1),
            },
        };
        return Item::Options(vec![option(word.to_string(), value)], consumed);
    }

    let Some(cluster) = word.strip_prefix('-').filter(|c| !c.is_empty()) else {
        return Item::Positional;
    };

    let mut options = Vec::new();
    let mut consumed = 1;
    for (pos, c) in cluster.char_indices() {
        let name = format!("-{c}");
        let arity = lookup(table, &name).map(|s| s.arity).unwrap_or(Arity::Flag);
        if arity == Arity::Flag {
            options.push(option(name, None));
            continue;
        }
        let glued = &cluster[pos + c.len_utf8()..];
        if !glued.is_empty() {
            options.push(option(name, Some(glued)));
        } else {
            let (value, used) = separate_value(arity, next);
            consumed = used;
            options.push(option(name, value));
        }
        break;
    }
    Item::Options(options, consumed)
}

fn option(name: String, value: Option<&str>) -> ParsedOption {
    ParsedOption {
        name,
        value: value.map(str::to_string),
    }
}

fn separate_value(arity: Arity, next: Option<&str>) -> (Option<&str>, usize) {
    match (arity, next) {
        (Arity::AttachedOrSeparate, Some(v)) => (Some(v), 2),
        (Arity::Choice(choices), Some(v)) if choices.contains(&v) => (Some(v), 2),
        _ => (None, 1),
    }
}

/// Scan all arguments. Options may appear after positionals.
pub fn scan_args(args: &[String], table: &[OptSpec], unknown: UnknownLong) -> ParsedArgs {
    let mut parsed = ParsedArgs::default();
    let mut idx = 0;
    while idx < args.len() {
        match next_item(args, idx, table, unknown) {
            Item::DoubleDash => {
                parsed.after_double_dash = Some(args[idx + 1..].to_vec());
                break;
            }
            Item::Positional => {
                parsed.positionals.push(args[idx].clone());
                idx += 1;
            }
            Item::Options(options, consumed) => {
                parsed.options.extend(options);
                idx += consumed;
            }
        }
    }
    parsed
}

/// Letters of every short-option cluster before `--` (`-nf -d` -> `n f d`).
pub fn short_flags(args: &[String]) -> Vec<char> {
    args.iter()
        .take_while(|a| *a != "--")
        .filter(|a| a.starts_with('-') && !a.starts_with("--"))
        .flat_map(|a| a.chars().skip(1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[OptSpec] = &[
        OptSpec::flag(&["-q", "--quiet"]),
        OptSpec::value(&["-b", "--branch"]),
        OptSpec::attached(&["--color"]),
        OptSpec::choice(&["-t", "--track"], &["direct", "inherit"]),
    ];

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_flags_and_positionals() {
        let parsed = scan_args(&args("-q main file"), TABLE, UnknownLong::Alone);
        assert!(parsed.has(&["--quiet", "-q"]));
        assert_eq!(parsed.positionals, vec!["main", "file"]);
        assert!(parsed.after_double_dash.is_none());
    }

    #[test]
    fn test_separate_and_glued_values() {
        let parsed = scan_args(&args("-b new main"), TABLE, UnknownLong::Alone);
        assert_eq!(parsed.value_of(&["-b"]), Some("new"));
        assert_eq!(parsed.positionals, vec!["main"]);

        let parsed = scan_args(&args("-bnew main"), TABLE, UnknownLong::Alone);
        assert_eq!(parsed.value_of(&["-b"]), Some("new"));
        assert_eq!(parsed.positionals, vec!["main"]);

        let parsed = scan_args(&args("--branch=new main"), TABLE, UnknownLong::Alone);
        assert_eq!(parsed.value_of(&["--branch"]), Some("new"));
        assert_eq!(parsed.positionals, vec!["main"]);
    }

    #[test]
    fn test_cluster_with_value_last() {
        let parsed = scan_args(&args("-qb new"), TABLE, UnknownLong::Alone);
        assert!(parsed.has(&["-q"]));
        assert_eq!(parsed.value_of(&["-b"]), Some("new"));
        assert!(parsed.positionals.is_empty());
    }

    #[test]
    fn test_attached_never_takes_next() {
        let parsed = scan_args(&args("--color main"), TABLE, UnknownLong::MaybeValue);
        assert!(parsed.has(&["--color"]));
        assert_eq!(parsed.positionals, vec!["main"]);
    }

    #[test]
    fn test_choice_only_consumes_known_value() {
        let parsed = scan_args(&args("--track direct main"), TABLE, UnknownLong::Alone);
        assert_eq!(parsed.positionals, vec!["main"]);

        let parsed = scan_args(&args("--track main file"), TABLE, UnknownLong::Alone);
        assert_eq!(parsed.positionals, vec!["main", "file"]);
    }

    #[test]
    fn test_unknown_long_alone() {
        let parsed = scan_args(&args("--unknown main"), TABLE, UnknownLong::Alone);
        assert_eq!(parsed.positionals, vec!["main"]);
    }

    #[test]
    fn test_unknown_long_maybe_value() {
        let parsed = scan_args(&args("--unknown main file"), TABLE, UnknownLong::MaybeValue);
        assert_eq!(parsed.value_of(&["--unknown"]), Some("main"));
        assert_eq!(parsed.positionals, vec!["file"]);

        let parsed = scan_args(&args("--unknown -q main"), TABLE, UnknownLong::MaybeValue);
        assert!(parsed.has(&["-q"]));
        assert_eq!(parsed.positionals, vec!["main"]);
    }

    #[test]
    fn test_unknown_short_is_flag() {
        let parsed = scan_args(&args("-x main"), TABLE, UnknownLong::MaybeValue);
        assert!(parsed.has(&["-x"]));
        assert_eq!(parsed.positionals, vec!["main"]);
    }

    #[test]
    fn test_double_dash() {
        let parsed = scan_args(&args("main -- -f file"), TABLE, UnknownLong::Alone);
        assert_eq!(parsed.positionals, vec!["main"]);
        assert_eq!(
            parsed.after_double_dash,
            Some(vec!["-f".to_string(), "file".to_string()])
        );
        assert!(!parsed.has(&["-f"]));
    }

    #[test]
    fn test_lone_dash_is_positional() {
        let parsed = scan_args(&args("-"), TABLE, UnknownLong::Alone);
        assert_eq!(parsed.positionals, vec!["-"]);
    }

    #[test]
    fn test_short_flags() {
        assert_eq!(short_flags(&args("-nf -d x -- -q")), vec!['n', 'f', 'd']);
        assert!(short_flags(&args("--force")).is_empty());
    }
}
