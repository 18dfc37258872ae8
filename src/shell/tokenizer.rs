//! Shell-style tokenization (shlex-like, never expands anything).

use std::iter::Peekable;
use std::str::Chars;

/// Shell control operators that separate simple commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `&&` - run next if previous succeeds
    And,
    /// `||` - run next if previous fails
    Or,
    /// `|` - pipe stdout to next command
    Pipe,
    /// `|&` - pipe stdout and stderr to next command
    PipeAll,
    /// `;` - run sequentially
    Semicolon,
    /// `&` - run in background
    Background,
    /// An unquoted newline
    Newline,
    /// `(` or `)` - subshell grouping
    Group,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Pipe => "|",
            Operator::PipeAll => "|&",
            Operator::Semicolon => ";",
            Operator::Background => "&",
            Operator::Newline => "\\n",
            Operator::Group => "( )",
        }
    }
}

/// A single shell word after quote removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Word {
    /// The word text with quotes removed. `$VAR`, `${VAR}`, `$(...)` and
    /// backtick substitutions are kept as literal text.
    pub text: String,
    /// Whether any part of the word was quoted.
    pub quoted: bool,
    /// Bodies of `$(...)`, `<(...)`, `>(...)` and backtick substitutions found
    /// outside single quotes.
    pub substitutions: Vec<String>,
}

impl Word {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// A token from shell parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A regular word/argument.
    Word(Word),
    /// A control operator.
    Operator(Operator),
    /// A redirection operator (>, >>, <, 2>&1, etc.).
    Redirect(String),
}

#[derive(Default)]
struct WordBuilder {
    word: Word,
    started: bool,
}

impl WordBuilder {
    fn push(&mut self, c: char) {
        self.word.text.push(c);
        self.started = true;
    }

    fn push_str(&mut self, s: &str) {
        self.word.text.push_str(s);
        self.started = true;
    }

    fn mark_quoted(&mut self) {
        self.word.quoted = true;
        self.started = true;
    }

    fn is_fd_number(&self) -> bool {
        !self.word.quoted
            && !self.word.text.is_empty()
            && self.word.text.chars().all(|c| c.is_ascii_digit())
    }

    fn flush(&mut self, tokens: &mut Vec<Token>) {
        if self.started {
            tokens.push(Token::Word(std::mem::take(&mut self.word)));
            self.started = false;
        }
    }
}

/// Tokens of a command line, plus whether it ended inside a quote or
/// substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    pub tokens: Vec<Token>,
    pub unterminated: bool,
}

/// Tokenize a shell command line into words and operators.
///
/// Never fails: an unterminated quote or substitution turns the rest of the
/// input into the final word.
pub fn tokenize(input: &str) -> Vec<Token> {
    scan(input).tokens
}

/// Whether the input ends inside an open quote or substitution.
pub fn is_unterminated(input: &str) -> bool {
    scan(input).unterminated
}

/// [`tokenize`], also reporting unterminated input.
pub fn scan(input: &str) -> Scan {
    let mut tokens = Vec::new();
    let mut current = WordBuilder::default();
    let mut chars = input.chars().peekable();
    let mut unterminated = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\n') => {}
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            '\'' => {
                current.mark_quoted();
                let (body, closed) = read_until(&mut chars, '\'');
                unterminated |= !closed;
                current.push_str(&body);
            }
            '"' => {
                current.mark_quoted();
                unterminated |= !read_double_quoted(&mut chars, &mut current);
            }
            '$' if chars.peek() == Some(&'\'') => {
                // ANSI-C quoting: $'--hard' is the word --hard.
                chars.next();
                current.mark_quoted();
                let (body, closed) = read_ansi_c(&mut chars);
                unterminated |= !closed;
                current.push_str(&body);
            }
            '$' if chars.peek() == Some(&'"') => {
                // Locale translation quoting reads like plain double quotes.
                chars.next();
                current.mark_quoted();
                unterminated |= !read_double_quoted(&mut chars, &mut current);
            }
            '`' => {
                let (body, closed) = read_backtick(&mut chars);
                unterminated |= !closed;
                current.push('`');
                current.push_str(&body);
                if closed {
                    current.push('`');
                }
                current.word.substitutions.push(body);
            }
            '$' if chars.peek() == Some(&'(') => {
                chars.next();
                let (body, closed) = read_balanced(&mut chars);
                unterminated |= !closed;
                current.push_str("$(");
                current.push_str(&body);
                if closed {
                    current.push(')');
                }
                current.word.substitutions.push(body);
            }
            '#' if !current.started => {
                // Comment runs to end of line; the newline itself still separates.
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '\n' => {
                current.flush(&mut tokens);
                tokens.push(Token::Operator(Operator::Newline));
            }
            c if c.is_whitespace() => current.flush(&mut tokens),
            ';' => {
                current.flush(&mut tokens);
                if chars.peek() == Some(&';') {
                    chars.next();
                }
                tokens.push(Token::Operator(Operator::Semicolon));
            }
            '&' => {
                current.flush(&mut tokens);
                match chars.peek() {
                    Some('&') => {
                        chars.next();
                        tokens.push(Token::Operator(Operator::And));
                    }
                    Some('>') => {
                        chars.next();
                        let mut redir = String::from("&>");
                        if chars.peek() == Some(&'>') {
                            chars.next();
                            redir.push('>');
                        }
                        tokens.push(Token::Redirect(redir));
                    }
                    _ => tokens.push(Token::Operator(Operator::Background)),
                }
            }
            '|' => {
                current.flush(&mut tokens);
                match chars.peek() {
                    Some('|') => {
                        chars.next();
                        tokens.push(Token::Operator(Operator::Or));
                    }
                    Some('&') => {
                        chars.next();
                        tokens.push(Token::Operator(Operator::PipeAll));
                    }
                    _ => tokens.push(Token::Operator(Operator::Pipe)),
                }
            }
            '<' | '>' if chars.peek() == Some(&'(') => {
                // Process substitution behaves like a word holding a command.
                chars.next();
                let (body, closed) = read_balanced(&mut chars);
                unterminated |= !closed;
                current.push(c);
                current.push('(');
                current.push_str(&body);
                if closed {
                    current.push(')');
                }
                current.word.substitutions.push(body);
            }
            '<' | '>' => {
                let mut redir = String::new();
                if current.is_fd_number() {
                    redir = std::mem::take(&mut current.word.text);
                    current.started = false;
                } else {
                    current.flush(&mut tokens);
                }
                redir.push(c);
                read_redirect_tail(c, &mut chars, &mut redir);
                tokens.push(Token::Redirect(redir));
            }
            '(' | ')' => {
                current.flush(&mut tokens);
                tokens.push(Token::Operator(Operator::Group));
            }
            _ => current.push(c),
        }
    }

    current.flush(&mut tokens);
    log::trace!("tokenized {:?} into {} tokens", input, tokens.len());
    Scan {
        tokens,
        unterminated,
    }
}

fn read_redirect_tail(first: char, chars: &mut Peekable<Chars<'_>>, redir: &mut String) {
    match (first, chars.peek().copied()) {
        ('>', Some(next @ ('>' | '&' | '|'))) => {
            chars.next();
            redir.push(next);
        }
        ('<', Some('<')) => {
            chars.next();
            redir.push('<');
            if let Some(&next @ ('<' | '-')) = chars.peek() {
                chars.next();
                redir.push(next);
            }
        }
        ('<', Some(next @ ('&' | '>'))) => {
            chars.next();
            redir.push(next);
        }
        _ => {}
    }
}

/// Read up to (and consume) `end`. Returns the body and whether `end` was seen.
fn read_until(chars: &mut Peekable<Chars<'_>>, end: char) -> (String, bool) {
    let mut body = String::new();
    for c in chars.by_ref() {
        if c == end {
            return (body, true);
        }
        body.push(c);
    }
    (body, false)
}

/// Read a double-quoted body into `current`. Returns whether the closing
/// quote was seen.
fn read_double_quoted(chars: &mut Peekable<Chars<'_>>, current: &mut WordBuilder) -> bool {
    while let Some(c) = chars.next() {
        match c {
            '"' => return true,
            '\\' => match chars.peek().copied() {
                Some(next @ ('"' | '\\' | '$' | '`')) => {
                    chars.next();
                    current.push(next);
                }
                Some('\n') => {
                    chars.next();
                }
                _ => current.push('\\'),
            },
            '`' => {
                let (body, closed) = read_backtick(chars);
                current.push('`');
                current.push_str(&body);
                if closed {
                    current.push('`');
                }
                current.word.substitutions.push(body);
            }
            '$' if chars.peek() == Some(&'(') => {
                chars.next();
                let (body, closed) = read_balanced(chars);
                current.push_str("$(");
                current.push_str(&body);
                if closed {
                    current.push(')');
                }
                current.word.substitutions.push(body);
            }
            _ => current.push(c),
        }
    }
    false
}

/// Decode the body of `$'...'` after the opening quote.
fn read_ansi_c(chars: &mut Peekable<Chars<'_>>) -> (String, bool) {
    let mut body = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\'' => return (body, true),
            '\\' => match chars.next() {
                Some('n') => body.push('\n'),
                Some('t') => body.push('\t'),
                Some('r') => body.push('\r'),
                Some('a') => body.push('\u{07}'),
                Some('b') => body.push('\u{08}'),
                Some('e' | 'E') => body.push('\u{1b}'),
                Some('f') => body.push('\u{0c}'),
                Some('v') => body.push('\u{0b}'),
                Some(quoted @ ('\\' | '\'' | '"' | '?')) => body.push(quoted),
                Some('x') => push_code(&mut body, read_digits(chars, 16, 2)),
                Some('u') => push_code(&mut body, read_digits(chars, 16, 4)),
                Some('U') => push_code(&mut body, read_digits(chars, 16, 8)),
                Some(first @ '0'..='7') => {
                    let rest = read_digits(chars, 8, 2);
                    let value = first.to_digit(8).unwrap_or(0);
                    let code = match rest {
                        Some((digits, n)) => value * 8u32.pow(n) + digits,
                        None => value,
                    };
                    push_code(&mut body, Some((code, 1)));
                }
                Some(other) => {
                    body.push('\\');
                    body.push(other);
                }
                None => body.push('\\'),
            },
            _ => body.push(c),
        }
    }
    (body, false)
}

/// Up to `max` digits in `radix`. Returns the value and the digit count.
fn read_digits(chars: &mut Peekable<Chars<'_>>, radix: u32, max: u32) -> Option<(u32, u32)> {
    let mut value = 0u32;
    let mut count = 0;
    while count < max {
        let Some(digit) = chars.peek().and_then(|c| c.to_digit(radix)) else {
            break;
        };
        chars.next();
        value = value.saturating_mul(radix).saturating_add(digit);
        count += 1;
    }
    (count > 0).then_some((value, count))
}

fn push_code(body: &mut String, code: Option<(u32, u32)>) {
    if let Some(c) = code.and_then(|(value, _)| char::from_u32(value)) {
        body.push(c);
    }
}

fn read_backtick(chars: &mut Peekable<Chars<'_>>) -> (String, bool) {
    let mut body = String::new();
    while let Some(c) = chars.next() {
        match c {
            '`' => return (body, true),
            '\\' => {
                if let Some(next) = chars.next() {
                    if !matches!(next, '`' | '\\' | '$') {
                        body.push('\\');
                    }
                    body.push(next);
                }
            }
            _ => body.push(c),
        }
    }
    (body, false)
}

/// Read the body of `$( ... )` after the opening paren, tracking nesting and
/// quotes so that a `)` inside a string does not close it.
fn read_balanced(chars: &mut Peekable<Chars<'_>>) -> (String, bool) {
    let mut body = String::new();
    let mut depth = 1usize;
    let mut in_single = false;
    let mut in_double = false;

    while let Some(c) = chars.next() {
        if in_single {
            if c == '\'' {
                in_single = false;
            }
            body.push(c);
            continue;
        }
        match c {
            '\\' => {
                body.push(c);
                if let Some(next) = chars.next() {
                    body.push(next);
                }
                continue;
            }
            '\'' if !in_double => in_single = true,
            '"' => in_double = !in_double,
            '(' if !in_double => depth += 1,
            ')' if !in_double => {
                depth -= 1;
                if depth == 0 {
                    return (body, true);
                }
            }
            _ => {}
        }
        body.push(c);
    }
    (body, false)
}

/// Get the word texts, ignoring operators and redirections.
pub fn words(tokens: &[Token]) -> Vec<&str> {
    tokens
        .iter()
        .filter_map(|t| match t {
            Token::Word(w) => Some(w.as_str()),
            _ => None,
        })
        .collect()
}

/// Rebuild a command line from separate words, single-quoting any word the
/// shell would otherwise split or expand.
pub fn join_quoted(words: &[String]) -> String {
    words
        .iter()
        .map(|w| {
            let plain = !w.is_empty()
                && w.chars()
                    .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%^".contains(c));
            if plain {
                w.clone()
            } else {
                format!("'{}'", w.replace('\'', r"'\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
