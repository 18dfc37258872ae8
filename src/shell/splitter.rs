//! Split a token stream into simple commands on control operators.

use super::tokenizer::{Operator, Token, Word, tokenize};

/// One program invocation between control operators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleCommand {
    /// Argument words, program first. Redirection targets are not included.
    pub words: Vec<Word>,
    /// Redirection target words, kept for their substitutions.
    pub redirect_targets: Vec<Word>,
    /// The operator that preceded this command (None for the first one).
    pub preceded_by: Option<Operator>,
}

impl SimpleCommand {
    /// Word texts, program first.
    pub fn args(&self) -> Vec<String> {
        self.words.iter().map(|w| w.text.clone()).collect()
    }

    /// Bodies of every command substitution in this command, including
    /// those hidden in redirection targets.
    pub fn substitutions(&self) -> impl Iterator<Item = &str> {
        self.words
            .iter()
            .chain(self.redirect_targets.iter())
            .flat_map(|w| w.substitutions.iter().map(String::as_str))
    }

    /// Approximate source text, used when reporting which segment blocked.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| {
                if w.text.is_empty() || (w.quoted && w.text.chars().any(char::is_whitespace)) {
                    format!("'{}'", w.text)
                } else {
                    w.text.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An ordered sequence of simple commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    pub commands: Vec<SimpleCommand>,
}

impl CommandLine {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SimpleCommand> {
        self.commands.iter()
    }
}

impl<'a> IntoIterator for &'a CommandLine {
    type Item = &'a SimpleCommand;
    type IntoIter = std::slice::Iter<'a, SimpleCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

/// Cut a token stream into simple commands at control operators.
///
/// Empty commands (leading, trailing or doubled operators) are dropped. A
/// command with only redirections still survives when a redirection target
/// carries a substitution, so that substitution gets analyzed.
pub fn split_commands(tokens: Vec<Token>) -> CommandLine {
    let mut commands = Vec::new();
    let mut current = SimpleCommand::default();
    let mut pending_op: Option<Operator> = None;
    let mut expect_redirect_target = false;

    for token in tokens {
        match token {
            Token::Word(word) => {
                if expect_redirect_target {
                    current.redirect_targets.push(word);
                    expect_redirect_target = false;
                } else {
                    current.words.push(word);
                }
            }
            Token::Redirect(_) => expect_redirect_target = true,
            Token::Operator(op) => {
                expect_redirect_target = false;
                push_command(&mut commands, &mut current, &mut pending_op);
                pending_op = Some(op);
            }
        }
    }
    push_command(&mut commands, &mut current, &mut pending_op);

    CommandLine { commands }
}

fn push_command(
    commands: &mut Vec<SimpleCommand>,
    current: &mut SimpleCommand,
    pending_op: &mut Option<Operator>,
) {
    let has_substitution = current.substitutions().next().is_some();
    if current.words.is_empty() && !has_substitution {
        current.redirect_targets.clear();
        return;
    }
    let mut command = std::mem::take(current);
    command.preceded_by = if commands.is_empty() {
        None
    } else {
        pending_op.take()
    };
    commands.push(command);
}

/// Tokenize and split a command line in one step.
pub fn parse_command_line(input: &str) -> CommandLine {
    split_commands(tokenize(input))
}
