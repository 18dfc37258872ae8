//! Shell command parsing.

pub mod options;
mod splitter;
mod tokenizer;
mod wrappers;

pub use splitter::{CommandLine, SimpleCommand, parse_command_line, split_commands};
pub use tokenizer::{
    Operator, Scan, Token, Word, is_unterminated, join_quoted, scan, tokenize, words,
};
pub use wrappers::{
    EffectiveCommand, MAX_WRAPPER_DEPTH, Resolution, is_shell, parse_assignment, program_name,
    resolve,
};
