use super::Rule;
use pest::iterators::Pair;
use thiserror::Error;

/// Errors produced while turning source text into trees.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),

    #[error("line {line}: {message}")]
    InvalidInput { message: String, line: usize },

    #[error("line {line}: invalid literal {text}: {message}")]
    InvalidLiteral {
        text: String,
        message: String,
        line: usize,
    },
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(e: pest::error::Error<Rule>) -> Self {
        ParseError::Syntax(Box::new(e))
    }
}

pub(super) fn pair_line(pair: &Pair<Rule>) -> usize {
    pair.as_span().start_pos().line_col().0
}

pub(super) fn invalid_input_error(message: &str, pair: &Pair<Rule>) -> ParseError {
    ParseError::InvalidInput {
        message: message.to_string(),
        line: pair_line(pair),
    }
}

pub(super) fn invalid_literal_error(message: &str, pair: &Pair<Rule>) -> ParseError {
    ParseError::InvalidLiteral {
        text: pair.as_str().to_string(),
        message: message.to_string(),
        line: pair_line(pair),
    }
}
