//! Error types shared by the parser, the game tree and the board.

use std::fmt;

use thiserror::Error;

use crate::node::NodeId;

/// The specific way an SGF document is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarFault {
    /// No `(` was found in the input.
    MissingGameTree,
    /// A `)` without a matching `(`, or input ended with open trees.
    UnbalancedParentheses,
    /// A `[` value was never closed.
    UnterminatedValue,
    /// A game tree contains no node.
    EmptyGameTree,
    /// A property identifier without any `[value]`.
    MissingPropertyValue,
    /// A character that cannot start any token at this point.
    UnexpectedCharacter(char),
    /// A `;` node following a closed variation in the same tree.
    NodeAfterVariation,
}

impl fmt::Display for GrammarFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarFault::MissingGameTree => write!(f, "no game tree found"),
            GrammarFault::UnbalancedParentheses => write!(f, "unbalanced parentheses"),
            GrammarFault::UnterminatedValue => write!(f, "property value missing closing ']'"),
            GrammarFault::EmptyGameTree => write!(f, "game tree without nodes"),
            GrammarFault::MissingPropertyValue => write!(f, "property without a value"),
            GrammarFault::UnexpectedCharacter(c) => write!(f, "unexpected character {c:?}"),
            GrammarFault::NodeAfterVariation => write!(f, "node after a variation"),
        }
    }
}

/// Errors raised by this crate.
#[derive(Debug, Error)]
pub enum SgfError {
    /// Malformed SGF syntax. Fatal for the whole parse.
    #[error("grammar error at byte {offset}: {fault}")]
    Grammar { offset: usize, fault: GrammarFault },

    /// A point string that cannot be decoded.
    #[error("invalid coordinate {value:?}: {reason}")]
    Coordinate { value: String, reason: &'static str },

    /// A board position outside the 19x19 grid.
    #[error("point ({x}, {y}) is off the board")]
    OutOfBounds { x: usize, y: usize },

    /// Asked for the opposite color of an empty point.
    #[error("empty has no opposite color")]
    OppositeOfEmpty,

    /// A variation identical to an existing one was added under the same parent.
    #[error("node {parent} already has an identical variation")]
    DuplicateBranch { parent: NodeId },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SgfError {
    pub(crate) fn grammar(offset: usize, fault: GrammarFault) -> Self {
        SgfError::Grammar { offset, fault }
    }

    pub(crate) fn coordinate(value: &str, reason: &'static str) -> Self {
        SgfError::Coordinate {
            value: value.to_string(),
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, SgfError>;
