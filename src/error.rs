//! Error types surfaced by the search engine.

use thiserror::Error;

/// Errors returned by [`crate::mcts::Mcts`] and the position helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// A search was requested on a position with no legal moves.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A move that is not legal from the current root was applied.
    #[error("invalid move: {0}")]
    InvalidMove(String),

    /// A FEN string could not be parsed or describes an impossible setup.
    #[error("invalid FEN: {0}")]
    Fen(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;
