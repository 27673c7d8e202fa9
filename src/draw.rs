//! Terminal and draw detection.
//!
//! The board-level outcome (checkmate, stalemate, insufficient material,
//! variant endings) comes from the rules engine. Repetition and the
//! no-progress rule depend on game history and are checked here.

use shakmaty::Outcome;

use crate::constants::{NO_PROGRESS_PLIES, REPETITION_COUNT};
use crate::position::{Game, Rules};

/// Returns true if the game is drawn: stalemate, insufficient material,
/// repetition, or the no-progress rule.
///
/// A decisive result always wins over a draw rule, so a checkmated position
/// is never reported as a draw even when the halfmove clock has run out.
pub fn is_draw<P: Rules>(game: &Game<P>) -> bool {
    matches!(terminal_outcome(game), Some(Outcome::Draw))
}

/// Outcome of a finished game, or `None` while it is still in progress.
pub fn terminal_outcome<P: Rules>(game: &Game<P>) -> Option<Outcome> {
    match game.board_outcome() {
        Some(outcome) => Some(outcome),
        None if is_history_draw(game) => Some(Outcome::Draw),
        None => None,
    }
}

fn is_history_draw<P: Rules>(game: &Game<P>) -> bool {
    game.repetitions() >= REPETITION_COUNT || game.halfmoves() >= NO_PROGRESS_PLIES
}
