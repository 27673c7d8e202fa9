//! Shallow tactical signals: how many captures the side to move has, and
//! whether a move leaves the moved piece where it can be taken.
//!
//! No recapture analysis is done. Both feed the rollout policy: under
//! ordinary rules it prefers captures, under compulsory-capture rules it
//! prefers moves that hand the opponent a capture.

use shakmaty::{Bitboard, Move, Position};

use crate::position::{Game, Rules};

/// Count the legal moves of the side to move that capture an opponent piece,
/// en passant included. Zero when there are no captures or no legal moves.
pub fn count_threats<P: Rules>(game: &Game<P>) -> usize {
    game.legal_moves().iter().filter(|m| m.is_capture()).count()
}

/// The legal capturing moves of the side to move, in generation order.
pub fn capture_moves<P: Rules>(game: &Game<P>) -> Vec<Move> {
    game.legal_moves()
        .into_iter()
        .filter(Move::is_capture)
        .collect()
}

/// True when the piece moved by `mv` can be captured on its destination
/// square right after the move. Castling never counts, and discovered
/// attacks on other pieces are ignored.
pub fn is_en_prise<P: Rules>(game: &Game<P>, mv: &Move) -> bool {
    let Some(from) = mv.from() else {
        return false;
    };
    if mv.is_castle() {
        return false;
    }
    let board = game.position().board();
    let to = mv.to();
    let occupied = (board.occupied() ^ Bitboard::from(from)) | Bitboard::from(to);
    !board.attacks_to(to, !game.turn(), occupied).is_empty()
}
