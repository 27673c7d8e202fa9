//! Game positions and move execution.
//!
//! This module adapts the `shakmaty` rules engine to what the search needs:
//! - [`Game`], an owned position that also remembers the Zobrist keys of the
//!   positions since the last irreversible move, so repetitions can be counted
//! - FEN construction for any supported rule set
//! - UCI rendering and lookup of moves
//!
//! Board representation, move generation, and check/checkmate/stalemate
//! detection all come from `shakmaty`. [`Rules`] is implemented for
//! `shakmaty::Chess` (standard chess) and `shakmaty::variant::Antichess`
//! (giveaway chess, where captures are compulsory).

use shakmaty::fen::Fen;
use shakmaty::variant::Antichess;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, File, FromSetup, Move, MoveList, Outcome, Position,
    Square,
};

use crate::error::{Result, SearchError};

/// The rules-engine capabilities the search relies on.
pub trait Rules: Position + FromSetup + ZobristHash + Clone {
    /// Whether a capture, when one is available, must be played.
    const COMPULSORY_CAPTURES: bool = false;
}

impl Rules for Chess {}

impl Rules for Antichess {
    const COMPULSORY_CAPTURES: bool = true;
}

/// A position together with its repetition history.
///
/// Values are independent: [`Game::play`] returns a new game and leaves the
/// original untouched, so tree nodes never share a position.
#[derive(Debug, Clone)]
pub struct Game<P> {
    pos: P,
    /// Keys of every position since the last capture or pawn move,
    /// including the current one.
    history: Vec<Zobrist64>,
}

impl<P: Rules + Default> Default for Game<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<P: Rules> Game<P> {
    /// Wrap a position with a fresh repetition history.
    pub fn new(pos: P) -> Self {
        let key = zobrist(&pos);
        Self {
            pos,
            history: vec![key],
        }
    }

    /// Parse a FEN string. Missing trailing fields (clocks, en passant,
    /// castling) take their usual defaults.
    ///
    /// # Errors
    /// Returns [`SearchError::Fen`] if the text is malformed or the setup is
    /// not a legal position under the rule set `P`.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| SearchError::Fen(format!("{fen}: {e}")))?;
        let pos = parsed
            .into_position::<P>(CastlingMode::Standard)
            .map_err(|e| SearchError::Fen(format!("{fen}: {e}")))?;
        Ok(Self::new(pos))
    }

    /// The underlying rules-engine position.
    #[inline]
    pub fn position(&self) -> &P {
        &self.pos
    }

    /// Side to move.
    #[inline]
    pub fn turn(&self) -> Color {
        self.pos.turn()
    }

    pub fn legal_moves(&self) -> MoveList {
        self.pos.legal_moves()
    }

    /// True if `m` is among the legal moves, compulsory captures included.
    pub fn is_legal(&self, m: &Move) -> bool {
        self.legal_moves().contains(m)
    }

    /// Play a move and return the resulting game.
    ///
    /// # Errors
    /// Returns [`SearchError::InvalidMove`] if `m` is not legal here.
    pub fn play(&self, m: &Move) -> Result<Self> {
        if !self.is_legal(m) {
            return Err(SearchError::InvalidMove(uci(m)));
        }
        let mut next = self.clone();
        next.play_unchecked(m);
        Ok(next)
    }

    /// Play a move in place. The caller guarantees that `m` is legal.
    pub fn play_unchecked(&mut self, m: &Move) {
        self.pos.play_unchecked(m);
        if self.pos.halfmoves() == 0 {
            // Captures and pawn moves can never be undone
            self.history.clear();
        }
        self.history.push(zobrist(&self.pos));
    }

    /// Halfmoves since the last capture or pawn move.
    #[inline]
    pub fn halfmoves(&self) -> u32 {
        self.pos.halfmoves()
    }

    /// How many times the current position has occurred, counting itself.
    pub fn repetitions(&self) -> usize {
        match self.history.last() {
            Some(current) => self.history.iter().filter(|&key| key == current).count(),
            None => 0,
        }
    }

    pub fn is_check(&self) -> bool {
        self.pos.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.pos.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.pos.is_stalemate()
    }

    pub fn is_insufficient_material(&self) -> bool {
        self.pos.is_insufficient_material()
    }

    /// Outcome according to the board alone: checkmate, stalemate,
    /// insufficient material, or a variant-specific ending. Repetition and
    /// the no-progress rule are handled in [`crate::draw`].
    pub fn board_outcome(&self) -> Option<Outcome> {
        self.pos.outcome()
    }

    /// Find the legal move from `from` to `to`. When several promotions
    /// match, the first generated one is returned.
    pub fn find_move(&self, from: Square, to: Square) -> Option<Move> {
        self.legal_moves()
            .into_iter()
            .find(|m| m.from() == Some(from) && m.to() == to)
    }

    /// Look up a legal move by its UCI text, e.g. `b2a4` or `e7e8q`.
    ///
    /// # Errors
    /// Returns [`SearchError::InvalidMove`] if no legal move matches.
    pub fn parse_uci(&self, text: &str) -> Result<Move> {
        let text = text.trim().to_ascii_lowercase();
        self.legal_moves()
            .into_iter()
            .find(|m| uci(m) == text)
            .ok_or(SearchError::InvalidMove(text))
    }
}

fn zobrist<P: Rules>(pos: &P) -> Zobrist64 {
    pos.zobrist_hash(EnPassantMode::Legal)
}

/// Render a move in UCI notation. Castling is written as the king's
/// two-square move (`e1g1`), promotions with a trailing role (`e7e8q`).
pub fn uci(m: &Move) -> String {
    match *m {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() {
                File::G
            } else {
                File::C
            };
            format!("{}{}", king, Square::from_coords(file, king.rank()))
        }
        _ => {
            let mut s = match m.from() {
                Some(from) => format!("{}{}", from, m.to()),
                None => m.to().to_string(),
            };
            if let Some(role) = m.promotion() {
                s.push(role.char());
            }
            s
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Chess;
    use shakmaty::variant::Antichess;

    #[test]
    fn test_from_fen_rejects_garbage() {
        let err = Game::<Chess>::from_fen("not a fen").unwrap_err();
        assert!(matches!(err, SearchError::Fen(_)));
    }

    #[test]
    fn test_kingless_position_needs_antichess() {
        let fen = "8/8/8/8/8/8/1N6/r7 w - -";
        assert!(Game::<Chess>::from_fen(fen).is_err());
        assert!(Game::<Antichess>::from_fen(fen).is_ok());
    }

    #[test]
    fn test_play_leaves_original_untouched() {
        let game = Game::<Chess>::default();
        let mv = game.parse_uci("e2e4").unwrap();
        let next = game.play(&mv).unwrap();

        assert_eq!(game.turn(), Color::White);
        assert_eq!(next.turn(), Color::Black);
        assert_eq!(game.legal_moves().len(), 20);
    }

    #[test]
    fn test_play_rejects_illegal_move() {
        let game = Game::<Chess>::default();
        let mv = game.parse_uci("e2e4").unwrap();
        let next = game.play(&mv).unwrap();

        // White's move again from black's turn
        assert!(matches!(next.play(&mv), Err(SearchError::InvalidMove(_))));
    }

    #[test]
    fn test_uci_rendering() {
        let game = Game::<Chess>::from_fen("r3k3/1P6/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        assert!(game.parse_uci("e1g1").is_ok(), "castling renders as king move");
        assert!(game.parse_uci("b7b8q").is_ok());
        assert!(game.parse_uci("b7a8n").is_ok());
        assert!(game.parse_uci("e1e3").is_err());
    }

    #[test]
    fn test_find_move() {
        let game = Game::<Chess>::default();
        let mv = game.find_move(Square::G1, Square::F3).unwrap();
        assert_eq!(uci(&mv), "g1f3");
        assert!(game.find_move(Square::G1, Square::G3).is_none());
    }

    #[test]
    fn test_repetitions_counted_through_knight_shuffle() {
        let mut game = Game::<Chess>::default();
        assert_eq!(game.repetitions(), 1);

        for _ in 0..2 {
            for text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
                let mv = game.parse_uci(text).unwrap();
                game.play_unchecked(&mv);
            }
        }
        assert_eq!(game.repetitions(), 3);
    }

    #[test]
    fn test_irreversible_move_clears_history() {
        let mut game = Game::<Chess>::default();
        for text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            let mv = game.parse_uci(text).unwrap();
            game.play_unchecked(&mv);
        }
        assert_eq!(game.repetitions(), 2);

        let mv = game.parse_uci("e2e4").unwrap();
        game.play_unchecked(&mv);
        assert_eq!(game.repetitions(), 1);
        assert_eq!(game.halfmoves(), 0);
    }
}
