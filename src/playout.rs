//! Monte Carlo playouts (random game simulation).
//!
//! A playout plays random legal moves until the game ends or the ply cap is
//! reached, then scores the result. Moves are not uniform: with probability
//! `capture_bias` the move is drawn from the forcing moves, if there are any.
//! Under ordinary rules the forcing moves are the captures. Under
//! compulsory-capture rules every capture is already forced, so the forcing
//! moves are the ones that leave the moved piece en prise and oblige the
//! opponent to take it.

use fastrand::Rng;
use shakmaty::{Move, Outcome};

use crate::constants::{REWARD_DRAW, REWARD_LOSS, REWARD_WIN};
use crate::draw::terminal_outcome;
use crate::position::{Game, Rules};
use crate::threats::is_en_prise;

/// Perform a Monte Carlo playout from the given game.
///
/// Returns a score from the perspective of the player to move at the start:
/// +1 for a win, -1 for a loss, 0 for a draw or when `max_plies` runs out.
///
/// Returns `None` when the rules engine reports a position that has no legal
/// moves but is not terminal. Such a playout carries no usable result.
pub fn mcplayout<P: Rules>(
    start: &Game<P>,
    rng: &mut Rng,
    max_plies: usize,
    capture_bias: f64,
) -> Option<f64> {
    let player = start.turn();
    let mut game = start.clone();

    for _ in 0..max_plies {
        if let Some(outcome) = terminal_outcome(&game) {
            return Some(score(outcome, player));
        }
        let mv = choose_playout_move(&game, rng, capture_bias)?;
        game.play_unchecked(&mv);
    }

    Some(terminal_outcome(&game).map_or(REWARD_DRAW, |outcome| score(outcome, player)))
}

/// Choose the next playout move, preferring forcing moves.
fn choose_playout_move<P: Rules>(
    game: &Game<P>,
    rng: &mut Rng,
    capture_bias: f64,
) -> Option<Move> {
    let moves = game.legal_moves();
    if moves.is_empty() {
        return None;
    }

    if capture_bias > 0.0 && rng.f64() < capture_bias {
        let forcing: Vec<&Move> = if P::COMPULSORY_CAPTURES {
            moves.iter().filter(|m| is_en_prise(game, m)).collect()
        } else {
            moves.iter().filter(|m| m.is_capture()).collect()
        };
        if !forcing.is_empty() {
            return Some(forcing[rng.usize(..forcing.len())].clone());
        }
    }

    Some(moves[rng.usize(..moves.len())].clone())
}

/// Score a finished game for `player`.
pub fn score(outcome: Outcome, player: shakmaty::Color) -> f64 {
    match outcome {
        Outcome::Decisive { winner } if winner == player => REWARD_WIN,
        Outcome::Decisive { .. } => REWARD_LOSS,
        Outcome::Draw => REWARD_DRAW,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::variant::Antichess;
    use shakmaty::{Chess, Color};

    #[test]
    fn test_score_perspective() {
        let white_wins = Outcome::Decisive {
            winner: Color::White,
        };
        assert_eq!(score(white_wins, Color::White), 1.0);
        assert_eq!(score(white_wins, Color::Black), -1.0);
        assert_eq!(score(Outcome::Draw, Color::Black), 0.0);
    }

    #[test]
    fn test_playout_from_checkmate() {
        // Black to move and mated: a loss for the player to move
        let game = Game::<Chess>::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 1 1").unwrap();
        let mut rng = Rng::with_seed(1);
        assert_eq!(mcplayout(&game, &mut rng, 200, 0.8), Some(-1.0));
    }

    #[test]
    fn test_forced_capture_playout_is_deterministic_win() {
        // After b2a4 black must take, leaving white without pieces
        let game = Game::<Antichess>::from_fen("8/8/8/8/N7/8/8/r7 b - -").unwrap();
        let mut rng = Rng::with_seed(7);
        for _ in 0..20 {
            assert_eq!(mcplayout(&game, &mut rng, 200, 0.8), Some(-1.0));
        }
    }

    #[test]
    fn test_zero_ply_cap_scores_draw() {
        let game = Game::<Chess>::default();
        let mut rng = Rng::with_seed(3);
        assert_eq!(mcplayout(&game, &mut rng, 0, 0.8), Some(0.0));
    }

    #[test]
    fn test_playout_does_not_mutate_start() {
        let game = Game::<Chess>::default();
        let mut rng = Rng::with_seed(11);
        let result = mcplayout(&game, &mut rng, 50, 0.5).unwrap();
        assert!((-1.0..=1.0).contains(&result));
        assert_eq!(game.legal_moves().len(), 20);
        assert_eq!(game.halfmoves(), 0);
    }

    #[test]
    fn test_compulsory_capture_policy_offers_material() {
        // Qg6 is the only move the h7 pawn can answer by taking
        let game =
            Game::<Antichess>::from_fen("8/7p/8/6Q1/5Q2/4Q3/3Q4/2Q5 w - -").unwrap();
        let mut rng = Rng::with_seed(13);
        for _ in 0..20 {
            let mv = choose_playout_move(&game, &mut rng, 1.0).unwrap();
            assert_eq!(crate::position::uci(&mv), "g5g6");
        }

        let uniform: Vec<Move> = (0..20)
            .map(|_| choose_playout_move(&game, &mut rng, 0.0).unwrap())
            .collect();
        assert!(uniform.iter().any(|m| crate::position::uci(m) != "g5g6"));
    }

    #[test]
    fn test_forced_captures_are_all_candidates() {
        // Black must take on a4; the bias has nothing to add
        let game = Game::<Antichess>::from_fen("8/8/8/8/N7/8/8/r7 b - -").unwrap();
        let mut rng = Rng::with_seed(17);
        for bias in [0.0, 1.0] {
            let mv = choose_playout_move(&game, &mut rng, bias).unwrap();
            assert_eq!(crate::position::uci(&mv), "a1a4");
        }
    }

    #[test]
    fn test_choose_move_takes_capture_with_full_bias() {
        let game = Game::<Chess>::from_fen("4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let mut rng = Rng::with_seed(5);
        for _ in 0..10 {
            let mv = choose_playout_move(&game, &mut rng, 1.0).unwrap();
            assert!(mv.is_capture());
        }
    }
}
