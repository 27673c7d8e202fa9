//! chess-mcts: a time-budgeted Monte Carlo Tree Search move picker for chess.
//!
//! This crate picks a move for the side to move within a wall-clock budget,
//! using UCT search over biased random playouts, with proven wins and losses
//! backed up the tree. Board rules come from `shakmaty`; both standard chess
//! and antichess are supported.
//!
//! ## Modules
//!
//! - [`constants`] - Draw rules and default engine parameters
//! - [`position`] - Game wrapper over the rules engine (FEN, moves, repetitions)
//! - [`threats`] - Capture counting and en prise checks used to bias playouts
//! - [`draw`] - Draw and terminal detection
//! - [`playout`] - Random game simulation for position evaluation
//! - [`mcts`] - Search tree and the time-budgeted engine
//! - [`error`] - Error type shared by the above
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use chess_mcts::mcts::Mcts;
//! use chess_mcts::position::{Game, uci};
//! use shakmaty::variant::Antichess;
//!
//! // White sacrifices the knight: black must take and white runs out of pieces
//! let game = Game::<Antichess>::from_fen("8/8/8/8/8/8/1N6/r7 w - -").unwrap();
//! let mut mcts = Mcts::new(game);
//!
//! let best = mcts.find_best_move(Duration::from_millis(200)).unwrap();
//! println!("Best move: {}", uci(&best));
//!
//! // Keep the subtree below the chosen move for the next search
//! mcts.apply_move(&best).unwrap();
//! ```

pub mod constants;
pub mod draw;
pub mod error;
pub mod mcts;
pub mod playout;
pub mod position;
pub mod threats;

pub use draw::is_draw;
pub use error::SearchError;
pub use mcts::{Mcts, SearchConfig};
pub use position::Game;
pub use threats::count_threats;
