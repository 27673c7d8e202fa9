//! Constants for draw rules, MCTS parameters, and rollout heuristics.
//!
//! The MCTS tunables here are only defaults: every one of them can be
//! overridden at runtime through [`crate::mcts::SearchConfig`].

// =============================================================================
// Draw Rules
// =============================================================================

/// Number of occurrences of the same position that ends the game in a draw.
pub const REPETITION_COUNT: usize = 3;

/// Halfmoves without a capture or pawn move that end the game in a draw
/// (the 50-move rule counted in plies).
pub const NO_PROGRESS_PLIES: u32 = 100;

// =============================================================================
// MCTS (Monte Carlo Tree Search) Parameters
// =============================================================================

/// UCT exploration constant. sqrt(2) is the textbook value for rewards in [-1, 1].
pub const EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// Default search time per move, in milliseconds.
pub const DEFAULT_MOVE_TIME_MS: u64 = 1000;

/// Default seed for the engine's random number generator.
pub const DEFAULT_SEED: u64 = 0x5eed_c4e5;

// =============================================================================
// Rollout Parameters
// =============================================================================

/// Maximum number of plies in a single rollout. Reaching it scores as a draw.
pub const MAX_ROLLOUT_PLIES: usize = 200;

/// Probability of drawing a rollout move from the forcing moves (captures, or
/// sacrifices under compulsory-capture rules) when the side to move has one.
pub const CAPTURE_BIAS: f64 = 0.9;

// =============================================================================
// Rewards
// =============================================================================

/// Reward for the winning side.
pub const REWARD_WIN: f64 = 1.0;

/// Reward for the losing side.
pub const REWARD_LOSS: f64 = -1.0;

/// Reward for a draw or an unfinished rollout.
pub const REWARD_DRAW: f64 = 0.0;
