//! Monte Carlo Tree Search (MCTS) with UCT selection.
//!
//! This module implements UCT with proven-result backup:
//! - UCB1 for node selection, unvisited children first
//! - One new child per iteration, drawn from the node's untried moves
//! - Biased random playouts for value estimation
//! - Negamax-style backpropagation (reward sign alternates with depth)
//! - Decisive terminal results are propagated up the tree as proofs, so a
//!   forced win outranks any playout statistic
//!
//! The search maintains a tree where each node represents a game position
//! reached by one specific path. Each node owns its children; transpositions
//! are separate nodes. [`Mcts`] wraps the tree with a time-budgeted search
//! loop and re-rooting after moves are played.

use std::time::{Duration, Instant};

use fastrand::Rng;
use log::{debug, trace, warn};
use shakmaty::{Move, Outcome};

use crate::constants::{
    CAPTURE_BIAS, DEFAULT_SEED, EXPLORATION, MAX_ROLLOUT_PLIES, REWARD_LOSS, REWARD_WIN,
};
use crate::draw::terminal_outcome;
use crate::error::{Result, SearchError};
use crate::playout::mcplayout;
use crate::position::{Game, Rules, uci};

/// Game-theoretic value of a node, seen by the player who moved into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proof {
    Win,
    Loss,
}

impl Proof {
    /// Playout score of a proven node, from its side to move.
    fn leaf_score(self) -> f64 {
        match self {
            Proof::Win => REWARD_LOSS,
            Proof::Loss => REWARD_WIN,
        }
    }
}

/// Tunable search parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// UCT exploration constant.
    pub exploration: f64,
    /// Probability of playing a forcing move in a playout when one exists.
    pub capture_bias: f64,
    /// Playouts longer than this many plies are scored as draws.
    pub max_rollout_plies: usize,
    /// Optional cap on iterations per search, on top of the time budget.
    pub max_iterations: Option<u64>,
    /// Seed for the engine's random number generator.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration: EXPLORATION,
            capture_bias: CAPTURE_BIAS,
            max_rollout_plies: MAX_ROLLOUT_PLIES,
            max_iterations: None,
            seed: DEFAULT_SEED,
        }
    }
}

impl SearchConfig {
    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_capture_bias(mut self, capture_bias: f64) -> Self {
        self.capture_bias = capture_bias.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_rollout_plies(mut self, plies: usize) -> Self {
        self.max_rollout_plies = plies;
        self
    }

    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// A node in the MCTS search tree.
pub struct TreeNode<P> {
    /// The game position at this node
    pub game: Game<P>,
    /// Move that led here from the parent (`None` at the root)
    pub mv: Option<Move>,
    /// Number of playouts that passed through this node
    pub visits: u32,
    /// Sum of rewards, seen by the player who moved into this node
    pub reward: f64,
    /// Proven result, if the subtree below has been solved
    pub proof: Option<Proof>,
    /// Legal moves not yet expanded into children
    untried: Vec<Move>,
    /// Expanded children, in expansion order
    pub children: Vec<TreeNode<P>>,
}

impl<P: Rules> TreeNode<P> {
    /// Create a root node. Every legal move is available for expansion,
    /// even in a position a draw rule would end (the side to move still has
    /// to pick a move).
    pub fn new(game: Game<P>) -> Self {
        let untried = game.legal_moves().to_vec();
        Self {
            game,
            mv: None,
            visits: 0,
            reward: 0.0,
            proof: None,
            untried,
            children: Vec::new(),
        }
    }

    /// Create a node reached by `mv`. Terminal positions get no untried
    /// moves, so they are never expanded; decisive ones start out proven.
    fn child(game: Game<P>, mv: Move) -> Self {
        let (untried, proof) = match terminal_outcome(&game) {
            Some(Outcome::Decisive { winner }) if winner == game.turn() => {
                (Vec::new(), Some(Proof::Loss))
            }
            Some(Outcome::Decisive { .. }) => (Vec::new(), Some(Proof::Win)),
            Some(Outcome::Draw) => (Vec::new(), None),
            None => (game.legal_moves().to_vec(), None),
        };
        Self {
            game,
            mv: Some(mv),
            visits: 0,
            reward: 0.0,
            proof,
            untried,
            children: Vec::new(),
        }
    }

    /// Turn a former child into a root, restoring expandability if the
    /// position was terminal only by a draw rule.
    fn into_root(mut self) -> Self {
        if self.untried.is_empty() && self.children.is_empty() {
            return Self::new(self.game);
        }
        self.mv = None;
        self
    }

    /// Average reward. Zero for unvisited nodes.
    #[inline]
    pub fn mean_reward(&self) -> f64 {
        if self.visits > 0 {
            self.reward / self.visits as f64
        } else {
            0.0
        }
    }

    /// Moves not yet expanded into children.
    pub fn untried_moves(&self) -> &[Move] {
        &self.untried
    }

    /// True when the node can neither be expanded nor descended through.
    pub fn is_leaf(&self) -> bool {
        self.untried.is_empty() && self.children.is_empty()
    }
}

/// UCB1 score of a child, from the perspective of the parent's side to move.
fn uct_score<P>(child: &TreeNode<P>, ln_parent_visits: f64, exploration: f64) -> f64 {
    if child.visits == 0 {
        return f64::INFINITY;
    }
    let n = child.visits as f64;
    child.reward / n + exploration * (ln_parent_visits / n).sqrt()
}

/// Select the child with the highest UCT score. Ties keep the earliest child.
///
/// A proven win is taken at once; proven losses are only picked when
/// nothing else is left.
fn most_urgent<P>(node: &TreeNode<P>, exploration: f64) -> usize {
    let ln_n = (node.visits.max(1) as f64).ln();
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, child) in node.children.iter().enumerate() {
        let score = match child.proof {
            Some(Proof::Win) => return i,
            Some(Proof::Loss) => f64::NEG_INFINITY,
            None => uct_score(child, ln_n, exploration),
        };
        if score > best_score {
            best = i;
            best_score = score;
        }
    }
    best
}

/// Descend through fully expanded nodes, recording the path taken. The
/// descent stops early at a proven node.
///
/// Returns the path of child indices from root to the selected node.
fn tree_descend<P>(root: &TreeNode<P>, exploration: f64) -> Vec<usize> {
    let mut path = Vec::new();
    let mut node = root;
    while node.untried.is_empty() && !node.children.is_empty() {
        let idx = most_urgent(node, exploration);
        path.push(idx);
        node = &node.children[idx];
        if node.proof.is_some() {
            break;
        }
    }
    path
}

/// Realize one untried move into a new child.
///
/// Returns the index of the new child, or `None` if nothing is left to try.
fn expand<P: Rules>(node: &mut TreeNode<P>, rng: &mut Rng) -> Option<usize> {
    if node.untried.is_empty() {
        return None;
    }
    let mv = node.untried.swap_remove(rng.usize(..node.untried.len()));
    let mut game = node.game.clone();
    game.play_unchecked(&mv);
    node.children.push(TreeNode::child(game, mv));
    Some(node.children.len() - 1)
}

/// Reward credited to the node at `depth` for a playout scored `score` from
/// the side to move at the leaf (at `leaf_depth`). The leaf's reward belongs
/// to the player who moved into it, i.e. the opponent of the side to move.
#[inline]
fn reward_at(depth: usize, leaf_depth: usize, score: f64) -> f64 {
    if (leaf_depth - depth) % 2 == 0 {
        -score
    } else {
        score
    }
}

/// Propagate a playout result from the root down the path to the leaf.
fn tree_update<P>(root: &mut TreeNode<P>, path: &[usize], score: f64) {
    let leaf_depth = path.len();
    root.visits += 1;
    root.reward += reward_at(0, leaf_depth, score);

    let mut node = root;
    for (i, &idx) in path.iter().enumerate() {
        node = &mut node.children[idx];
        node.visits += 1;
        node.reward += reward_at(i + 1, leaf_depth, score);
    }
}

/// Solve a node from its children: one winning move proves the node lost for
/// the player who moved into it, and a fully expanded node whose moves all
/// lose is proven won.
fn solve<P>(node: &TreeNode<P>) -> Option<Proof> {
    if node.children.iter().any(|c| c.proof == Some(Proof::Win)) {
        return Some(Proof::Loss);
    }
    let all_lost = node.untried.is_empty()
        && !node.children.is_empty()
        && node.children.iter().all(|c| c.proof == Some(Proof::Loss));
    all_lost.then_some(Proof::Win)
}

/// Re-solve the nodes above the end of `path`, stopping at the first one
/// that stays unproven.
fn update_proofs<P>(root: &mut TreeNode<P>, path: &[usize]) {
    for depth in (0..path.len()).rev() {
        let node = node_at_mut(root, &path[..depth]);
        if node.proof.is_none() {
            node.proof = solve(node);
        }
        if node.proof.is_none() {
            break;
        }
    }
}

fn node_at<'a, P>(root: &'a TreeNode<P>, path: &[usize]) -> &'a TreeNode<P> {
    path.iter().fold(root, |node, &idx| &node.children[idx])
}

fn node_at_mut<'a, P>(root: &'a mut TreeNode<P>, path: &[usize]) -> &'a mut TreeNode<P> {
    path.iter().fold(root, |node, &idx| &mut node.children[idx])
}

/// Pick the final move: a proven win if there is one, otherwise most visits,
/// then highest mean reward, then the earliest child. Proven losses only
/// come into question when every child is one.
fn best_child<P: Rules>(node: &TreeNode<P>) -> Option<&TreeNode<P>> {
    if let Some(win) = node.children.iter().find(|c| c.proof == Some(Proof::Win)) {
        return Some(win);
    }
    let mut best: Option<&TreeNode<P>> = None;
    for child in &node.children {
        let better = match best {
            None => true,
            Some(b) if b.proof.is_some() != child.proof.is_some() => b.proof.is_some(),
            Some(b) => {
                child.visits > b.visits
                    || (child.visits == b.visits && child.mean_reward() > b.mean_reward())
            }
        };
        if better {
            best = Some(child);
        }
    }
    best
}

/// Statistics of the most recent [`Mcts::find_best_move`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchReport {
    /// Iterations whose playout was backpropagated.
    pub iterations: u64,
    /// Iterations whose playout hit an inconsistent position and was dropped.
    pub abandoned: u64,
    pub elapsed: Duration,
    /// Root visits after the search (includes earlier searches on this tree).
    pub root_visits: u32,
    /// Visits of the chosen child (0 when the fallback move was used).
    pub best_visits: u32,
    /// Mean reward of the chosen child, from the side to move at the root.
    pub best_mean: f64,
    /// True when the chosen move is a proven win.
    pub solved: bool,
}

/// Playout function: scores a leaf for its side to move, or gives up.
type Simulate<P> = fn(&Game<P>, &mut Rng, &SearchConfig) -> Option<f64>;

fn rollout<P: Rules>(game: &Game<P>, rng: &mut Rng, config: &SearchConfig) -> Option<f64> {
    mcplayout(game, rng, config.max_rollout_plies, config.capture_bias)
}

/// Time-budgeted MCTS engine that owns its search tree.
pub struct Mcts<P> {
    root: TreeNode<P>,
    config: SearchConfig,
    rng: Rng,
    report: SearchReport,
    simulate: Simulate<P>,
}

impl<P: Rules> Mcts<P> {
    /// Create an engine with the default configuration.
    pub fn new(game: Game<P>) -> Self {
        Self::with_config(game, SearchConfig::default())
    }

    pub fn with_config(game: Game<P>, config: SearchConfig) -> Self {
        Self {
            root: TreeNode::new(game),
            rng: Rng::with_seed(config.seed),
            config,
            report: SearchReport::default(),
            simulate: rollout::<P>,
        }
    }

    pub fn root(&self) -> &TreeNode<P> {
        &self.root
    }

    /// The position at the root of the tree.
    pub fn game(&self) -> &Game<P> {
        &self.root.game
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn last_report(&self) -> &SearchReport {
        &self.report
    }

    /// Search until `budget` has elapsed and return the move to the root's
    /// most visited child.
    ///
    /// The deadline is soft: an iteration that has started always finishes,
    /// but none starts after the deadline. A budget too large to represent
    /// as a deadline means no deadline at all. If not a single child exists
    /// when time runs out, the first untried root move is returned.
    ///
    /// # Errors
    /// Returns [`SearchError::InvalidState`] if the root has no legal moves.
    pub fn find_best_move(&mut self, budget: Duration) -> Result<Move> {
        let start = Instant::now();
        let deadline = start.checked_add(budget);

        if self.root.game.legal_moves().is_empty() {
            return Err(SearchError::InvalidState(
                "no legal moves in root position".to_string(),
            ));
        }

        let mut iterations = 0u64;
        let mut abandoned = 0u64;
        while deadline.is_none_or(|d| Instant::now() < d)
            && self
                .config
                .max_iterations
                .is_none_or(|max| iterations + abandoned < max)
        {
            if self.run_iteration() {
                iterations += 1;
            } else {
                abandoned += 1;
            }
        }

        let (mv, best_visits, best_mean, solved) = match best_child(&self.root) {
            Some(child) => (
                child.mv.clone(),
                child.visits,
                child.mean_reward(),
                child.proof == Some(Proof::Win),
            ),
            None => {
                warn!("search budget exhausted before any expansion, playing first legal move");
                let fallback = self
                    .root
                    .untried
                    .first()
                    .cloned()
                    .or_else(|| self.root.game.legal_moves().first().cloned());
                (fallback, 0, 0.0, false)
            }
        };
        let mv = mv.ok_or_else(|| {
            SearchError::InvalidState("root has no move to return".to_string())
        })?;

        self.report = SearchReport {
            iterations,
            abandoned,
            elapsed: start.elapsed(),
            root_visits: self.root.visits,
            best_visits,
            best_mean,
            solved,
        };
        if abandoned > 0 {
            warn!("{abandoned} playouts abandoned on inconsistent positions");
        }
        debug!(
            "search: {} iterations in {:?}, best {} visits={} mean={:.3}{}",
            iterations,
            self.report.elapsed,
            uci(&mv),
            best_visits,
            best_mean,
            if solved { " (proven win)" } else { "" }
        );
        dump_children(&self.root);

        Ok(mv)
    }

    /// Advance the root by `mv`.
    ///
    /// If `mv` was already expanded, its subtree becomes the new tree and
    /// everything else is dropped. Otherwise the tree is discarded and a
    /// fresh root is built from the resulting position.
    ///
    /// # Errors
    /// Returns [`SearchError::InvalidMove`] if `mv` is not legal at the root.
    pub fn apply_move(&mut self, mv: &Move) -> Result<()> {
        if !self.root.game.is_legal(mv) {
            return Err(SearchError::InvalidMove(uci(mv)));
        }

        let children = std::mem::take(&mut self.root.children);
        let next = match children
            .into_iter()
            .find(|child| child.mv.as_ref() == Some(mv))
        {
            Some(child) => {
                debug!(
                    "re-rooting at {} ({} visits kept)",
                    uci(mv),
                    child.visits
                );
                child.into_root()
            }
            None => {
                debug!("{} not in tree, starting fresh", uci(mv));
                TreeNode::new(self.root.game.play(mv)?)
            }
        };

        self.root = next;
        self.report = SearchReport::default();
        Ok(())
    }

    /// One select / expand / simulate / backpropagate pass.
    ///
    /// Returns `false` if the playout was abandoned.
    fn run_iteration(&mut self) -> bool {
        let path = self.select_and_expand();
        let leaf = node_at(&self.root, &path);
        let score = match leaf.proof {
            Some(proof) => Some(proof.leaf_score()),
            None => (self.simulate)(&leaf.game, &mut self.rng, &self.config),
        };
        self.backpropagate(&path, score)
    }

    /// Descend to a node and expand one of its untried moves. Proven nodes
    /// below the root are not expanded. Returns the path to the node to
    /// simulate from.
    fn select_and_expand(&mut self) -> Vec<usize> {
        let mut path = tree_descend(&self.root, self.config.exploration);
        let node = node_at_mut(&mut self.root, &path);
        if path.is_empty() || node.proof.is_none() {
            if let Some(idx) = expand(node, &mut self.rng) {
                path.push(idx);
            }
        }
        path
    }

    /// Record a playout result along `path`. An abandoned playout (`None`)
    /// leaves every statistic untouched; the expanded child stays, unvisited.
    fn backpropagate(&mut self, path: &[usize], score: Option<f64>) -> bool {
        let Some(score) = score else {
            return false;
        };
        tree_update(&mut self.root, path, score);
        update_proofs(&mut self.root, path);
        true
    }
}

/// Log statistics for the root's children.
pub fn dump_children<P: Rules>(root: &TreeNode<P>) {
    for child in &root.children {
        if let Some(mv) = &child.mv {
            trace!(
                "move {} v={} r={:.1} mean={:.3} proof={:?}",
                uci(mv),
                child.visits,
                child.reward,
                child.mean_reward(),
                child.proof
            );
        }
    }
}
