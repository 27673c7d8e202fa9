//! chess-mcts: pick a chess move with Monte Carlo Tree Search.
//!
//! ## Usage
//!
//! - `chess-mcts` - Show a demo
//! - `chess-mcts search --fen <FEN>` - Search a position and print the best move
//! - `chess-mcts threats --fen <FEN>` - Count the captures available to the side to move
//! - `chess-mcts draw --fen <FEN>` - Report whether the position is drawn
//!
//! Set `RUST_LOG=debug` (or `trace`) to see search statistics.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;
use shakmaty::Chess;
use shakmaty::variant::Antichess;

use chess_mcts::constants::{
    CAPTURE_BIAS, DEFAULT_MOVE_TIME_MS, DEFAULT_SEED, EXPLORATION, MAX_ROLLOUT_PLIES,
};
use chess_mcts::mcts::{Mcts, SearchConfig};
use chess_mcts::position::{Game, Rules, uci};
use chess_mcts::threats::capture_moves;
use chess_mcts::{count_threats, is_draw};

/// chess-mcts: a time-budgeted MCTS chess move picker
#[derive(Parser)]
#[command(name = "chess-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a position and print the best move in UCI notation
    Search(SearchArgs),
    /// Print how many captures the side to move has
    Threats(PositionArgs),
    /// Print whether the position is a draw
    Draw(PositionArgs),
    /// Run a simple demo of the engine
    Demo,
}

#[derive(Clone, Copy, ValueEnum)]
enum Variant {
    Standard,
    Antichess,
}

#[derive(Args)]
struct PositionArgs {
    /// Position in FEN
    #[arg(long)]
    fen: String,
    /// Rule set the position is played under
    #[arg(long, value_enum, default_value_t = Variant::Standard)]
    variant: Variant,
}

#[derive(Args)]
struct SearchArgs {
    #[command(flatten)]
    position: PositionArgs,
    /// Search time in milliseconds
    #[arg(long, default_value_t = DEFAULT_MOVE_TIME_MS)]
    millis: u64,
    /// UCT exploration constant
    #[arg(long, default_value_t = EXPLORATION)]
    exploration: f64,
    /// Probability of playing a forcing move in playouts when one exists
    #[arg(long, default_value_t = CAPTURE_BIAS)]
    capture_bias: f64,
    /// Maximum playout length in plies
    #[arg(long, default_value_t = MAX_ROLLOUT_PLIES)]
    max_plies: usize,
    /// Stop after this many iterations even if time remains
    #[arg(long)]
    iterations: Option<u64>,
    /// Random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    /// Print statistics for every root move
    #[arg(short, long)]
    verbose: bool,
}

impl SearchArgs {
    fn config(&self) -> SearchConfig {
        let config = SearchConfig::default()
            .with_exploration(self.exploration)
            .with_capture_bias(self.capture_bias)
            .with_max_rollout_plies(self.max_plies)
            .with_seed(self.seed);
        match self.iterations {
            Some(n) => config.with_max_iterations(n),
            None => config,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Search(args)) => match args.position.variant {
            Variant::Standard => run_search::<Chess>(&args),
            Variant::Antichess => run_search::<Antichess>(&args),
        },
        Some(Commands::Threats(args)) => match args.variant {
            Variant::Standard => run_threats::<Chess>(&args.fen),
            Variant::Antichess => run_threats::<Antichess>(&args.fen),
        },
        Some(Commands::Draw(args)) => match args.variant {
            Variant::Standard => run_draw::<Chess>(&args.fen),
            Variant::Antichess => run_draw::<Antichess>(&args.fen),
        },
        Some(Commands::Demo) | None => run_demo(),
    }
}

fn load<P: Rules>(fen: &str) -> Result<Game<P>> {
    Game::from_fen(fen).with_context(|| format!("cannot load position {fen:?}"))
}

fn run_search<P: Rules>(args: &SearchArgs) -> Result<()> {
    let game = load::<P>(&args.position.fen)?;
    let mut mcts = Mcts::with_config(game, args.config());

    let best = mcts
        .find_best_move(Duration::from_millis(args.millis))
        .context("search failed")?;

    if args.verbose {
        let report = mcts.last_report();
        println!(
            "iterations {} (abandoned {}) in {:?}",
            report.iterations, report.abandoned, report.elapsed
        );
        for child in &mcts.root().children {
            if let Some(mv) = &child.mv {
                println!(
                    "{:6} visits={:6} mean={:+.3}",
                    uci(mv),
                    child.visits,
                    child.mean_reward()
                );
            }
        }
    }
    println!("bestmove {}", uci(&best));
    Ok(())
}

fn run_threats<P: Rules>(fen: &str) -> Result<()> {
    let game = load::<P>(fen)?;
    println!("{}", count_threats(&game));
    for mv in capture_moves(&game) {
        debug!("capture {}", uci(&mv));
    }
    Ok(())
}

fn run_draw<P: Rules>(fen: &str) -> Result<()> {
    let game = load::<P>(fen)?;
    println!("{}", is_draw(&game));
    Ok(())
}

fn run_demo() -> Result<()> {
    println!("chess-mcts: Monte Carlo Tree Search move picker\n");

    println!("=== Antichess Demo ===");
    let fen = "8/8/8/8/8/8/1N6/r7 w - -";
    let game = load::<Antichess>(fen)?;
    println!("Position: {fen}");
    println!("Captures available: {}", count_threats(&game));

    let mut mcts = Mcts::new(game);
    println!("Searching for 200 ms...");
    let best = mcts.find_best_move(Duration::from_millis(200))?;
    let report = mcts.last_report();
    println!("Best move: {}", uci(&best));
    println!(
        "Iterations: {}, best move visits: {}, mean reward: {:+.3}",
        report.iterations, report.best_visits, report.best_mean
    );

    mcts.apply_move(&best)?;
    println!("After {}: draw = {}", uci(&best), is_draw(mcts.game()));
    Ok(())
}
