//! # 2048 CLI
//!
//! Headless simulation runner: plays seeded episodes with a chosen player and
//! prints summary statistics in a `key=value` format.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::{debug, info};
use tile2048_core::{
    AgentConfig, DepthCap, Expectimax, Game, Greedy, HeuristicWeights, Player, RandomPlayer,
    SearchStats,
};

#[derive(Parser, Debug)]
#[command(name = "tile2048")]
#[command(author, version, about = "Run 2048 simulations with a search or baseline player")]
struct Args {
    /// Number of episodes to play
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    episodes: u32,

    /// Random seed for deterministic runs
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Maximum steps per episode (0 = unlimited)
    #[arg(short, long, default_value = "10000")]
    max_steps: u32,

    /// Player used to pick moves
    #[arg(short, long, value_enum, default_value = "expectimax")]
    policy: Policy,

    /// Time budget per move in milliseconds
    #[arg(short, long, default_value = "100")]
    budget_ms: u64,

    /// Heuristic weight set (overrides the config file)
    #[arg(short, long, value_enum)]
    weights: Option<Weights>,

    /// Fixed maximum search depth, 0 for unbounded (overrides the config file)
    #[arg(short, long)]
    depth_cap: Option<u32>,

    /// JSON file with search and heuristic settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show board after each move
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Time-bounded expectimax search
    Expectimax,
    /// Largest immediate merge score
    Greedy,
    /// Random legal moves
    Random,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Weights {
    Refined,
    Classic,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let mut player = build_player(&args, config)?;
    run_headless(&args, player.as_mut());
    Ok(())
}

/// Read the optional config file and apply command-line overrides.
fn load_config(args: &Args) -> Result<AgentConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            AgentConfig::from_json(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => AgentConfig::default(),
    };

    match args.weights {
        Some(Weights::Refined) => config.heuristic = HeuristicWeights::refined(),
        Some(Weights::Classic) => config.heuristic = HeuristicWeights::classic(),
        None => {}
    }
    match args.depth_cap {
        Some(0) => config.search.depth_cap = DepthCap::Unbounded,
        Some(depth) => config.search.depth_cap = DepthCap::Fixed(depth),
        None => {}
    }

    config.search.validate()?;
    debug!("search config: {:?}", config.search);
    Ok(config)
}

fn build_player(args: &Args, config: AgentConfig) -> Result<Box<dyn Player>> {
    let player: Box<dyn Player> = match args.policy {
        Policy::Expectimax => Box::new(Expectimax::with_config(config)?),
        Policy::Greedy => Box::new(Greedy::new()),
        Policy::Random => Box::new(RandomPlayer::new(args.seed.wrapping_add(1000))),
    };
    Ok(player)
}

/// Run headless simulation mode.
fn run_headless(args: &Args, player: &mut dyn Player) {
    let episodes = args.episodes;
    let budget = Duration::from_millis(args.budget_ms);
    let mut total_score: u64 = 0;
    let mut max_tile_overall: u64 = 0;
    let mut scores: Vec<u64> = Vec::with_capacity(episodes as usize);
    let mut tile_counts: BTreeMap<u64, u32> = BTreeMap::new();
    let mut missed_decisions: u64 = 0;

    for episode in 0..episodes {
        let episode_seed = args.seed.wrapping_add(episode as u64);
        let mut game = Game::new(episode_seed);
        let mut steps = 0;

        while !game.is_done() && (args.max_steps == 0 || steps < args.max_steps) {
            let Some(action) = player.decide(game.board(), budget) else {
                // The search timed out before depth 1; stop rather than guess.
                missed_decisions += 1;
                break;
            };

            game.step(action);
            steps += 1;

            if args.verbose {
                println!("Episode {} Step {}: {}", episode + 1, steps, action);
                print!("{}", game);
            }
        }

        let score = game.score();
        let max_tile = game.max_tile();
        info!(
            "episode {} finished: score={} max_tile={} steps={}",
            episode + 1,
            score,
            max_tile,
            steps
        );

        scores.push(score);
        total_score += score;
        max_tile_overall = max_tile_overall.max(max_tile);
        *tile_counts.entry(max_tile).or_insert(0) += 1;

        if args.verbose {
            println!(
                "Episode {}: Score={}, MaxTile={}, Steps={}",
                episode + 1,
                score,
                max_tile,
                steps
            );
        }
    }

    // Compute statistics
    let avg_score = total_score as f64 / episodes as f64;
    scores.sort_unstable();
    let median_score = median(&scores);

    // Output results in parseable format
    println!("=== Simulation Results ===");
    println!("episodes={}", episodes);
    println!("policy={}", player.name());
    println!("seed={}", args.seed);
    println!("max_steps={}", args.max_steps);
    println!("budget_ms={}", args.budget_ms);
    println!("avg_score={:.2}", avg_score);
    println!("median_score={:.2}", median_score);
    println!("min_score={}", scores.first().unwrap_or(&0));
    println!("max_score={}", scores.last().unwrap_or(&0));
    println!("max_tile_overall={}", max_tile_overall);

    let distribution: Vec<String> = tile_counts
        .iter()
        .map(|(tile, count)| format!("{}:{}", tile, count))
        .collect();
    println!("tile_distribution={}", distribution.join(","));

    if let Some(stats) = player.stats() {
        print_search_stats(&stats, missed_decisions);
    }
}

fn print_search_stats(stats: &SearchStats, missed_decisions: u64) {
    println!("decisions={}", stats.decisions);
    println!("nodes={}", stats.nodes);
    println!("avg_depth={:.2}", stats.average_depth());
    println!("branching_factor={:.2}", stats.branching_factor());
    println!("timeouts={}", stats.timeouts);
    println!("missed_decisions={}", missed_decisions);
}

fn median(sorted: &[u64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        0.0
    } else if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
    } else {
        sorted[n / 2] as f64
    }
}
