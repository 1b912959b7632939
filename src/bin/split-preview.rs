//! Split Preview CLI Tool
//!
//! Offline look at what the balancer would do for a roster, without a
//! running service.
//!
//! Usage:
//!   cargo run --bin split-preview -- candidates --roster roster.json --show 10
//!   cargo run --bin split-preview -- pick --roster roster.json --top-k 20 --seed 7
//!   cargo run --bin split-preview -- elo --team-a 1200 --team-b 1000 --winner a
//!
//! A roster is a JSON array of `{"id": "...", "rating": 1000}` objects.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use squad_balancer::balance::{enumerate_candidates, TeamBalancer, TopKBalancer};
use squad_balancer::rating::{apply_result, expected_win, DEFAULT_K_FACTOR};
use squad_balancer::types::{RatedPlayer, Team, TeamSplit};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "split-preview")]
#[command(about = "Preview balanced 5v5 splits and Elo updates for a roster")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List candidate splits, most balanced first
    Candidates {
        /// Roster JSON file
        #[arg(short, long)]
        roster: PathBuf,
        /// Number of candidates to print
        #[arg(short, long, default_value = "10")]
        show: usize,
    },
    /// Pick a split the way the service does
    Pick {
        /// Roster JSON file
        #[arg(short, long)]
        roster: PathBuf,
        /// Size of the candidate pool
        #[arg(short, long, default_value = "20")]
        top_k: usize,
        /// Seed for a reproducible pick
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Show the rating change for a result between two team averages
    Elo {
        #[arg(long)]
        team_a: f64,
        #[arg(long)]
        team_b: f64,
        /// Winning side, "a" or "b"
        #[arg(short, long)]
        winner: String,
        #[arg(short, long, default_value_t = DEFAULT_K_FACTOR)]
        k_factor: f64,
    },
}

fn load_roster(path: &Path) -> Result<Vec<RatedPlayer>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid roster JSON in {}", path.display()))
}

fn print_split(label: &str, split: &TeamSplit) {
    let names = |team: &[RatedPlayer]| {
        team.iter()
            .map(|p| format!("{}({})", p.id, p.rating))
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("{} diff={}", label, split.diff);
    println!("    A [{}] = {}", names(&split.team_a), split.sum_a);
    println!("    B [{}] = {}", names(&split.team_b), split.sum_b);
}

/// Size and diff range of the pool a pick is drawn from
fn describe_pool(pool: &[TeamSplit]) -> String {
    let best = pool.first().map(|s| s.diff).unwrap_or_default();
    let worst = pool.last().map(|s| s.diff).unwrap_or_default();
    format!(
        "Drawing from {} candidates (diff {}..={})",
        pool.len(),
        best,
        worst
    )
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Candidates { roster, show } => {
            let players = load_roster(&roster)?;
            let candidates = enumerate_candidates(&players)?;
            println!("{} candidate splits", candidates.len());
            for (i, split) in candidates.iter().take(show).enumerate() {
                print_split(&format!("#{:<3}", i + 1), split);
            }
        }
        Commands::Pick {
            roster,
            top_k,
            seed,
        } => {
            let players = load_roster(&roster)?;
            let balancer = TopKBalancer::new(top_k)?;
            let pool = balancer.eligible_candidates(&players)?;
            println!("{}", describe_pool(&pool));

            let split = match seed {
                Some(seed) => balancer.balance_with_rng(&players, &mut StdRng::seed_from_u64(seed))?,
                None => balancer.balance(&players)?,
            };
            print_split("Chosen", &split);
        }
        Commands::Elo {
            team_a,
            team_b,
            winner,
            k_factor,
        } => {
            let winner = match winner.to_ascii_lowercase().as_str() {
                "a" => Team::A,
                "b" => Team::B,
                other => return Err(anyhow!("Winner must be 'a' or 'b', got '{}'", other)),
            };
            let magnitude = apply_result(team_a, team_b, winner, k_factor);
            println!(
                "Expected: A {:.1}% / B {:.1}%",
                expected_win(team_a, team_b) * 100.0,
                expected_win(team_b, team_a) * 100.0
            );
            println!("{} wins: winners +{}, losers -{}", winner, magnitude, magnitude);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_range_starts_at_best_diff() {
        // One heavy player keeps every split at least 4000 apart
        let players: Vec<RatedPlayer> = (0..10)
            .map(|i| RatedPlayer::new(format!("p{}", i), if i == 0 { 5000 } else { 1000 }))
            .collect();
        let pool = TopKBalancer::new(3)
            .unwrap()
            .eligible_candidates(&players)
            .unwrap();

        let best = pool[0].diff;
        assert_eq!(best, 4000);
        assert_eq!(
            describe_pool(&pool),
            format!("Drawing from 3 candidates (diff {}..={})", best, pool[2].diff)
        );
    }
}
