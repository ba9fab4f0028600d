use chrono::Utc;
use clap::Args;
use std::path::{Path, PathBuf};
use weave_core::NetworkHealthAggregator;

use super::{load_config, load_snapshot, resolve_now, CliResult};

#[derive(Args)]
pub struct HealthArgs {
    /// Snapshot JSON file
    snapshot: PathBuf,
    /// Evaluate at this RFC 3339 time instead of now
    #[arg(long)]
    at: Option<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: HealthArgs, config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;
    let repo = load_snapshot(&args.snapshot)?;
    let now = resolve_now(args.at.as_deref())?.with_timezone(&Utc);
    let health = NetworkHealthAggregator::with_config(&config).compute(&repo, now);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&health)?);
        return Ok(());
    }

    println!("Network health: {}/10 ({})", health.health_score, health.status.message());
    for (tier, counts) in &health.tier_health {
        println!(
            "  {:<14} {} friends: {} great, {} good, {} mismatch, {} new",
            tier.label(),
            counts.total,
            counts.great,
            counts.good,
            counts.mismatch,
            counts.insufficient_data,
        );
    }
    for m in &health.mismatches {
        match m.fit.suggested_tier() {
            Some(suggested) => println!("  consider moving {} to {}", m.friend_name, suggested.label()),
            None => println!("  {} is off the {} rhythm", m.friend_name, m.current_tier.label()),
        }
    }
    Ok(())
}
