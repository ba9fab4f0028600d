use chrono::Utc;
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use weave_core::{ScoreBreakdown, ScoreCalculator, Tier, WeaveRepository};

use super::{load_config, load_snapshot, resolve_now, CliResult};

#[derive(Args)]
pub struct ScoreArgs {
    /// Snapshot JSON file
    snapshot: PathBuf,
    /// Only this friend
    #[arg(long)]
    friend: Option<String>,
    /// Evaluate at this RFC 3339 time instead of now
    #[arg(long)]
    at: Option<String>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FriendScore {
    friend_id: String,
    name: String,
    tier: Tier,
    is_dormant: bool,
    #[serde(flatten)]
    score: ScoreBreakdown,
}

pub fn run(args: ScoreArgs, config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;
    let repo = load_snapshot(&args.snapshot)?;
    let now = resolve_now(args.at.as_deref())?.with_timezone(&Utc);
    let calc = ScoreCalculator::with_config(config.scoring);

    let friends: Vec<_> = match &args.friend {
        Some(id) => vec![repo
            .friend(id)
            .ok_or_else(|| format!("friend not found: {id}"))?],
        None => repo.friends().iter().collect(),
    };

    let scores: Vec<FriendScore> = friends
        .into_iter()
        .map(|f| FriendScore {
            friend_id: f.id.clone(),
            name: f.name.clone(),
            tier: f.tier,
            is_dormant: f.is_dormant,
            score: calc.breakdown(f, now),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&scores)?);
        return Ok(());
    }

    for s in &scores {
        let dormant = if s.is_dormant { " (dormant)" } else { "" };
        println!(
            "{:<24} {:<14} {:>5.1}  base {:>5.1}  momentum {:>4.1}{dormant}",
            s.name,
            s.tier.label(),
            s.score.total,
            s.score.base,
            s.score.momentum,
        );
    }
    Ok(())
}
