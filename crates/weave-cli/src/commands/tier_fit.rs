use clap::Args;
use std::path::{Path, PathBuf};
use weave_core::{TierFitAnalysis, TierFitAnalyzer, WeaveRepository};

use super::{load_config, load_snapshot, CliResult};

#[derive(Args)]
pub struct TierFitArgs {
    /// Snapshot JSON file
    snapshot: PathBuf,
    /// Only this friend
    #[arg(long)]
    friend: Option<String>,
    /// Only show mismatches
    #[arg(long)]
    mismatches: bool,
}

pub fn run(args: TierFitArgs, config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;
    let repo = load_snapshot(&args.snapshot)?;
    let analyzer = TierFitAnalyzer::with_config(config.tier_fit);

    if let Some(id) = &args.friend {
        let analysis = analyzer.analyze(&repo, id)?;
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    let analyses: Vec<TierFitAnalysis> = repo
        .friends()
        .iter()
        .filter(|f| !f.is_dormant)
        .map(|f| analyzer.analyze_history(f, &repo.interactions_for(&f.id)))
        .filter(|a| !args.mismatches || a.is_mismatch())
        .collect();
    println!("{}", serde_json::to_string_pretty(&analyses)?);
    Ok(())
}
