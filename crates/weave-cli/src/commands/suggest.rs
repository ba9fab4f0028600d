use clap::Args;
use std::path::{Path, PathBuf};
use weave_core::{Season, Suggestion, SuggestionEngine, TemplateRegistry};

use super::{load_config, load_snapshot, resolve_now, CliResult};

#[derive(Args)]
pub struct SuggestArgs {
    /// Snapshot JSON file
    snapshot: PathBuf,
    /// Social season: resting, normal (balanced) or blooming
    #[arg(long, default_value = "normal")]
    season: Season,
    /// RNG seed for reproducible picks (overrides config)
    #[arg(long)]
    seed: Option<u64>,
    /// Generate at this RFC 3339 time instead of now
    #[arg(long)]
    at: Option<String>,
    /// JSON file of suggestions already shown or dismissed
    #[arg(long)]
    existing: Option<PathBuf>,
    /// JSON file replacing the built-in templates
    #[arg(long)]
    templates: Option<PathBuf>,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: SuggestArgs, config_path: Option<&Path>) -> CliResult {
    let mut config = load_config(config_path)?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let repo = load_snapshot(&args.snapshot)?;
    let now = resolve_now(args.at.as_deref())?;

    let existing: Vec<Suggestion> = match &args.existing {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => Vec::new(),
    };

    let mut engine = SuggestionEngine::with_config(config);
    if let Some(path) = &args.templates {
        engine = engine.with_templates(TemplateRegistry::from_json_str(&std::fs::read_to_string(path)?)?);
    }
    let suggestions = engine.generate_from_repo(&repo, now, args.season, &existing);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    if suggestions.is_empty() {
        println!("No suggestions");
        return Ok(());
    }
    for s in &suggestions {
        println!("[{:<8}] {}", s.urgency, s.title);
        if !s.subtitle.is_empty() {
            println!("           {}", s.subtitle);
        }
    }
    Ok(())
}
