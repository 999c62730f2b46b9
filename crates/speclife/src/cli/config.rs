//! `speclife config`: show resolved paths and settings.

use super::context::CorpusContext;
use super::output::print_json;
use clap::Args;
use std::path::Path;

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(config: Option<&Path>, args: ConfigArgs) -> anyhow::Result<()> {
    let context = CorpusContext::load(config)?;
    let cfg = &context.config;
    let home = speclife_logging::speclife_home();
    let logs = speclife_logging::logs_dir();
    let states: Vec<_> = cfg
        .registry
        .states()
        .iter()
        .map(|s| serde_json::json!({ "name": s.name, "directory": s.directory }))
        .collect();

    if args.json {
        let payload = serde_json::json!({
            "repo_root": cfg.repo_root,
            "corpus_root": cfg.corpus_root,
            "index": {
                "path": cfg.index_path,
                "exists": cfg.index_path.exists(),
            },
            "default_state": cfg.default_state,
            "number_width": cfg.number_width,
            "states": states,
            "config_file": context.config_file,
            "speclife_home": home,
            "logs_dir": logs,
        });
        return print_json(&payload);
    }

    println!("SPECLIFE CONFIGURATION");
    println!();
    println!("Config file:   {}", match &context.config_file {
        Some(path) => path.display().to_string(),
        None => "(defaults)".to_string(),
    });
    println!("Repo root:     {}", cfg.repo_root.display());
    println!("Corpus root:   {}", cfg.corpus_root.display());
    println!(
        "Index:         {} {}",
        cfg.index_path.display(),
        if cfg.index_path.exists() { "[OK]" } else { "[NOT FOUND]" }
    );
    println!("Default state: {}", cfg.default_state);
    println!("Number width:  {}", cfg.number_width);
    println!();
    println!("States:");
    for state in cfg.registry.states() {
        println!("  {:<20} {}/", state.name, state.directory);
    }
    println!();
    println!("Home:          {}", home.display());
    println!("Logs:          {}", logs.display());
    Ok(())
}
