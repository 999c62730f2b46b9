//! `speclife <path> <state>` and `speclife <path>`.

use super::context::controller;
use super::error::lifecycle;
use speclife_core::TransitionOutcome;
use std::path::Path;

fn report(outcome: &TransitionOutcome) {
    println!(
        "{} -> {}",
        outcome.from_path.display(),
        outcome.to_path.display()
    );
    if outcome.from_state.is_empty() {
        println!("  state: {}", outcome.to_state);
    } else {
        println!("  state: {} -> {}", outcome.from_state, outcome.to_state);
    }
    if !outcome.index_changed {
        println!("  index already up to date");
    }
}

pub fn transition(config: Option<&Path>, path: &Path, state: &str) -> anyhow::Result<()> {
    let outcome = controller(config)?
        .transition(path, state)
        .map_err(lifecycle)?;
    report(&outcome);
    Ok(())
}

pub fn sync_to_header(config: Option<&Path>, path: &Path) -> anyhow::Result<()> {
    let outcome = controller(config)?
        .sync_to_header(path)
        .map_err(lifecycle)?;
    report(&outcome);
    Ok(())
}
