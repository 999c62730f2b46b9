//! `index`, `add-headers` and `add`: single-document commands.

use super::context::controller;
use super::error::lifecycle;
use speclife_core::numbering::format_number;
use speclife_core::DocumentOutcome;
use std::path::Path;

pub fn index(config: Option<&Path>, path: &Path) -> anyhow::Result<()> {
    let outcome = controller(config)?
        .index_document(path)
        .map_err(lifecycle)?;
    if outcome.index_changed {
        println!(
            "Indexed {} ({}) under {}",
            outcome.path.display(),
            outcome.number,
            outcome.state
        );
    } else {
        println!("{} is already indexed", outcome.path.display());
    }
    Ok(())
}

pub fn add_headers(config: Option<&Path>, path: &Path) -> anyhow::Result<()> {
    let outcome = controller(config)?
        .add_headers(path)
        .map_err(lifecycle)?;
    if outcome.document_changed {
        println!("Wrote metadata envelope to {}", outcome.path.display());
    } else {
        println!("{} already has a complete envelope", outcome.path.display());
    }
    Ok(())
}

pub fn add(config: Option<&Path>, path: &Path) -> anyhow::Result<()> {
    let ctl = controller(config)?;
    let outcome: DocumentOutcome = ctl.add_document(path).map_err(lifecycle)?;
    println!(
        "Added {} as {} ({})",
        outcome.path.display(),
        format_number(outcome.number, ctl.config().number_width),
        outcome.state
    );
    Ok(())
}
