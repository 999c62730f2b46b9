//! `speclife` / `speclife list`: documents grouped by state.

use super::context::controller;
use super::error::lifecycle;
use super::output::{print_json, print_state_table};
use std::path::Path;

pub fn run(config: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let ctl = controller(config)?;
    let listings = ctl.list_by_state().map_err(lifecycle)?;

    if json {
        return print_json(&listings);
    }

    let rows: Vec<Vec<String>> = listings
        .iter()
        .flat_map(|listing| {
            listing.documents.iter().map(|doc| {
                vec![
                    doc.label.clone(),
                    doc.title.clone(),
                    listing.state.clone(),
                    doc.updated.clone(),
                    doc.link.clone(),
                ]
            })
        })
        .collect();

    if rows.is_empty() {
        println!(
            "No documents under {}",
            ctl.config().corpus_root.display()
        );
        return Ok(());
    }

    let total = rows.len();
    print_state_table(&["Number", "Title", "State", "Updated", "Path"], rows, 2);
    let non_empty = listings.iter().filter(|l| !l.documents.is_empty()).count();
    println!("{} documents in {} states", total, non_empty);
    Ok(())
}
