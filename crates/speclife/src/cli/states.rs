//! `speclife states`: supported states, sorted by display name.

use super::context::CorpusContext;
use super::output::{print_json, print_table};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct StateRow<'a> {
    name: &'a str,
    directory: &'a str,
}

pub fn run(config: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let context = CorpusContext::load(config)?;
    let registry = &context.config.registry;

    let rows: Vec<StateRow<'_>> = registry
        .all_display_names()
        .iter()
        .filter_map(|name| registry.lookup(name))
        .map(|state| StateRow {
            name: &state.name,
            directory: &state.directory,
        })
        .collect();

    if json {
        return print_json(&rows);
    }

    print_table(
        &["State", "Directory"],
        rows.iter()
            .map(|r| vec![r.name.to_string(), r.directory.to_string()])
            .collect(),
    );
    Ok(())
}
