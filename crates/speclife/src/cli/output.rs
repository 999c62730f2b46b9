//! Output formatting utilities for CLI commands

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

/// Print a table with cyan headers.
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }

    println!("{}", table);
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Terminal color for a state, by lifecycle phase.
pub fn color_for_state(state: &str) -> Color {
    match state.to_lowercase().as_str() {
        "draft" | "under review" => Color::Yellow,
        "accepted" | "final" | "active" => Color::Green,
        "rejected" | "withdrawn" | "obsolete" | "superseded" => Color::DarkGrey,
        _ => Color::Reset,
    }
}

/// Print a table whose `state_column` is colored by [`color_for_state`].
pub fn print_state_table(headers: &[&str], rows: Vec<Vec<String>>, state_column: usize) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        let cells: Vec<Cell> = row
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                if i == state_column {
                    let color = color_for_state(&text);
                    Cell::new(text).fg(color)
                } else {
                    Cell::new(text)
                }
            })
            .collect();
        table.add_row(cells);
    }

    println!("{}", table);
}
