//! `speclife update-index [--check]`

use super::context::controller;
use super::error::{lifecycle, HelpfulError};
use super::output::print_json;
use std::path::Path;

pub fn run(config: Option<&Path>, check: bool, json: bool) -> anyhow::Result<()> {
    let ctl = controller(config)?;
    let report = ctl.resync_index(check).map_err(lifecycle)?;

    if json {
        print_json(&report)?;
    } else {
        if report.changed {
            println!("Index {}:", if check { "needs changes" } else { "updated" });
            println!("  rows added:           {}", report.rows_added);
            println!("  rows updated:         {}", report.rows_updated);
            println!("  entries added:        {}", report.bullets_added);
            println!("  entries removed:      {}", report.bullets_removed);
            println!("  envelopes reconciled: {}", report.envelopes_reconciled);
        } else {
            println!("Index is up to date ({})", ctl.config().index_path.display());
        }
        for path in &report.skipped {
            println!("  skipped (no number): {}", path.display());
        }
        if report.changed && check {
            println!("No files were written.");
        }
    }

    if check && report.changed {
        return Err(HelpfulError::index_out_of_date(&ctl.config().index_path).into());
    }
    Ok(())
}
