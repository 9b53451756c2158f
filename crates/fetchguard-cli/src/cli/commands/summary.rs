//! `fetchguard summary <file>` – table overview.

use anyhow::{Context, Result};
use fetchguard_core::table::Table;
use std::path::Path;

pub async fn run_summary(path: &Path) -> Result<()> {
    let table = Table::load(path).with_context(|| format!("load {}", path.display()))?;
    let summary = table.summary();
    println!("{} rows, {} columns", summary.rows, summary.columns);
    println!("{:<24} {:<8} {}", "COLUMN", "TYPE", "MISSING");
    for ((name, ty), (_, missing)) in summary.column_types.iter().zip(&summary.missing) {
        println!("{:<24} {:<8} {}", name, ty, missing);
    }
    Ok(())
}
