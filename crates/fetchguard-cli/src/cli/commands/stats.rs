//! `fetchguard stats <file>` – descriptive statistics.

use anyhow::{Context, Result};
use fetchguard_core::table::Table;
use std::path::Path;

pub async fn run_stats(path: &Path, columns: &[String]) -> Result<()> {
    let table = Table::load(path).with_context(|| format!("load {}", path.display()))?;
    let names: Vec<&str> = if columns.is_empty() {
        table.columns().iter().map(String::as_str).collect()
    } else {
        columns.iter().map(String::as_str).collect()
    };

    let stats = table.statistics(&names);
    if stats.is_empty() {
        println!("No numeric columns.");
        return Ok(());
    }

    println!(
        "{:<20} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "COLUMN", "COUNT", "MEAN", "STD", "MIN", "Q25", "MEDIAN", "Q75", "MAX"
    );
    for (name, s) in &stats {
        let std = s.std.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"));
        println!(
            "{:<20} {:>6} {:>12.4} {:>12} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4}",
            name, s.count, s.mean, std, s.min, s.q25, s.median, s.q75, s.max
        );
    }
    Ok(())
}
