//! `fetchguard aggregate <file> --group-by .. --agg col=fn` – group and reduce.

use anyhow::{anyhow, Context, Result};
use fetchguard_core::table::{FileFormat, Reduction, Table};
use std::path::Path;

/// Parses `COLUMN=FUNCTION`, e.g. `amount=sum`.
pub(crate) fn parse_agg(arg: &str) -> Result<(String, Reduction)> {
    let (column, func) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected COLUMN=FUNCTION, got {:?}", arg))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(anyhow!("missing column name in {:?}", arg));
    }
    let reduction = func.parse::<Reduction>().map_err(|e| anyhow!(e))?;
    Ok((column.to_string(), reduction))
}

pub async fn run_aggregate(
    path: &Path,
    group_by: &[String],
    aggs: &[String],
    output: Option<&Path>,
) -> Result<()> {
    let specs = aggs
        .iter()
        .map(|s| parse_agg(s))
        .collect::<Result<Vec<_>>>()?;
    let table = Table::load(path).with_context(|| format!("load {}", path.display()))?;

    let keys: Vec<&str> = group_by.iter().map(String::as_str).collect();
    let reductions: Vec<(&str, Reduction)> = specs.iter().map(|(c, r)| (c.as_str(), *r)).collect();
    let result = table.aggregate(&keys, &reductions)?;

    match output {
        Some(out) => {
            result.save(out, FileFormat::from_path(out)?)?;
            println!("Saved {} groups to {}", result.len(), out.display());
        }
        None => result.write_csv(std::io::stdout().lock())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_agg_argument() {
        assert_eq!(parse_agg("amount=sum").unwrap(), ("amount".to_string(), Reduction::Sum));
        assert_eq!(parse_agg(" price = MEAN").unwrap(), ("price".to_string(), Reduction::Mean));
    }

    #[test]
    fn parse_agg_rejects_malformed() {
        assert!(parse_agg("amount").is_err());
        assert!(parse_agg("=sum").is_err());
        assert!(parse_agg("amount=median").is_err());
    }
}
