//! Group-by aggregation.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::{Table, TableError, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    Mean,
    Count,
    Min,
    Max,
}

impl Reduction {
    pub fn as_str(self) -> &'static str {
        match self {
            Reduction::Sum => "sum",
            Reduction::Mean => "mean",
            Reduction::Count => "count",
            Reduction::Min => "min",
            Reduction::Max => "max",
        }
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reduction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Reduction::Sum),
            "mean" | "avg" => Ok(Reduction::Mean),
            "count" => Ok(Reduction::Count),
            "min" => Ok(Reduction::Min),
            "max" => Ok(Reduction::Max),
            other => Err(format!(
                "unknown aggregation {other:?} (expected sum, mean, count, min or max)"
            )),
        }
    }
}

/// Composite group key, ordered cell by cell.
#[derive(Debug, Clone)]
struct GroupKey(Vec<Value>);

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().zip(&other.0) {
            match a.total_cmp(b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

/// Running state for one aggregated column within one group.
#[derive(Debug, Clone, Default)]
struct Accumulator {
    sum: f64,
    numeric: usize,
    non_null: usize,
    min: Option<f64>,
    max: Option<f64>,
}

impl Accumulator {
    fn push(&mut self, v: &Value) {
        if v.is_null() {
            return;
        }
        self.non_null += 1;
        if let Some(n) = v.as_f64() {
            self.sum += n;
            self.numeric += 1;
            self.min = Some(self.min.map_or(n, |m| m.min(n)));
            self.max = Some(self.max.map_or(n, |m| m.max(n)));
        }
    }

    fn finish(&self, reduction: Reduction) -> Value {
        match reduction {
            Reduction::Sum => Value::Number(self.sum),
            Reduction::Mean if self.numeric > 0 => Value::Number(self.sum / self.numeric as f64),
            Reduction::Mean => Value::Null,
            Reduction::Count => Value::Number(self.non_null as f64),
            Reduction::Min => self.min.map(Value::Number).unwrap_or(Value::Null),
            Reduction::Max => self.max.map(Value::Number).unwrap_or(Value::Null),
        }
    }
}

impl Table {
    /// Groups rows by the values of `group_by` and reduces each `(column,
    /// reduction)` pair per group. Groups come out sorted by key.
    ///
    /// Numeric reductions skip non-numeric cells; `count` counts non-null
    /// cells. An output column is named after its source column, or
    /// `{column}_{reduction}` when the same column is reduced more than once.
    pub fn aggregate(
        &self,
        group_by: &[&str],
        aggregations: &[(&str, Reduction)],
    ) -> Result<Table, TableError> {
        let key_idx = group_by
            .iter()
            .map(|c| self.require_column(c))
            .collect::<Result<Vec<_>, _>>()?;
        let agg_idx = aggregations
            .iter()
            .map(|(c, _)| self.require_column(c))
            .collect::<Result<Vec<_>, _>>()?;

        let mut groups: BTreeMap<GroupKey, Vec<Accumulator>> = BTreeMap::new();
        for row in self.rows() {
            let key = GroupKey(key_idx.iter().map(|&i| row[i].clone()).collect());
            let accs = groups
                .entry(key)
                .or_insert_with(|| vec![Accumulator::default(); agg_idx.len()]);
            for (acc, &i) in accs.iter_mut().zip(&agg_idx) {
                acc.push(&row[i]);
            }
        }

        let mut columns: Vec<String> = group_by.iter().map(|c| c.to_string()).collect();
        for (name, reduction) in aggregations {
            let repeated = aggregations.iter().filter(|(n, _)| n == name).count() > 1;
            columns.push(if repeated {
                format!("{name}_{reduction}")
            } else {
                name.to_string()
            });
        }

        let rows: Vec<Vec<Value>> = groups
            .into_iter()
            .map(|(key, accs)| {
                let mut row = key.0;
                row.extend(
                    accs.iter()
                        .zip(aggregations)
                        .map(|(acc, (_, reduction))| acc.finish(*reduction)),
                );
                row
            })
            .collect();

        tracing::info!("aggregated by {:?}: {} groups", group_by, rows.len());
        Table::new(columns, rows)
    }
}
