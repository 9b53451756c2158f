//! In-memory tables loaded from CSV or JSON.
//!
//! Cells are typed [`Value`]s and each column's [`ColumnType`] is inferred
//! once when the table is built. Grouping lives in [`aggregate`], descriptive
//! statistics in [`stats`].

pub mod aggregate;
mod expr;
pub mod stats;
pub mod value;

use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

pub use aggregate::Reduction;
pub use stats::ColumnStats;
pub use value::{ColumnType, Value};

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("unsupported file format: {0:?}")]
    UnsupportedFormat(String),
    #[error("unknown column {0:?}")]
    UnknownColumn(String),
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("invalid expression {expr:?}: {reason}")]
    Expression { expr: String, reason: String },
    #[error("JSON table must be an array of objects")]
    JsonShape,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    /// Format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }
}

impl FromStr for FileFormat {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            other => Err(TableError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Overview of a table's shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub columns: usize,
    pub column_types: Vec<(String, ColumnType)>,
    /// Null count per column.
    pub missing: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    pub drop_duplicates: bool,
    /// Drop rows containing any null.
    pub drop_nulls: bool,
    /// Replace nulls with this value (applied after `drop_nulls`).
    pub fill_null: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Ge,
    Gt,
    Le,
    Lt,
    Eq,
    Ne,
}

impl CmpOp {
    fn holds(self, cell: &Value, operand: &Value) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        let ord = cell.partial_cmp_value(operand);
        match self {
            CmpOp::Eq => cell == operand,
            CmpOp::Ne => cell != operand,
            CmpOp::Ge => matches!(ord, Some(Greater | Equal)),
            CmpOp::Gt => ord == Some(Greater),
            CmpOp::Le => matches!(ord, Some(Less | Equal)),
            CmpOp::Lt => ord == Some(Less),
        }
    }
}

impl FromStr for CmpOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">=" => Ok(CmpOp::Ge),
            ">" => Ok(CmpOp::Gt),
            "<=" => Ok(CmpOp::Le),
            "<" => Ok(CmpOp::Lt),
            "==" => Ok(CmpOp::Eq),
            "!=" => Ok(CmpOp::Ne),
            other => Err(format!("unknown comparison operator {other:?}")),
        }
    }
}

/// Row predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Every comparison must hold, e.g. `>= 18` and `< 65`.
    Cmp(Vec<(CmpOp, Value)>),
    In(Vec<Value>),
    Equals(Value),
}

impl Condition {
    pub fn matches(&self, cell: &Value) -> bool {
        match self {
            Condition::Cmp(ops) => ops.iter().all(|(op, v)| op.holds(cell, v)),
            Condition::In(values) => values.contains(cell),
            Condition::Equals(v) => cell == v,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    types: Vec<ColumnType>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Builds a table from typed rows; every row must have one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RowWidth {
                    row: i,
                    found: row.len(),
                    expected: columns.len(),
                });
            }
        }
        let mut table = Self {
            types: Vec::new(),
            columns,
            rows,
        };
        table.refresh_types();
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self, TableError> {
        let format = FileFormat::from_path(path)?;
        if !path.exists() {
            return Err(TableError::NotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)?;
        let table = match format {
            FileFormat::Csv => Self::from_csv_reader(file)?,
            FileFormat::Json => Self::from_json_reader(file)?,
        };
        tracing::info!(
            "loaded {}: {} rows, {} columns",
            path.display(),
            table.len(),
            table.columns.len()
        );
        Ok(table)
    }

    /// Reads CSV with a header row. A column is numeric only when every
    /// non-empty cell parses as a number; otherwise cells keep their text.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut raw: Vec<csv::StringRecord> = Vec::new();
        for record in rdr.records() {
            raw.push(record?);
        }

        let types: Vec<ColumnType> = (0..columns.len())
            .map(|c| ColumnType::of_raw(raw.iter().map(|r| r.get(c).unwrap_or(""))))
            .collect();

        let rows = raw
            .iter()
            .map(|record| {
                types
                    .iter()
                    .enumerate()
                    .map(|(c, ty)| {
                        let cell = record.get(c).unwrap_or("");
                        match ty {
                            ColumnType::Number => Value::parse_cell(cell),
                            _ if cell.is_empty() => Value::Null,
                            _ => Value::Text(cell.to_string()),
                        }
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            columns,
            types,
            rows,
        })
    }

    /// Reads a JSON array of objects. Columns are the union of keys in
    /// first-seen order; a missing key is null.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let doc: serde_json::Value = serde_json::from_reader(reader)?;
        let records = doc.as_array().ok_or(TableError::JsonShape)?;

        let mut columns: Vec<String> = Vec::new();
        for rec in records {
            let obj = rec.as_object().ok_or(TableError::JsonShape)?;
            for key in obj.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut rows: Vec<Vec<Value>> = records
            .iter()
            .filter_map(|rec| rec.as_object())
            .map(|obj| {
                columns
                    .iter()
                    .map(|c| obj.get(c).map(Value::from_json).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        // A column mixing numbers and text is a text column.
        let types: Vec<ColumnType> = (0..columns.len())
            .map(|c| ColumnType::of(rows.iter().map(|r| &r[c])))
            .collect();
        for row in &mut rows {
            for (cell, ty) in row.iter_mut().zip(&types) {
                if *ty == ColumnType::Text {
                    if let Value::Number(_) = cell {
                        *cell = Value::Text(cell.to_string());
                    }
                }
            }
        }

        Ok(Self {
            columns,
            types,
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column_index(name).map(|i| self.types[i])
    }

    pub(crate) fn require_column(&self, name: &str) -> Result<usize, TableError> {
        self.column_index(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    fn refresh_types(&mut self) {
        self.types = (0..self.columns.len())
            .map(|c| ColumnType::of(self.rows.iter().map(|r| &r[c])))
            .collect();
    }

    pub fn summary(&self) -> Summary {
        Summary {
            rows: self.rows.len(),
            columns: self.columns.len(),
            column_types: self
                .columns
                .iter()
                .cloned()
                .zip(self.types.iter().copied())
                .collect(),
            missing: self
                .columns
                .iter()
                .enumerate()
                .map(|(c, name)| {
                    (
                        name.clone(),
                        self.rows.iter().filter(|r| r[c].is_null()).count(),
                    )
                })
                .collect(),
        }
    }

    /// Applies the requested cleanup steps in order: duplicates, nulls, fill.
    pub fn clean(&mut self, opts: &CleanOptions) {
        let before = self.rows.len();

        if opts.drop_duplicates {
            let mut seen = HashSet::new();
            self.rows.retain(|row| seen.insert(row_key(row)));
            tracing::info!("removed {} duplicate rows", before - self.rows.len());
        }

        if opts.drop_nulls {
            let n = self.rows.len();
            self.rows.retain(|row| !row.iter().any(Value::is_null));
            tracing::info!("removed {} rows with nulls", n - self.rows.len());
        }

        if let Some(fill) = &opts.fill_null {
            for cell in self.rows.iter_mut().flatten() {
                if cell.is_null() {
                    *cell = fill.clone();
                }
            }
            self.refresh_types();
        }

        tracing::debug!("clean: {} -> {} rows", before, self.rows.len());
    }

    /// Rows matching every condition. Unknown columns are skipped.
    pub fn filter(&self, conditions: &[(&str, Condition)]) -> Table {
        let mut active: Vec<(usize, &Condition)> = Vec::new();
        for (name, cond) in conditions {
            match self.column_index(name) {
                Some(i) => active.push((i, cond)),
                None => tracing::warn!("filter: unknown column {:?}, skipping", name),
            }
        }
        let rows: Vec<Vec<Value>> = self
            .rows
            .iter()
            .filter(|row| active.iter().all(|(i, cond)| cond.matches(&row[*i])))
            .cloned()
            .collect();
        tracing::info!("filter: {} -> {} rows", self.rows.len(), rows.len());
        Table {
            columns: self.columns.clone(),
            types: self.types.clone(),
            rows,
        }
    }

    /// Appends `name` computed per row from a binary expression such as
    /// `price * quantity` or `total / 100`. Replaces an existing column of
    /// the same name.
    pub fn add_calculated_column(
        &mut self,
        name: &str,
        expression: &str,
    ) -> Result<(), TableError> {
        let parsed = expr::Expr::parse(expression, |c| self.column_index(c))?;
        let values: Vec<Value> = self.rows.iter().map(|row| parsed.eval(row)).collect();
        match self.column_index(name) {
            Some(idx) => {
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[idx] = v;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(v);
                }
            }
        }
        self.refresh_types();
        tracing::info!("added calculated column {:?} = {}", name, expression);
        Ok(())
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|v| v.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Rows as a JSON array of objects keyed by column name.
    pub fn to_json_records(&self) -> serde_json::Value {
        let records = self
            .rows
            .iter()
            .map(|row| {
                let obj: serde_json::Map<String, serde_json::Value> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(Value::to_json))
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect();
        serde_json::Value::Array(records)
    }

    pub fn save(&self, path: &Path, format: FileFormat) -> Result<(), TableError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        match format {
            FileFormat::Csv => self.write_csv(&mut file)?,
            FileFormat::Json => serde_json::to_writer_pretty(&mut file, &self.to_json_records())?,
        }
        file.flush()?;
        tracing::info!("saved {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }
}

/// Hashable identity of a row for duplicate detection.
fn row_key(row: &[Value]) -> Vec<String> {
    row.iter()
        .map(|v| match v {
            Value::Null => "\0null".to_string(),
            Value::Number(n) => format!("n:{}", n.to_bits()),
            Value::Text(s) => format!("t:{s}"),
        })
        .collect()
}
