//! Cell values and inferred column types.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Null,
}

impl Value {
    /// Interprets a raw text cell: empty → `Null`, finite number → `Number`, else `Text`.
    pub fn parse_cell(raw: &str) -> Value {
        let s = raw.trim();
        if s.is_empty() {
            return Value::Null;
        }
        match parse_number(s) {
            Some(n) => Value::Number(n),
            None => Value::Text(s.to_string()),
        }
    }

    pub fn from_json(v: &serde_json::Value) -> Value {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Bool(b) => Value::Text(b.to_string()),
            other => Value::Text(other.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Number(n) => {
                if is_integral(*n) {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Total order used for sorting group keys: Null < Number < Text.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Number(_), Value::Text(_)) => Ordering::Less,
            (Value::Text(_), Value::Number(_)) => Ordering::Greater,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
        }
    }

    /// Ordering between comparable cells only (number/number, text/text).
    pub fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Number(n) if is_integral(*n) => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15
}

pub(crate) fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Column type, inferred once when the table is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Number,
    Text,
    /// Every cell is null.
    Empty,
}

impl ColumnType {
    /// Type of a column of already-typed cells.
    pub fn of<'a>(cells: impl IntoIterator<Item = &'a Value>) -> ColumnType {
        let mut seen_number = false;
        for c in cells {
            match c {
                Value::Text(_) => return ColumnType::Text,
                Value::Number(_) => seen_number = true,
                Value::Null => {}
            }
        }
        if seen_number {
            ColumnType::Number
        } else {
            ColumnType::Empty
        }
    }

    /// Type of a column of raw text cells: numeric only if every non-empty cell parses.
    pub fn of_raw<'a>(cells: impl IntoIterator<Item = &'a str>) -> ColumnType {
        let mut seen_number = false;
        for c in cells {
            let c = c.trim();
            if c.is_empty() {
                continue;
            }
            if parse_number(c).is_none() {
                return ColumnType::Text;
            }
            seen_number = true;
        }
        if seen_number {
            ColumnType::Number
        } else {
            ColumnType::Empty
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            ColumnType::Number => "number",
            ColumnType::Text => "text",
            ColumnType::Empty => "empty",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cell_kinds() {
        assert_eq!(Value::parse_cell(" 42 "), Value::Number(42.0));
        assert_eq!(Value::parse_cell("-1.5"), Value::Number(-1.5));
        assert_eq!(Value::parse_cell(""), Value::Null);
        assert_eq!(Value::parse_cell("Seoul"), Value::Text("Seoul".to_string()));
        assert_eq!(Value::parse_cell("NaN"), Value::Text("NaN".to_string()));
    }

    #[test]
    fn display_integral_numbers_without_fraction() {
        assert_eq!(Value::Number(100.0).to_string(), "100");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn json_conversion() {
        assert_eq!(Value::from_json(&serde_json::json!(3)), Value::Number(3.0));
        assert_eq!(Value::from_json(&serde_json::json!(true)), Value::Text("true".into()));
        assert_eq!(Value::Number(3.0).to_json(), serde_json::json!(3));
        assert_eq!(Value::Number(0.5).to_json(), serde_json::json!(0.5));
    }

    #[test]
    fn total_order_across_kinds() {
        let mut v = vec![Value::from("b"), Value::Number(10.0), Value::Null, Value::Number(9.0)];
        v.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(v, vec![Value::Null, Value::Number(9.0), Value::Number(10.0), Value::from("b")]);
    }

    #[test]
    fn column_type_inference() {
        assert_eq!(ColumnType::of_raw(["1", "", "2.5"]), ColumnType::Number);
        assert_eq!(ColumnType::of_raw(["1", "x"]), ColumnType::Text);
        assert_eq!(ColumnType::of_raw(["", " "]), ColumnType::Empty);
        assert_eq!(ColumnType::of(&[Value::Null, Value::Number(1.0)]), ColumnType::Number);
    }
}
