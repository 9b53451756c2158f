//! Binary arithmetic over columns for calculated columns.

use super::value::{parse_number, Value};
use super::TableError;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operand {
    Column(usize),
    Literal(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    fn from_char(c: char) -> Option<Op> {
        match c {
            '+' => Some(Op::Add),
            '-' => Some(Op::Sub),
            '*' => Some(Op::Mul),
            '/' => Some(Op::Div),
            _ => None,
        }
    }
}

/// `lhs op rhs`, where each side is a column name or a numeric literal.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expr {
    lhs: Operand,
    op: Op,
    rhs: Operand,
}

impl Expr {
    pub(crate) fn parse(
        text: &str,
        column: impl Fn(&str) -> Option<usize>,
    ) -> Result<Expr, TableError> {
        let fail = |reason: &str| TableError::Expression {
            expr: text.to_string(),
            reason: reason.to_string(),
        };

        let (lhs, op, rhs) = split(text).ok_or_else(|| fail("expected `operand op operand`"))?;
        let operand = |s: &str| -> Result<Operand, TableError> {
            if let Some(n) = parse_number(s) {
                return Ok(Operand::Literal(n));
            }
            column(s)
                .map(Operand::Column)
                .ok_or_else(|| fail(&format!("unknown column {s:?}")))
        };
        Ok(Expr {
            lhs: operand(lhs)?,
            op,
            rhs: operand(rhs)?,
        })
    }

    /// Result for one row; `Null` if an operand is not a number or the
    /// result is not finite.
    pub(crate) fn eval(&self, row: &[Value]) -> Value {
        let get = |o: Operand| match o {
            Operand::Literal(n) => Some(n),
            Operand::Column(i) => row.get(i).and_then(Value::as_f64),
        };
        let (a, b) = match (get(self.lhs), get(self.rhs)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Value::Null,
        };
        let r = match self.op {
            Op::Add => a + b,
            Op::Sub => a - b,
            Op::Mul => a * b,
            Op::Div => a / b,
        };
        if r.is_finite() {
            Value::Number(r)
        } else {
            Value::Null
        }
    }
}

/// Splits on the operator. `a * b` (spaced) is preferred; unspaced forms
/// split at the first `*` or `/`, then the first `+`/`-` past a leading sign.
fn split(text: &str) -> Option<(&str, Op, &str)> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if let [lhs, op, rhs] = tokens.as_slice() {
        let mut chars = op.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(op) = Op::from_char(c) {
                return Some((*lhs, op, *rhs));
            }
        }
    }

    let text = text.trim();
    let pos = text.find(['*', '/']).or_else(|| {
        text.char_indices()
            .skip(1)
            .find(|(_, c)| *c == '+' || *c == '-')
            .map(|(i, _)| i)
    })?;
    let op = Op::from_char(text[pos..].chars().next()?)?;
    let (lhs, rhs) = (text[..pos].trim(), text[pos + 1..].trim());
    if lhs.is_empty() || rhs.is_empty() {
        return None;
    }
    Some((lhs, op, rhs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(name: &str) -> Option<usize> {
        match name {
            "price" => Some(0),
            "qty" => Some(1),
            _ => None,
        }
    }

    #[test]
    fn spaced_and_unspaced_forms() {
        let e = Expr::parse("price * qty", cols).unwrap();
        assert_eq!(e.eval(&[Value::Number(2.0), Value::Number(3.0)]), Value::Number(6.0));
        let e = Expr::parse("price/2", cols).unwrap();
        assert_eq!(e.eval(&[Value::Number(5.0), Value::Null]), Value::Number(2.5));
        let e = Expr::parse("qty-1", cols).unwrap();
        assert_eq!(e.eval(&[Value::Null, Value::Number(5.0)]), Value::Number(4.0));
    }

    #[test]
    fn non_numeric_operand_is_null() {
        let e = Expr::parse("price + qty", cols).unwrap();
        assert_eq!(e.eval(&[Value::from("x"), Value::Number(1.0)]), Value::Null);
        assert_eq!(e.eval(&[Value::Null, Value::Number(1.0)]), Value::Null);
    }

    #[test]
    fn division_by_zero_is_null() {
        let e = Expr::parse("price / 0", cols).unwrap();
        assert_eq!(e.eval(&[Value::Number(1.0), Value::Null]), Value::Null);
    }

    #[test]
    fn rejects_malformed() {
        assert!(Expr::parse("price", cols).is_err());
        assert!(Expr::parse("price * weight", cols).is_err());
        assert!(Expr::parse("* qty", cols).is_err());
    }
}
