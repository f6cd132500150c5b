//! Evaluador de expresiones expandidas.
//!
//! Política: si alguna dependencia hoja falta o está en blanco el resultado
//! es blanco (no es un error). Sólo se resuelven variables del mapa
//! suministrado y literales numéricos.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};

use crate::constants::RESULT_DECIMALS;
use crate::errors::EvalError;
use crate::formula::{parse, BinOp, CompiledFormula, Expr};

/// Valor de campo tras la coerción numérica.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// `None` para valores en blanco.
    pub fn coerce(raw: &str) -> Option<Value> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(Value::Number(n)),
            _ => Some(Value::Text(trimmed.to_string())),
        }
    }
}

/// Resultado de una evaluación que no falló.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Value(String),
    /// Falta la dependencia indicada.
    Blank { missing: String },
}

impl Outcome {
    pub fn into_string(self) -> String {
        match self {
            Outcome::Value(v) => v,
            Outcome::Blank { .. } => String::new(),
        }
    }
}

/// Redondea a dos decimales y elimina ceros finales: `3`, `12.5`, `0.33`.
pub fn format_number(n: f64) -> String {
    let factor = 10f64.powi(RESULT_DECIMALS);
    let rounded = (n * factor).round() / factor;
    let text = format!("{:.*}", RESULT_DECIMALS as usize, rounded);
    let text = if text.contains('.') { text.trim_end_matches('0').trim_end_matches('.') } else { text.as_str() };
    match text {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

pub fn try_evaluate_expr(expr: &Expr, leaf_deps: &BTreeSet<String>, values: &BTreeMap<String, String>) -> Result<Outcome, EvalError> {
    for dep in leaf_deps {
        if values.get(dep).and_then(|v| Value::coerce(v)).is_none() {
            return Ok(Outcome::Blank { missing: dep.clone() });
        }
    }
    match eval_node(expr, values)? {
        Value::Number(n) if !n.is_finite() => Err(EvalError::NonFinite),
        Value::Number(n) => Ok(Outcome::Value(format_number(n))),
        Value::Text(t) => Ok(Outcome::Value(t)),
    }
}

pub fn try_evaluate(expanded_expr: &str, leaf_deps: &BTreeSet<String>, values: &BTreeMap<String, String>) -> Result<Outcome, EvalError> {
    let expr = parse(expanded_expr).map_err(EvalError::Syntax)?;
    try_evaluate_expr(&expr, leaf_deps, values)
}

/// Evalúa texto expandido; cualquier fallo se registra y produce blanco.
pub fn evaluate(expanded_expr: &str, leaf_deps: &BTreeSet<String>, values: &BTreeMap<String, String>) -> String {
    settle("<expr>", try_evaluate(expanded_expr, leaf_deps, values))
}

/// Igual que [`evaluate`] pero reutiliza el AST ya compilado.
pub fn evaluate_compiled(formula: &CompiledFormula, values: &BTreeMap<String, String>) -> String {
    settle(&formula.target, try_evaluate_expr(&formula.expr, &formula.leaf_deps, values))
}

fn settle(target: &str, result: Result<Outcome, EvalError>) -> String {
    match result {
        Ok(Outcome::Blank { missing }) => {
            debug!("eval.blank target={} missing={}", target, missing);
            String::new()
        }
        Ok(outcome) => outcome.into_string(),
        Err(e) => {
            warn!("eval.failed target={} error={}", target, e);
            String::new()
        }
    }
}

fn number(name_hint: &str, v: Value) -> Result<f64, EvalError> {
    match v {
        Value::Number(n) => Ok(n),
        Value::Text(t) => Err(EvalError::NotNumeric { name: name_hint.to_string(), value: t }),
    }
}

fn eval_node(expr: &Expr, values: &BTreeMap<String, String>) -> Result<Value, EvalError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Var(name) => values.get(name)
                                 .and_then(|raw| Value::coerce(raw))
                                 .ok_or_else(|| EvalError::UnknownVariable(name.clone())),
        Expr::Neg(inner) => Ok(Value::Number(-operand(inner, values)?)),
        Expr::Binary(op, l, r) => {
            let (a, b) = (operand(l, values)?, operand(r, values)?);
            let n = match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div if b == 0.0 => return Err(EvalError::DivisionByZero),
                BinOp::Div => a / b,
            };
            Ok(Value::Number(n))
        }
    }
}

fn operand(expr: &Expr, values: &BTreeMap<String, String>) -> Result<f64, EvalError> {
    let hint = match expr {
        Expr::Var(name) => name.as_str(),
        _ => "<subexpresión>",
    };
    number(hint, eval_node(expr, values)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vals(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn deps(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn evaluates_and_rounds() {
        let v = vals(&[("a", "10"), ("b", "3")]);
        assert_eq!(evaluate("a / b", &deps(&["a", "b"]), &v), "3.33");
        assert_eq!(evaluate("a * 1.25", &deps(&["a"]), &v), "12.5");
        assert_eq!(evaluate("(a - b) * -2", &deps(&["a", "b"]), &v), "-14");
    }

    #[test]
    fn blank_leaf_yields_blank() {
        let v = vals(&[("a", "10"), ("b", "  ")]);
        assert_eq!(try_evaluate("a + b", &deps(&["a", "b"]), &v), Ok(Outcome::Blank { missing: "b".into() }));
        assert_eq!(evaluate("a + c", &deps(&["a", "c"]), &v), "");
    }

    #[test]
    fn failures_are_blank_not_panics() {
        let v = vals(&[("a", "10"), ("z", "0"), ("t", "abc")]);
        assert_eq!(try_evaluate("a / z", &deps(&["a", "z"]), &v), Err(EvalError::DivisionByZero));
        assert_eq!(evaluate("a / z", &deps(&["a", "z"]), &v), "");
        assert!(matches!(try_evaluate("a + t", &deps(&["a", "t"]), &v), Err(EvalError::NotNumeric { .. })));
        assert!(matches!(try_evaluate("a +", &deps(&["a"]), &v), Err(EvalError::Syntax(_))));
    }

    #[test]
    fn bare_text_is_returned_as_is() {
        let v = vals(&[("remark", "停井")]);
        assert_eq!(evaluate("remark", &deps(&["remark"]), &v), "停井");
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.005e1), "20.05");
        assert_eq!(format_number(-0.001), "0");
        assert_eq!(format_number(1.999), "2");
    }
}
