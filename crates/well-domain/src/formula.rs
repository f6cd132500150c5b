use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Definición almacenada `destino=expresión`, escrita con etiquetas humanas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaDefinition {
    pub id: i64,
    pub formula: String,
}

impl FormulaDefinition {
    pub fn new(id: i64, formula: impl Into<String>) -> Self {
        Self { id, formula: formula.into() }
    }

    /// Divide en (destino, expresión). Exige exactamente un `=` y ambos lados
    /// no vacíos.
    pub fn split(&self) -> Result<(&str, &str), DomainError> {
        split_definition(&self.formula)
    }
}

pub fn split_definition(text: &str) -> Result<(&str, &str), DomainError> {
    let mut parts = text.split('=');
    let (Some(lhs), Some(rhs), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(DomainError::Validation(format!("se esperaba exactamente un '=': {text}")));
    };
    let (lhs, rhs) = (lhs.trim(), rhs.trim());
    if lhs.is_empty() || rhs.is_empty() {
        return Err(DomainError::Validation(format!("lado vacío en la definición: {text}")));
    }
    Ok((lhs, rhs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_trims_both_sides() {
        assert_eq!(split_definition(" 和 = 油压 + 套压 ").unwrap(), ("和", "油压 + 套压"));
    }

    #[test]
    fn split_rejects_zero_or_many_equals() {
        assert!(split_definition("油压 + 套压").is_err());
        assert!(split_definition("a=b=c").is_err());
        assert!(split_definition("=b").is_err());
    }
}
