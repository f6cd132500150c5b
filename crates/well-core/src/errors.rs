//! Errores del motor de fórmulas y de la sesión de reportes.
//!
//! `FormulaError` y `EvalError` nunca abortan un lote: se registran y el
//! destino afectado queda en blanco. `CoreError` sí se propaga al llamador.

use thiserror::Error;

use well_domain::DomainError;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum FormulaError {
    #[error("definición mal formada '{definition}': {reason}")]
    Parse { definition: String, reason: String },
    #[error("sintaxis inválida en '{target}': {reason}")]
    Syntax { target: String, reason: String },
    #[error("ciclo de dependencias en '{target}': {}", path.join(" -> "))]
    Cycle { target: String, path: Vec<String> },
    #[error("'{target}' depende de '{dependency}', que no compila")]
    BrokenDependency { target: String, dependency: String },
}

impl FormulaError {
    /// Destino afectado (`None` si la definición ni siquiera tenía destino).
    pub fn target(&self) -> Option<&str> {
        match self {
            FormulaError::Parse { .. } => None,
            FormulaError::Syntax { target, .. }
            | FormulaError::Cycle { target, .. }
            | FormulaError::BrokenDependency { target, .. } => Some(target),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EvalError {
    #[error("sintaxis: {0}")]
    Syntax(String),
    #[error("división por cero")]
    DivisionByZero,
    #[error("variable no numérica '{name}' = '{value}'")]
    NotNumeric { name: String, value: String },
    #[error("variable no suministrada: {0}")]
    UnknownVariable(String),
    #[error("resultado no finito")]
    NonFinite,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("checkpoint: {0}")]
    Checkpoint(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("fuente de fórmulas: {0}")]
    Source(String),
    #[error("pozo no encontrado en la sesión: {0}")]
    UnknownWell(i64),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_names_the_path() {
        let e = FormulaError::Cycle { target: "a".into(), path: vec!["a".into(), "b".into(), "a".into()] };
        assert_eq!(e.to_string(), "ciclo de dependencias en 'a': a -> b -> a");
        assert_eq!(e.target(), Some("a"));
    }
}
