use thiserror::Error;

/// Errores del dominio de reportes de producción
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validación fallida: {0}")]
    Validation(String),
    #[error("Tipo de reporte desconocido: {0}")]
    UnknownReportKind(String),
    #[error("Campo desconocido: {0}")]
    UnknownField(String),
    #[error("Jerarquía inválida: {0}")]
    Hierarchy(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_variant_format() {
        let err = DomainError::Validation("inválido".into());
        assert_eq!(err.to_string(), "Validación fallida: inválido");
    }

    #[test]
    fn test_unknown_field_variant_format() {
        let err = DomainError::UnknownField("foo".into());
        assert_eq!(err.to_string(), "Campo desconocido: foo");
    }
}
