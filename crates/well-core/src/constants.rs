//! Constantes del motor de cálculo.

/// Intervalo por defecto del vigilante de fórmulas, en segundos.
pub const DEFAULT_WATCH_INTERVAL_SECS: u64 = 30;

/// Archivo de checkpoint por defecto.
pub const DEFAULT_CHECKPOINT_FILE: &str = "oil_well_data.json";

/// Decimales de los resultados numéricos.
pub const RESULT_DECIMALS: i32 = 2;
