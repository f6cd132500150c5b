//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use once_cell::sync::Lazy;
use well_core::constants::{DEFAULT_CHECKPOINT_FILE, DEFAULT_WATCH_INTERVAL_SECS};
use well_domain::PathKey;
use well_persistence::config::{env_number, init_dotenv, DbConfig};

/// Configuración global de la aplicación.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Conexión al store SQLite.
    pub database: DbConfig,
    /// Archivo del checkpoint diario del conjunto vivo.
    pub checkpoint_path: PathBuf,
    /// Periodo del vigilante de fórmulas.
    pub watch_interval: Duration,
    /// Ruta (área[/equipo[/sala]]) cuyos pozos de petróleo forman el conjunto vivo.
    pub scope: Vec<PathKey>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        init_dotenv();
        let checkpoint_path = env::var("WELLFLOW_CHECKPOINT").unwrap_or_else(|_| DEFAULT_CHECKPOINT_FILE.to_string());
        let secs = env_number("WELLFLOW_WATCH_INTERVAL_SECS", DEFAULT_WATCH_INTERVAL_SECS).max(1);
        let scope = env::var("WELLFLOW_SCOPE").map(|raw| parse_scope(&raw)).unwrap_or_default();
        Self { database: DbConfig::from_env(),
               checkpoint_path: checkpoint_path.into(),
               watch_interval: Duration::from_secs(secs),
               scope }
    }
}

/// `"Área/Equipo/Sala"` → segmentos de ruta; ignora segmentos vacíos.
pub fn parse_scope(raw: &str) -> Vec<PathKey> {
    raw.split('/').map(str::trim).filter(|s| !s.is_empty()).map(PathKey::parse).collect()
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);
