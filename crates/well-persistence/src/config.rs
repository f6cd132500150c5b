//! Carga de configuración de conexión desde variables de entorno.
//! Usa convención `DATABASE_URL` (ruta del archivo SQLite) y parámetros
//! opcionales de pool.

use std::env;

use dotenvy::dotenv;
use log::warn;
use once_cell::sync::Lazy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const DEFAULT_DATABASE_URL: &str = "wellflow.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { url: DEFAULT_DATABASE_URL.to_string(), min_connections: 1, max_connections: 4 }
    }
}

impl DbConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let defaults = Self::default();
        let url = env::var("DATABASE_URL").unwrap_or(defaults.url);
        let min_connections = env_number("DATABASE_MIN_CONNECTIONS", defaults.min_connections);
        let max_connections = env_number("DATABASE_MAX_CONNECTIONS", defaults.max_connections);
        Self { url, min_connections, max_connections }
    }
}

/// Lee un entero de entorno; valores inválidos caen al default con aviso.
pub fn env_number<T: std::str::FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
                                          warn!("config.invalid key={} value={} default={}", key, raw, default);
                                          default
                                      }),
        Err(_) => default,
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
