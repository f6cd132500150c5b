//! Implementación SQLite (Diesel + r2d2) del store jerárquico.
//!
//! - Cada llamada pública abre su propia transacción (begin → trabajo →
//!   commit o rollback) sobre una conexión del pool, que se devuelve en
//!   todas las salidas.
//! - Errores transitorios (base bloqueada, pool agotado) se reintentan con un
//!   backoff corto.
//! - Cada conexión activa `PRAGMA foreign_keys` y un `busy_timeout`.

mod formulas;
mod hierarchy;
mod reports;
mod rows;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sqlite::SqliteConnection;
use log::{info, warn};

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;

pub(crate) use hierarchy::{children_of, find_node};
pub use hierarchy::NewNode;
pub use reports::SyncSummary;

/// Alias de tipo para el pool r2d2 de conexiones SQLite.
pub type SqlitePool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type PooledConn = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar un pool real o uno construido a medida en tests.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PooledConn, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `SqlitePool`.
pub struct PoolProvider {
    pub pool: SqlitePool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PooledConn, PersistenceError> {
        self.pool.get().map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Pragmas aplicados a cada conexión al salir del pool.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(&format!("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};", self.busy_timeout_ms))
            .map_err(r2d2::Error::QueryError)
    }
}

/// Determina si un error es transitorio (recomendado reintentar).
fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("database is locked") || m.contains("busy") || m.contains("timeout")
        }
        _ => false,
    }
}

/// Retry simple con backoff lineal corto (hasta 3 reintentos: 15, 30, 45 ms).
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("store.retry attempt={} error={:?} sleep_ms={}", attempts + 1, e, delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Store jerárquico de entidades y reportes.
///
/// Se construye una vez al arrancar y se comparte por referencia (o `Arc`)
/// con quien lo necesite.
pub struct EntityStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> EntityStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Ejecuta `work` dentro de una transacción, con reintentos transitorios.
    pub(crate) fn tx<T, F>(&self, work: F) -> Result<T, PersistenceError>
        where F: Fn(&mut SqliteConnection) -> Result<T, PersistenceError>
    {
        with_retry(|| {
            let mut pooled = self.provider.connection()?;
            let conn: &mut SqliteConnection = &mut pooled;
            conn.transaction::<T, PersistenceError, _>(|c| work(c))
        })
    }
}

/// Construye un pool SQLite y ejecuta las migraciones pendientes.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<SqlitePool, PersistenceError> {
    let validated_min = min_size.max(1);
    let validated_max = max_size.max(1);
    if validated_min > validated_max {
        warn!("pool.sizes min_size > max_size ({} > {}), ajustando min=max", validated_min, validated_max);
    }
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(validated_min.min(validated_max)))
                                    .max_size(validated_max)
                                    .connection_customizer(Box::new(SqlitePragmas { busy_timeout_ms: 5_000 }))
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    info!("pool.ready url={} max={}", database_url, validated_max);
    Ok(pool)
}

/// Carga `.env`, lee `DbConfig` y devuelve un store listo para usar.
pub fn build_store_from_env() -> Result<EntityStore<PoolProvider>, PersistenceError> {
    crate::config::init_dotenv();
    let cfg = crate::config::DbConfig::from_env();
    let pool = build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)?;
    Ok(EntityStore::new(PoolProvider { pool }))
}
