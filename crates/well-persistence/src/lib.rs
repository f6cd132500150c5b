//! well-persistence
//!
//! Store jerárquico sobre SQLite (Diesel + r2d2): áreas, equipos, salas,
//! tipos de reporte, plataformas, pozos y sus reportes diarios, además de
//! las definiciones de fórmulas.
//!
//! Módulos:
//! - `sqlite`: `EntityStore` y pool de conexiones.
//! - `resolver`: resolución de rutas compuestas hasta un nodo o reporte.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel declaradas para compilar queries.

pub mod config;
pub mod error;
pub mod migrations;
pub mod resolver;
pub mod schema;
pub mod sqlite;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use resolver::SequenceResolver;
pub use sqlite::{build_pool, build_store_from_env, ConnectionProvider, EntityStore, NewNode, PoolProvider, SqlitePool,
                 SyncSummary};
