//! WellFlow
//!
//! Servicio de reportes diarios de producción:
//! - `bootstrap` abre la sesión del día y ceba el vigilante de fórmulas.
//! - `config` expone la configuración leída del entorno.
//! - `error` agrupa los errores de núcleo y de store.
//!
//! La lógica vive en los crates `well-domain`, `well-core` y
//! `well-persistence`; este crate sólo los ensambla.

pub mod bootstrap;
pub mod config;
pub mod error;

pub use bootstrap::{bootstrap, persist_live, roll_over_if_needed, App};
pub use config::{AppConfig, CONFIG};
pub use error::AppError;
