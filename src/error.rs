use thiserror::Error;
use well_core::CoreError;
use well_persistence::PersistenceError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("core: {0}")]
    Core(#[from] CoreError),
    #[error("store: {0}")]
    Store(#[from] PersistenceError),
}
