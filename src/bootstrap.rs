//! Arranque de la sesión diaria: store → conjunto vivo → fórmulas → vigilante.

use std::sync::Arc;

use chrono::NaiveDate;
use log::info;
use well_core::{CalculationEngine, Checkpoint, CoreError, FormulaCompiler, FormulaWatcher, ReportSession};
use well_domain::PathKey;
use well_persistence::{ConnectionProvider, EntityStore, SyncSummary};

use crate::error::AppError;

pub struct App<P: ConnectionProvider> {
    pub store: Arc<EntityStore<P>>,
    pub session: ReportSession,
    pub watcher: FormulaWatcher,
}

/// Abre la sesión de `today` (checkpoint del día o, si no hay, el store),
/// compila las fórmulas vigentes, recalcula y deja el vigilante cebado con
/// ese mismo conjunto de definiciones.
pub fn bootstrap<P: ConnectionProvider>(store: Arc<EntityStore<P>>,
                                        checkpoint: Arc<dyn Checkpoint>,
                                        scope: &[PathKey],
                                        today: NaiveDate)
                                        -> Result<App<P>, AppError> {
    let engine = CalculationEngine::new(checkpoint);
    let session = ReportSession::open(engine, today, || {
                      store.load_live_records(scope, today).map_err(|e| CoreError::Source(e.to_string()))
                  })?;

    let defs = store.load_definitions()?;
    let compiled = FormulaCompiler::compile(&defs);
    let summary = session.reload_formulas(compiled)?;
    info!("app.bootstrap date={} definitions={} records={} computed={}",
          today,
          defs.len(),
          summary.records,
          summary.computed);

    let mut watcher = FormulaWatcher::new(store.clone(), session.clone());
    watcher.prime(&defs);
    Ok(App { store, session, watcher })
}

/// Vuelca el conjunto vivo al store.
pub fn persist_live<P: ConnectionProvider>(store: &EntityStore<P>, session: &ReportSession) -> Result<SyncSummary, AppError> {
    Ok(store.sync_oil_reports(&session.snapshot())?)
}

/// Cierre de día: guarda el día que termina y pasa la sesión a `today`.
/// `false` si la sesión ya estaba en `today`.
pub fn roll_over_if_needed<P: ConnectionProvider>(store: &EntityStore<P>,
                                                  session: &ReportSession,
                                                  today: NaiveDate)
                                                  -> Result<bool, AppError> {
    if session.date() == today {
        return Ok(false);
    }
    let closed = persist_live(store, session)?;
    info!("app.day_closed inserted={} updated={}", closed.inserted, closed.updated);
    Ok(session.roll_over(today)?)
}
