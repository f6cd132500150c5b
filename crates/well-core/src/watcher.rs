//! Vigilante de fórmulas: cada intervalo lee las definiciones, compara su
//! hash de contenido con el último visto y, si cambió, compila y recalcula
//! la sesión. La primera lectura sólo registra el hash.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use well_domain::FormulaDefinition;

use crate::engine::RecomputeSummary;
use crate::errors::CoreError;
use crate::formula::FormulaCompiler;
use crate::hashing::hash_value;
use crate::session::ReportSession;

/// Origen de las definiciones de fórmulas.
pub trait FormulaSource: Send + Sync {
    fn load_definitions(&self) -> Result<Vec<FormulaDefinition>, CoreError>;
}

#[derive(Default)]
pub struct InMemoryFormulaSource {
    inner: Mutex<Vec<FormulaDefinition>>,
}

impl InMemoryFormulaSource {
    pub fn new(defs: Vec<FormulaDefinition>) -> Self {
        Self { inner: Mutex::new(defs) }
    }

    /// Inserta o reemplaza la definición con ese id.
    pub fn put(&self, def: FormulaDefinition) {
        let mut guard = self.inner.lock();
        match guard.iter_mut().find(|d| d.id == def.id) {
            Some(slot) => *slot = def,
            None => guard.push(def),
        }
    }
}

impl FormulaSource for InMemoryFormulaSource {
    fn load_definitions(&self) -> Result<Vec<FormulaDefinition>, CoreError> {
        Ok(self.inner.lock().clone())
    }
}

/// Hash de contenido del conjunto, independiente del orden de lectura.
pub fn definitions_hash(defs: &[FormulaDefinition]) -> String {
    let mut rows: Vec<(i64, &str)> = defs.iter().map(|d| (d.id, d.formula.as_str())).collect();
    rows.sort();
    let value = json!(rows.iter().map(|(id, f)| json!({"id": id, "formula": f})).collect::<Vec<_>>());
    hash_value(&value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Primera lectura: sólo se registró el hash.
    Initialized,
    Unchanged,
    Reloaded(RecomputeSummary),
}

pub struct FormulaWatcher {
    source: Arc<dyn FormulaSource>,
    session: ReportSession,
    last_hash: Option<String>,
}

impl FormulaWatcher {
    pub fn new(source: Arc<dyn FormulaSource>, session: ReportSession) -> Self {
        Self { source, session, last_hash: None }
    }

    /// Registra como visto el conjunto ya instalado al arrancar.
    pub fn prime(&mut self, defs: &[FormulaDefinition]) {
        self.last_hash = Some(definitions_hash(defs));
    }

    pub fn last_hash(&self) -> Option<&str> {
        self.last_hash.as_deref()
    }

    pub async fn tick(&mut self) -> Result<TickOutcome, CoreError> {
        let source = Arc::clone(&self.source);
        let defs = tokio::task::spawn_blocking(move || source.load_definitions()).await
                                                                                 .map_err(|e| CoreError::Source(e.to_string()))??;
        let hash = definitions_hash(&defs);

        let Some(prev) = self.last_hash.clone() else {
            debug!("watcher.initialized hash={}", hash);
            self.last_hash = Some(hash);
            return Ok(TickOutcome::Initialized);
        };
        if prev == hash {
            return Ok(TickOutcome::Unchanged);
        }
        info!("watcher.changed prev={} new={} definitions={}", prev, hash, defs.len());

        let session = self.session.clone();
        let summary = tokio::task::spawn_blocking(move || {
                          let compiled = FormulaCompiler::compile(&defs);
                          session.reload_formulas(compiled)
                      }).await
                        .map_err(|e| CoreError::Source(e.to_string()))??;
        self.last_hash = Some(hash);
        Ok(TickOutcome::Reloaded(summary))
    }

    /// Lanza el bucle periódico en el runtime actual.
    pub fn spawn(mut self, interval: Duration) -> WatcherHandle {
        let (tx, mut rx) = watch::channel(false);
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.tick().await {
                            warn!("watcher.tick_failed error={}", e);
                        }
                    }
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            info!("watcher.stopped");
                            break;
                        }
                    }
                }
            }
        });
        WatcherHandle { shutdown: tx, join }
    }
}

pub struct WatcherHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WatcherHandle {
    /// Señala la parada y espera a que termine el tick en curso.
    pub async fn shutdown(self) {
        if self.shutdown.send(true).is_err() {
            debug!("watcher.already_stopped");
        }
        if let Err(e) = self.join.await {
            warn!("watcher.join_failed error={}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_ignores_row_order() {
        let a = vec![FormulaDefinition::new(1, "和=油压"), FormulaDefinition::new(2, "液量=和")];
        let b = vec![a[1].clone(), a[0].clone()];
        assert_eq!(definitions_hash(&a), definitions_hash(&b));
        assert_ne!(definitions_hash(&a), definitions_hash(&a[..1]));
    }

    #[test]
    fn in_memory_source_replaces_by_id() {
        let src = InMemoryFormulaSource::new(vec![FormulaDefinition::new(1, "和=油压")]);
        src.put(FormulaDefinition::new(1, "和=套压"));
        src.put(FormulaDefinition::new(2, "液量=和"));
        let defs = src.load_definitions().unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].formula, "和=套压");
    }
}
