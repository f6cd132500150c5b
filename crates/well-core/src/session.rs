//! Sesión de reportes vivos del día.
//!
//! El estado compartido (registros + fórmulas compiladas) vive detrás de un
//! único `Mutex`. Ediciones del operador y recargas del vigilante se
//! serializan en ese lock: un disparo concurrente espera, nunca se pierde.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info, warn};
use parking_lot::{Mutex, MutexGuard};
use well_domain::fields::{is_input_field, BUCKET_FIELD};
use well_domain::{DomainError, OilRecord};

use crate::engine::{CalculationEngine, RecomputeSummary};
use crate::errors::CoreError;
use crate::formula::CompiledFormulas;

pub struct LiveState {
    pub date: NaiveDate,
    pub records: Vec<OilRecord>,
    pub compiled: CompiledFormulas,
}

impl LiveState {
    fn index_of(&self, well_id: i64) -> Result<usize, CoreError> {
        self.records.iter().position(|r| r.well_id == well_id).ok_or(CoreError::UnknownWell(well_id))
    }

    /// Índices de los hermanos marcados de la plataforma, excluyendo `skip`.
    fn flagged_siblings(&self, platform: &str, skip: usize) -> Vec<usize> {
        self.records.iter()
                    .enumerate()
                    .filter(|(i, r)| *i != skip && r.shared_bucket && r.platform == platform)
                    .map(|(i, _)| i)
                    .collect()
    }
}

#[derive(Clone)]
pub struct ReportSession {
    state: Arc<Mutex<LiveState>>,
    engine: Arc<CalculationEngine>,
}

impl ReportSession {
    pub fn new(engine: CalculationEngine, date: NaiveDate, records: Vec<OilRecord>) -> Self {
        let state = LiveState { date, records, compiled: CompiledFormulas::default() };
        Self { state: Arc::new(Mutex::new(state)), engine: Arc::new(engine) }
    }

    /// Abre la sesión del día: usa el checkpoint si es de `today`, si no
    /// construye el conjunto con `fallback` (normalmente desde el store).
    pub fn open<F>(engine: CalculationEngine, today: NaiveDate, fallback: F) -> Result<Self, CoreError>
        where F: FnOnce() -> Result<Vec<OilRecord>, CoreError>
    {
        let restored = match engine.checkpoint().load(today) {
            Ok(found) => found,
            Err(e) => {
                warn!("session.checkpoint_unreadable error={}", e);
                None
            }
        };
        let records = match restored {
            Some(records) => {
                info!("session.restored date={} records={}", today, records.len());
                records
            }
            None => fallback()?,
        };
        Ok(Self::new(engine, today, records))
    }

    fn lock(&self, trigger: &str) -> MutexGuard<'_, LiveState> {
        if let Some(guard) = self.state.try_lock() {
            return guard;
        }
        debug!("session.waiting trigger={}", trigger);
        self.state.lock()
    }

    pub fn date(&self) -> NaiveDate {
        self.lock("date").date
    }

    pub fn snapshot(&self) -> Vec<OilRecord> {
        self.lock("snapshot").records.clone()
    }

    pub fn record(&self, well_id: i64) -> Option<OilRecord> {
        self.lock("record").records.iter().find(|r| r.well_id == well_id).cloned()
    }

    /// Reemplaza el caché de fórmulas sin recalcular.
    pub fn install_formulas(&self, compiled: CompiledFormulas) {
        self.lock("install").compiled = compiled;
    }

    pub fn recompute_all(&self) -> Result<RecomputeSummary, CoreError> {
        let mut guard = self.lock("recompute");
        let state = &mut *guard;
        self.engine.recompute(state.date, &mut state.records, &state.compiled)
    }

    /// Instala fórmulas nuevas y recalcula todo bajo el mismo lock.
    pub fn reload_formulas(&self, compiled: CompiledFormulas) -> Result<RecomputeSummary, CoreError> {
        let mut guard = self.lock("reload");
        let state = &mut *guard;
        state.compiled = compiled;
        self.engine.recompute(state.date, &mut state.records, &state.compiled)
    }

    /// Aplica una edición de campos de entrada a un pozo y recalcula el
    /// registro y, si cambió el volumen compartido, sus hermanos marcados.
    /// Devuelve los `well_id` recalculados.
    pub fn apply_edit(&self, well_id: i64, edits: &BTreeMap<String, String>) -> Result<Vec<i64>, CoreError> {
        if let Some(bad) = edits.keys().find(|k| !is_input_field(k)) {
            return Err(DomainError::Validation(format!("{bad} no es un campo editable")).into());
        }
        let mut guard = self.lock("edit");
        let state = &mut *guard;
        let idx = state.index_of(well_id)?;

        for (field, value) in edits {
            state.records[idx].set(field, value.trim())?;
        }

        let mut affected = vec![idx];
        if edits.contains_key(BUCKET_FIELD) && state.records[idx].shared_bucket {
            let value = state.records[idx].get(BUCKET_FIELD).to_string();
            let platform = state.records[idx].platform.clone();
            for sib in state.flagged_siblings(&platform, idx) {
                state.records[sib].set(BUCKET_FIELD, value.clone())?;
                affected.push(sib);
            }
        }

        self.engine.recompute_subset(state.date, &mut state.records, &affected, &state.compiled)?;
        Ok(affected.iter().map(|&i| state.records[i].well_id).collect())
    }

    /// Cambia la marca de volumen compartido de un pozo.
    ///
    /// Activarla copia el volumen del primer hermano marcado con valor;
    /// desactivarla deja en blanco el volumen propio.
    pub fn set_bucket_flag(&self, well_id: i64, shared: bool) -> Result<(), CoreError> {
        let mut guard = self.lock("bucket_flag");
        let state = &mut *guard;
        let idx = state.index_of(well_id)?;
        if state.records[idx].shared_bucket == shared {
            return Ok(());
        }

        let value = if shared {
            let platform = state.records[idx].platform.clone();
            state.flagged_siblings(&platform, idx)
                 .into_iter()
                 .map(|i| state.records[i].get(BUCKET_FIELD).to_string())
                 .find(|v| !v.trim().is_empty())
                 .unwrap_or_default()
        } else {
            String::new()
        };
        let record = &mut state.records[idx];
        record.shared_bucket = shared;
        record.set(BUCKET_FIELD, value)?;

        self.engine.recompute_subset(state.date, &mut state.records, &[idx], &state.compiled)?;
        Ok(())
    }

    /// Pasa el conjunto vivo a `today`: limpia todo salvo plataforma y pozo,
    /// reactiva la marca compartida y escribe el checkpoint. `false` si la
    /// sesión ya estaba en ese día.
    pub fn roll_over(&self, today: NaiveDate) -> Result<bool, CoreError> {
        let mut guard = self.lock("rollover");
        let state = &mut *guard;
        if state.date == today {
            return Ok(false);
        }
        info!("session.rollover from={} to={} records={}", state.date, today, state.records.len());
        for r in state.records.iter_mut() {
            r.reset_for(today);
        }
        state.date = today;
        self.engine.recompute(state.date, &mut state.records, &state.compiled)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{Checkpoint, InMemoryCheckpoint};
    use crate::formula::FormulaCompiler;
    use well_domain::FormulaDefinition;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn session(cp: Arc<InMemoryCheckpoint>) -> ReportSession {
        let records = vec![OilRecord::new(1, day(1), "P1", "A"),
                           OilRecord::new(2, day(1), "P1", "B"),
                           OilRecord::new(3, day(1), "P2", "C")];
        let s = ReportSession::new(CalculationEngine::new(cp), day(1), records);
        s.install_formulas(FormulaCompiler::compile(&[FormulaDefinition::new(1, "液量=合量斗数*2")]));
        s
    }

    fn edit(field: &str, value: &str) -> BTreeMap<String, String> {
        [(field.to_string(), value.to_string())].into_iter().collect()
    }

    #[test]
    fn bucket_edit_reaches_flagged_siblings() {
        let s = session(Arc::new(InMemoryCheckpoint::default()));
        let affected = s.apply_edit(1, &edit("total_bucket", "8")).unwrap();
        assert_eq!(affected, vec![1, 2]);
        assert_eq!(s.record(2).unwrap().get("total_bucket"), "8");
        assert_eq!(s.record(2).unwrap().get("liquid1"), "16");
        assert_eq!(s.record(3).unwrap().get("total_bucket"), "");
    }

    #[test]
    fn derived_fields_are_not_editable() {
        let s = session(Arc::new(InMemoryCheckpoint::default()));
        assert!(matches!(s.apply_edit(1, &edit("liquid1", "3")), Err(CoreError::Domain(_))));
        assert!(matches!(s.apply_edit(99, &edit("remark", "x")), Err(CoreError::UnknownWell(99))));
    }

    #[test]
    fn flag_toggle_blanks_then_restores_shared_value() {
        let s = session(Arc::new(InMemoryCheckpoint::default()));
        s.apply_edit(1, &edit("total_bucket", "8")).unwrap();
        s.set_bucket_flag(2, false).unwrap();
        assert_eq!(s.record(2).unwrap().get("total_bucket"), "");
        assert_eq!(s.record(2).unwrap().get("liquid1"), "");
        s.set_bucket_flag(2, true).unwrap();
        assert_eq!(s.record(2).unwrap().get("total_bucket"), "8");
    }

    #[test]
    fn rollover_clears_and_checkpoints_new_day() {
        let cp = Arc::new(InMemoryCheckpoint::default());
        let s = session(cp.clone());
        s.apply_edit(3, &edit("remark", "ok")).unwrap();
        s.set_bucket_flag(3, false).unwrap();
        assert!(s.roll_over(day(2)).unwrap());
        assert!(!s.roll_over(day(2)).unwrap());
        let r = s.record(3).unwrap();
        assert_eq!(r.report_date, day(2));
        assert!(r.shared_bucket);
        assert_eq!(r.get("remark"), "");
        assert_eq!(cp.load(day(2)).unwrap().map(|v| v.len()), Some(3));
    }

    #[test]
    fn open_prefers_same_day_checkpoint() {
        let cp = Arc::new(InMemoryCheckpoint::default());
        cp.save(day(1), &[OilRecord::new(7, day(1), "P9", "Z")]).unwrap();
        let s = ReportSession::open(CalculationEngine::new(cp.clone()), day(1), || Ok(Vec::new())).unwrap();
        assert_eq!(s.snapshot().len(), 1);
        let fresh = ReportSession::open(CalculationEngine::new(cp), day(2), || Ok(vec![OilRecord::new(1, day(2), "P", "W")]))
            .unwrap();
        assert_eq!(fresh.record(1).map(|r| r.well_code), Some("W".to_string()));
    }

    #[test]
    fn concurrent_edits_and_reloads_all_land() {
        let s = session(Arc::new(InMemoryCheckpoint::default()));
        let barrier = Arc::new(std::sync::Barrier::new(5));
        let mut handles = Vec::new();
        for n in 1..=4 {
            let (s, barrier) = (s.clone(), barrier.clone());
            handles.push(std::thread::spawn(move || {
                barrier.wait();
                s.apply_edit(3, &edit("remark", &format!("turno {n}"))).unwrap();
                s.apply_edit(1, &edit("total_bucket", "5")).unwrap();
            }));
        }
        let reloader = {
            let (s, barrier) = (s.clone(), barrier.clone());
            std::thread::spawn(move || {
                barrier.wait();
                s.reload_formulas(FormulaCompiler::compile(&[FormulaDefinition::new(1, "液量=合量斗数*3")])).unwrap();
            })
        };
        for h in handles {
            h.join().unwrap();
        }
        reloader.join().unwrap();

        // Ninguna edición se pierde y el último cálculo usa la fórmula nueva.
        assert!(s.record(3).unwrap().get("remark").starts_with("turno "));
        assert_eq!(s.record(1).unwrap().get("total_bucket"), "5");
        assert_eq!(s.record(2).unwrap().get("total_bucket"), "5");
        s.recompute_all().unwrap();
        assert_eq!(s.record(1).unwrap().get("liquid1"), "15");
        assert_eq!(s.record(2).unwrap().get("liquid1"), "15");
    }
}
