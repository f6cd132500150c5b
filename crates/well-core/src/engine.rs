//! Motor de cálculo sobre el conjunto vivo de reportes de petróleo.
//!
//! Un recálculo hace tres cosas, en orden:
//! 1. propaga el volumen compartido entre hermanos marcados de cada plataforma;
//! 2. evalúa cada fórmula compilada una vez por registro (en paralelo);
//! 3. escribe el checkpoint completo del día.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use log::{info, warn};
use rayon::prelude::*;
use well_domain::fields::{is_bucket_variant_target, is_oil_field, MeterMode, BUCKET_FIELD, LIQUID_PER_BUCKET, TIME_SIGN_FIELD};
use well_domain::OilRecord;

use crate::checkpoint::Checkpoint;
use crate::errors::CoreError;
use crate::eval::evaluate_compiled;
use crate::formula::{CompiledFormula, CompiledFormulas};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecomputeSummary {
    pub records: usize,
    /// Campos con valor tras el recálculo.
    pub computed: usize,
    /// Campos que quedaron en blanco (dependencia faltante o error).
    pub blank: usize,
}

impl RecomputeSummary {
    fn merge(self, other: Self) -> Self {
        Self { records: self.records + other.records,
               computed: self.computed + other.computed,
               blank: self.blank + other.blank }
    }
}

pub struct CalculationEngine {
    checkpoint: Arc<dyn Checkpoint>,
}

impl CalculationEngine {
    pub fn new(checkpoint: Arc<dyn Checkpoint>) -> Self {
        Self { checkpoint }
    }

    pub fn checkpoint(&self) -> &Arc<dyn Checkpoint> {
        &self.checkpoint
    }

    /// Recalcula todos los registros y sobrescribe el checkpoint de `date`.
    pub fn recompute(&self, date: NaiveDate, records: &mut [OilRecord], compiled: &CompiledFormulas) -> Result<RecomputeSummary, CoreError> {
        propagate_shared_buckets(records);
        let summary = records.par_iter_mut()
                             .map(|r| apply_formulas(r, compiled))
                             .reduce(RecomputeSummary::default, RecomputeSummary::merge);
        self.checkpoint.save(date, records)?;
        info!("engine.recomputed date={} records={} computed={} blank={}",
              date, summary.records, summary.computed, summary.blank);
        Ok(summary)
    }

    /// Recalcula sólo los registros indicados (edición interactiva) sin
    /// pre-pase de volumen compartido, y escribe el checkpoint completo.
    pub fn recompute_subset(&self,
                            date: NaiveDate,
                            records: &mut [OilRecord],
                            indices: &[usize],
                            compiled: &CompiledFormulas)
                            -> Result<RecomputeSummary, CoreError> {
        let mut summary = RecomputeSummary::default();
        for &i in indices {
            if let Some(record) = records.get_mut(i) {
                summary = summary.merge(apply_formulas(record, compiled));
            }
        }
        self.checkpoint.save(date, records)?;
        Ok(summary)
    }
}

/// Copia el primer volumen no vacío de cada plataforma a todos sus
/// registros marcados. Los registros sin marca no se tocan.
pub fn propagate_shared_buckets(records: &mut [OilRecord]) {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, r) in records.iter().enumerate() {
        if r.shared_bucket {
            groups.entry(r.platform.clone()).or_default().push(i);
        }
    }
    for (platform, members) in groups {
        let source = members.iter()
                            .map(|&i| records[i].get(BUCKET_FIELD).trim())
                            .find(|v| !v.is_empty())
                            .map(str::to_string);
        let Some(value) = source else { continue };
        for &i in &members {
            if records[i].get(BUCKET_FIELD) != value {
                log::debug!("engine.bucket_propagated platform={} well_id={} value={}", platform, records[i].well_id, value);
                put(&mut records[i], BUCKET_FIELD, value.clone());
            }
        }
    }
}

/// Fórmula de líquido por cubeta aplicable según `time_sign`. Sin marca de
/// tiempo no hay fórmula; una marca no reconocida usa la fórmula simple.
pub fn bucket_variant<'a>(record: &OilRecord, compiled: &'a CompiledFormulas) -> Option<&'a CompiledFormula> {
    let sign = record.get(TIME_SIGN_FIELD).trim();
    if sign.is_empty() {
        return None;
    }
    MeterMode::from_time_sign(sign).and_then(|m| compiled.get(m.target()))
                                   .or_else(|| compiled.get(LIQUID_PER_BUCKET))
}

/// Evalúa todas las fórmulas sobre un registro.
pub fn apply_formulas(record: &mut OilRecord, compiled: &CompiledFormulas) -> RecomputeSummary {
    let mut summary = RecomputeSummary { records: 1, ..Default::default() };
    let mut write = |record: &mut OilRecord, field: &str, value: String| {
        if value.is_empty() {
            summary.blank += 1;
        } else {
            summary.computed += 1;
        }
        put(record, field, value);
    };

    // La variante se escribe primero: el resto la lee como dependencia hoja.
    let has_bucket_family = compiled.targets().chain(compiled.broken().keys().map(String::as_str))
                                    .any(is_bucket_variant_target);
    if has_bucket_family {
        let value = bucket_variant(record, compiled).map(|f| evaluate_compiled(f, record.values()))
                                                    .unwrap_or_default();
        write(record, LIQUID_PER_BUCKET, value);
    }

    for formula in compiled.iter() {
        if is_bucket_variant_target(&formula.target) || !is_oil_field(&formula.target) {
            continue;
        }
        let value = evaluate_compiled(formula, record.values());
        write(record, &formula.target, value);
    }

    for target in compiled.broken().keys() {
        if is_oil_field(target) && !is_bucket_variant_target(target) {
            write(record, target, String::new());
        }
    }
    summary
}

fn put(record: &mut OilRecord, field: &str, value: String) {
    if let Err(e) = record.set(field, value) {
        warn!("engine.write_failed well_id={} field={} error={}", record.well_id, field, e);
    }
}
