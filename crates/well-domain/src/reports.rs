//! Reportes de agua y petróleo, escrituras parciales y el registro vivo del día.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::{is_derived_field, is_oil_field, OIL_DERIVED_FIELDS, OIL_INPUT_FIELDS};
use crate::{DomainError, ReportKind};

/// Reporte diario de un pozo inyector de agua.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterReport {
    pub id: i64,
    pub well_id: i64,
    pub report_date: NaiveDate,
    pub injection_mode: Option<String>,
    pub prod_hours: Option<i32>,
    pub trunk_pressure: Option<f64>,
    pub oil_pressure: Option<f64>,
    pub casing_pressure: Option<f64>,
    pub wellhead_pressure: Option<f64>,
    pub plan_inject: Option<f64>,
    pub actual_inject: Option<f64>,
    pub remark: Option<String>,
    pub meter_stage1: Option<f64>,
    pub meter_stage2: Option<f64>,
    pub meter_stage3: Option<f64>,
}

/// Escritura parcial de un reporte de agua: `None` significa "no tocar".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterReportFields {
    pub injection_mode: Option<String>,
    pub prod_hours: Option<i32>,
    pub trunk_pressure: Option<f64>,
    pub oil_pressure: Option<f64>,
    pub casing_pressure: Option<f64>,
    pub wellhead_pressure: Option<f64>,
    pub plan_inject: Option<f64>,
    pub actual_inject: Option<f64>,
    pub remark: Option<String>,
    pub meter_stage1: Option<f64>,
    pub meter_stage2: Option<f64>,
    pub meter_stage3: Option<f64>,
}

impl WaterReportFields {
    pub fn with_injection_mode(mut self, mode: impl Into<String>) -> Self {
        self.injection_mode = Some(mode.into());
        self
    }
}

/// Reporte de petróleo persistido (entradas + campos calculados).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OilReport {
    pub id: i64,
    pub well_id: i64,
    pub report_date: NaiveDate,
    pub platform: String,
    pub well_code: String,
    pub shared_bucket: bool,
    pub values: BTreeMap<String, String>,
}

/// Escritura parcial de un reporte de petróleo.
///
/// Sólo las claves presentes en `values` se sobrescriben; la identidad
/// (`id`, `well_id`, fecha) nunca forma parte del merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OilReportFields {
    pub platform: Option<String>,
    pub well_code: Option<String>,
    pub shared_bucket: Option<bool>,
    pub values: BTreeMap<String, String>,
}

impl OilReportFields {
    pub fn set(mut self, field: &str, value: impl Into<String>) -> Self {
        self.values.insert(field.to_string(), value.into());
        self
    }

    /// Rechaza claves que no son campos del reporte.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self.values.keys().find(|k| !is_oil_field(k)) {
            Some(bad) => Err(DomainError::UnknownField(bad.clone())),
            None => Ok(()),
        }
    }
}

/// Datos de escritura para `upsert_report`, según el tipo del pozo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReportFields {
    Water(WaterReportFields),
    Oil(OilReportFields),
}

impl ReportFields {
    pub fn kind(&self) -> ReportKind {
        match self {
            ReportFields::Water(_) => ReportKind::Water,
            ReportFields::Oil(_) => ReportKind::Oil,
        }
    }
}

/// Reporte de petróleo vivo (en memoria) del día en curso.
///
/// Identidad: `(well_id, report_date)`. Los valores se guardan como texto,
/// tal como se capturan; el evaluador decide qué es numérico.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OilRecord {
    pub well_id: i64,
    pub report_date: NaiveDate,
    pub platform: String,
    pub well_code: String,
    /// Marca "contribuye al volumen compartido" (是/否).
    pub shared_bucket: bool,
    values: BTreeMap<String, String>,
}

impl OilRecord {
    /// Registro vacío; la marca compartida arranca activa.
    pub fn new(well_id: i64, report_date: NaiveDate, platform: impl Into<String>, well_code: impl Into<String>) -> Self {
        Self { well_id,
               report_date,
               platform: platform.into(),
               well_code: well_code.into(),
               shared_bucket: true,
               values: BTreeMap::new() }
    }

    pub fn from_report(report: &OilReport) -> Self {
        Self { well_id: report.well_id,
               report_date: report.report_date,
               platform: report.platform.clone(),
               well_code: report.well_code.clone(),
               shared_bucket: report.shared_bucket,
               values: report.values.clone() }
    }

    /// Valor actual del campo ("" si está en blanco).
    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) -> Result<(), DomainError> {
        if !is_oil_field(field) {
            return Err(DomainError::UnknownField(field.to_string()));
        }
        let value = value.into();
        if value.is_empty() {
            self.values.remove(field);
        } else {
            self.values.insert(field.to_string(), value);
        }
        Ok(())
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    /// Borra todos los campos calculados.
    pub fn clear_derived(&mut self) {
        self.values.retain(|k, _| !is_derived_field(k));
    }

    /// Reinicio diario: todo queda en blanco salvo plataforma y pozo.
    pub fn reset_for(&mut self, date: NaiveDate) {
        self.report_date = date;
        self.shared_bucket = true;
        self.values.clear();
    }

    /// Campos para escribir en el store (incluye blancos explícitos para que el
    /// merge limpie valores previos).
    pub fn to_fields(&self) -> OilReportFields {
        let values = OIL_INPUT_FIELDS.iter()
                                     .chain(OIL_DERIVED_FIELDS.iter())
                                     .map(|f| (f.to_string(), self.get(f).to_string()))
                                     .collect();
        OilReportFields { platform: Some(self.platform.clone()),
                          well_code: Some(self.well_code.clone()),
                          shared_bucket: Some(self.shared_bucket),
                          values }
    }
}
