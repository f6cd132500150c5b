//! Escritura y lectura de reportes diarios.
//!
//! `upsert_report` es la única vía de escritura de datos de reporte: la
//! usan tanto la edición interactiva como la sincronización del motor.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use well_domain::{Node, OilRecord, OilReport, OilReportFields, PathKey, ReportFields, ReportKind, WaterReport,
                  WaterReportFields, Well};

use super::hierarchy::children_of;
use super::rows::{bucket_sign, NewOilRow, OilChanges, OilReportRow, WaterChanges, WaterReportRow, WellRow};
use super::{ConnectionProvider, EntityStore};
use crate::error::PersistenceError;
use crate::resolver::resolve_path;
use crate::schema::{oil_reports, water_reports, wells};

/// Resultado de `sync_oil_reports`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl<P: ConnectionProvider> EntityStore<P> {
    /// Busca por `(pozo, fecha)`: inserta si no existe, si existe sobrescribe
    /// campo a campo. El tipo de los campos debe coincidir con el del pozo.
    pub fn upsert_report(&self, well_id: i64, date: NaiveDate, fields: &ReportFields) -> Result<i64, PersistenceError> {
        let id = self.tx(|conn| upsert_report_in(conn, well_id, date, fields))?;
        debug!("store.upsert_report well={} date={} kind={} id={}", well_id, date, fields.kind(), id);
        Ok(id)
    }

    pub fn water_report(&self, well_id: i64, date: NaiveDate) -> Result<Option<WaterReport>, PersistenceError> {
        self.tx(|conn| {
                let row = water_reports::table.filter(water_reports::well_id.eq(well_id).and(water_reports::report_date.eq(date)))
                                              .first::<WaterReportRow>(conn)
                                              .optional()?;
                Ok(row.map(WaterReport::from))
            })
    }

    pub fn oil_report(&self, well_id: i64, date: NaiveDate) -> Result<Option<OilReport>, PersistenceError> {
        self.tx(|conn| fetch_oil_report(conn, well_id, date))
    }

    /// Reporte de petróleo del día anterior del mismo pozo.
    pub fn previous_day_report(&self, well_id: i64, date: NaiveDate) -> Result<Option<OilReport>, PersistenceError> {
        let Some(prev) = date.pred_opt() else {
            return Ok(None);
        };
        self.oil_report(well_id, prev)
    }

    /// Vuelca el conjunto vivo al store en una sola transacción. Los
    /// registros cuyo contenido guardado ya coincide se omiten.
    pub fn sync_oil_reports(&self, records: &[OilRecord]) -> Result<SyncSummary, PersistenceError> {
        let summary = self.tx(|conn| {
                              let mut summary = SyncSummary::default();
                              for record in records {
                                  match fetch_oil_report(conn, record.well_id, record.report_date)? {
                                      Some(stored) if same_content(&stored, record) => summary.skipped += 1,
                                      Some(_) => {
                                          upsert_oil(conn, record.well_id, record.report_date, &record.to_fields())?;
                                          summary.updated += 1;
                                      }
                                      None => {
                                          upsert_oil(conn, record.well_id, record.report_date, &record.to_fields())?;
                                          summary.inserted += 1;
                                      }
                                  }
                              }
                              Ok(summary)
                          })?;
        info!("store.sync inserted={} updated={} skipped={}",
              summary.inserted, summary.updated, summary.skipped);
        Ok(summary)
    }

    /// Un registro vivo por cada pozo de petróleo bajo `scope` (área,
    /// equipo o sala), tomando el reporte guardado de `today` si existe.
    pub fn load_live_records(&self, scope: &[PathKey], today: NaiveDate) -> Result<Vec<OilRecord>, PersistenceError> {
        let records = self.tx(|conn| {
                              let Some(root) = resolve_path(conn, scope)? else {
                                  return Ok(Vec::new());
                              };
                              let mut out = Vec::new();
                              collect_oil_wells(conn, &root, &mut Vec::new(), today, &mut out)?;
                              Ok(out)
                          })?;
        info!("store.live_records scope_len={} date={} records={}", scope.len(), today, records.len());
        Ok(records)
    }
}

fn upsert_report_in(conn: &mut SqliteConnection,
                    well_id: i64,
                    date: NaiveDate,
                    fields: &ReportFields)
                    -> Result<i64, PersistenceError> {
    let well: Well = wells::table.find(well_id).first::<WellRow>(conn).optional()?.ok_or(PersistenceError::NotFound)?.into();
    if well.kind() != fields.kind() {
        return Err(PersistenceError::Validation(format!("el pozo {} es de tipo {}, se recibieron campos {}",
                                                        well_id,
                                                        well.kind(),
                                                        fields.kind())));
    }
    match fields {
        ReportFields::Water(w) => upsert_water(conn, well_id, date, w),
        ReportFields::Oil(o) => {
            o.validate()?;
            upsert_oil(conn, well_id, date, o)
        }
    }
}

fn upsert_water(conn: &mut SqliteConnection,
                well_id: i64,
                date: NaiveDate,
                fields: &WaterReportFields)
                -> Result<i64, PersistenceError> {
    let existing = water_reports::table.filter(water_reports::well_id.eq(well_id).and(water_reports::report_date.eq(date)))
                                       .select(water_reports::id)
                                       .first::<i64>(conn)
                                       .optional()?;
    let changes = WaterChanges::from(fields);
    match existing {
        Some(id) => {
            // Un changeset vacío no es una sentencia válida.
            if *fields != WaterReportFields::default() {
                diesel::update(water_reports::table.find(id)).set(&changes).execute(conn)?;
            }
            Ok(id)
        }
        None => Ok(diesel::insert_into(water_reports::table).values((water_reports::well_id.eq(well_id),
                                                                     water_reports::report_date.eq(date),
                                                                     changes))
                                                             .returning(water_reports::id)
                                                             .get_result(conn)?),
    }
}

fn upsert_oil(conn: &mut SqliteConnection, well_id: i64, date: NaiveDate, fields: &OilReportFields) -> Result<i64, PersistenceError> {
    let existing = oil_reports::table.filter(oil_reports::well_id.eq(well_id).and(oil_reports::report_date.eq(date)))
                                     .first::<OilReportRow>(conn)
                                     .optional()?;
    match existing {
        Some(row) => {
            let mut values = row.values()?;
            overlay(&mut values, &fields.values);
            let json = serde_json::to_string(&values)?;
            let platform = fields.platform.as_deref().unwrap_or(&row.platform);
            let well_code = fields.well_code.as_deref().unwrap_or(&row.well_code);
            let sign = match fields.shared_bucket {
                Some(shared) => bucket_sign(shared),
                None => row.total_bucket_sign.as_str(),
            };
            diesel::update(oil_reports::table.find(row.id)).set(&OilChanges { platform,
                                                                              well_code,
                                                                              total_bucket_sign: sign,
                                                                              fields: &json })
                                                           .execute(conn)?;
            Ok(row.id)
        }
        None => {
            let mut values = BTreeMap::new();
            overlay(&mut values, &fields.values);
            let json = serde_json::to_string(&values)?;
            let new = NewOilRow { well_id,
                                  report_date: date,
                                  platform: fields.platform.as_deref().unwrap_or(""),
                                  well_code: fields.well_code.as_deref().unwrap_or(""),
                                  total_bucket_sign: bucket_sign(fields.shared_bucket.unwrap_or(true)),
                                  fields: &json };
            Ok(diesel::insert_into(oil_reports::table).values(&new).returning(oil_reports::id).get_result(conn)?)
        }
    }
}

/// Sobrescribe sólo las claves suministradas; un valor en blanco la borra.
fn overlay(values: &mut BTreeMap<String, String>, changes: &BTreeMap<String, String>) {
    for (k, v) in changes {
        let v = v.trim();
        if v.is_empty() {
            values.remove(k);
        } else {
            values.insert(k.clone(), v.to_string());
        }
    }
}

fn fetch_oil_report(conn: &mut SqliteConnection, well_id: i64, date: NaiveDate) -> Result<Option<OilReport>, PersistenceError> {
    let row = oil_reports::table.filter(oil_reports::well_id.eq(well_id).and(oil_reports::report_date.eq(date)))
                                .first::<OilReportRow>(conn)
                                .optional()?;
    row.map(OilReportRow::into_domain).transpose()
}

fn same_content(stored: &OilReport, record: &OilRecord) -> bool {
    if stored.platform.trim() != record.platform.trim()
       || stored.well_code.trim() != record.well_code.trim()
       || stored.shared_bucket != record.shared_bucket
    {
        return false;
    }
    record.to_fields().values.iter().all(|(k, v)| {
                                        let saved = stored.values.get(k).map(|s| s.trim()).unwrap_or("");
                                        saved == v.trim()
                                    })
}

/// Recorre el subárbol hasta los pozos de petróleo. `labels` acumula la
/// etiqueta de la plataforma en curso.
fn collect_oil_wells(conn: &mut SqliteConnection,
                     node: &Node,
                     labels: &mut Vec<String>,
                     today: NaiveDate,
                     out: &mut Vec<OilRecord>)
                     -> Result<(), PersistenceError> {
    match node {
        Node::ReportType(rt) if rt.kind != ReportKind::Oil => Ok(()),
        Node::Platform(p) => {
            labels.push(p.label.clone());
            for child in children_of(conn, node)? {
                collect_oil_wells(conn, &child, labels, today, out)?;
            }
            labels.pop();
            Ok(())
        }
        Node::Well(w) => {
            if w.kind() != ReportKind::Oil {
                return Ok(());
            }
            let record = match fetch_oil_report(conn, w.id, today)? {
                Some(report) => OilRecord::from_report(&report),
                None => {
                    let platform = labels.last().cloned().unwrap_or_default();
                    OilRecord::new(w.id, today, platform, w.code.clone())
                }
            };
            out.push(record);
            Ok(())
        }
        Node::WaterReport(_) | Node::OilReport(_) => Ok(()),
        other => {
            for child in children_of(conn, other)? {
                collect_oil_wells(conn, &child, labels, today, out)?;
            }
            Ok(())
        }
    }
}
