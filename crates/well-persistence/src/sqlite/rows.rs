//! Filas Diesel y su conversión a tipos de dominio.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use diesel::prelude::*;
use well_domain::{Area, OilReport, Platform, ReportKind, ReportType, Room, Team, WaterReport, WaterReportFields, Well};

use crate::error::PersistenceError;
use crate::schema::{formula_definitions, oil_reports, water_reports, wells};

pub const BUCKET_SIGN_YES: &str = "是";
pub const BUCKET_SIGN_NO: &str = "否";

pub fn bucket_sign(shared: bool) -> &'static str {
    if shared {
        BUCKET_SIGN_YES
    } else {
        BUCKET_SIGN_NO
    }
}

#[derive(Queryable, Debug)]
pub struct AreaRow {
    pub id: i64,
    pub name: String,
}

impl From<AreaRow> for Area {
    fn from(r: AreaRow) -> Self {
        Area { id: r.id, name: r.name }
    }
}

#[derive(Queryable, Debug)]
pub struct TeamRow {
    pub id: i64,
    pub area_id: i64,
    pub seq_no: i32,
    pub name: String,
}

impl From<TeamRow> for Team {
    fn from(r: TeamRow) -> Self {
        Team { id: r.id, area_id: r.area_id, seq_no: r.seq_no, name: r.name }
    }
}

#[derive(Queryable, Debug)]
pub struct RoomRow {
    pub id: i64,
    pub team_id: i64,
    pub code: String,
    pub is_injection: bool,
}

impl From<RoomRow> for Room {
    fn from(r: RoomRow) -> Self {
        Room { id: r.id, team_id: r.team_id, code: r.code, is_injection: r.is_injection }
    }
}

#[derive(Queryable, Debug)]
pub struct ReportTypeRow {
    pub id: i64,
    pub room_id: i64,
    pub kind: String,
}

impl TryFrom<ReportTypeRow> for ReportType {
    type Error = PersistenceError;

    fn try_from(r: ReportTypeRow) -> Result<Self, Self::Error> {
        let kind: ReportKind = r.kind.parse()?;
        Ok(ReportType { id: r.id, room_id: r.room_id, kind })
    }
}

#[derive(Queryable, Debug)]
pub struct PlatformRow {
    pub id: i64,
    pub report_type_id: i64,
    pub label: String,
}

impl From<PlatformRow> for Platform {
    fn from(r: PlatformRow) -> Self {
        Platform { id: r.id, report_type_id: r.report_type_id, label: r.label }
    }
}

#[derive(Queryable, Debug)]
pub struct WellRow {
    pub id: i64,
    pub room_id: i64,
    pub report_type_id: i64,
    pub platform_id: Option<i64>,
    pub code: String,
}

impl From<WellRow> for Well {
    fn from(r: WellRow) -> Self {
        Well { id: r.id, room_id: r.room_id, report_type_id: r.report_type_id, platform_id: r.platform_id, code: r.code }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = wells)]
pub struct NewWellRow<'a> {
    pub room_id: i64,
    pub report_type_id: i64,
    pub platform_id: Option<i64>,
    pub code: &'a str,
}

#[derive(Queryable, Debug)]
pub struct WaterReportRow {
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

impl From<WaterReportRow> for WaterReport {
    fn from(r: WaterReportRow) -> Self {
        WaterReport { id: r.id,
                      well_id: r.well_id,
                      report_date: r.report_date,
                      injection_mode: r.injection_mode,
                      prod_hours: r.prod_hours,
                      trunk_pressure: r.trunk_pressure,
                      oil_pressure: r.oil_pressure,
                      casing_pressure: r.casing_pressure,
                      wellhead_pressure: r.wellhead_pressure,
                      plan_inject: r.plan_inject,
                      actual_inject: r.actual_inject,
                      remark: r.remark,
                      meter_stage1: r.meter_stage1,
                      meter_stage2: r.meter_stage2,
                      meter_stage3: r.meter_stage3 }
    }
}

/// Cambios de un reporte de agua: los `None` no se escriben (merge por campo).
#[derive(AsChangeset, Insertable, Debug)]
#[diesel(table_name = water_reports)]
pub struct WaterChanges<'a> {
    pub injection_mode: Option<&'a str>,
    pub prod_hours: Option<i32>,
    pub trunk_pressure: Option<f64>,
    pub oil_pressure: Option<f64>,
    pub casing_pressure: Option<f64>,
    pub wellhead_pressure: Option<f64>,
    pub plan_inject: Option<f64>,
    pub actual_inject: Option<f64>,
    pub remark: Option<&'a str>,
    pub meter_stage1: Option<f64>,
    pub meter_stage2: Option<f64>,
    pub meter_stage3: Option<f64>,
}

impl<'a> From<&'a WaterReportFields> for WaterChanges<'a> {
    fn from(f: &'a WaterReportFields) -> Self {
        WaterChanges { injection_mode: f.injection_mode.as_deref(),
                       prod_hours: f.prod_hours,
                       trunk_pressure: f.trunk_pressure,
                       oil_pressure: f.oil_pressure,
                       casing_pressure: f.casing_pressure,
                       wellhead_pressure: f.wellhead_pressure,
                       plan_inject: f.plan_inject,
                       actual_inject: f.actual_inject,
                       remark: f.remark.as_deref(),
                       meter_stage1: f.meter_stage1,
                       meter_stage2: f.meter_stage2,
                       meter_stage3: f.meter_stage3 }
    }
}

#[derive(Queryable, Debug)]
pub struct OilReportRow {
    pub id: i64,
    pub well_id: i64,
    pub report_date: NaiveDate,
    pub platform: String,
    pub well_code: String,
    pub total_bucket_sign: String,
    pub fields: String,
}

impl OilReportRow {
    pub fn values(&self) -> Result<BTreeMap<String, String>, PersistenceError> {
        Ok(serde_json::from_str(&self.fields)?)
    }

    pub fn into_domain(self) -> Result<OilReport, PersistenceError> {
        let values = self.values()?;
        Ok(OilReport { id: self.id,
                       well_id: self.well_id,
                       report_date: self.report_date,
                       platform: self.platform,
                       well_code: self.well_code,
                       shared_bucket: self.total_bucket_sign != BUCKET_SIGN_NO,
                       values })
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = oil_reports)]
pub struct NewOilRow<'a> {
    pub well_id: i64,
    pub report_date: NaiveDate,
    pub platform: &'a str,
    pub well_code: &'a str,
    pub total_bucket_sign: &'a str,
    pub fields: &'a str,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = oil_reports)]
pub struct OilChanges<'a> {
    pub platform: &'a str,
    pub well_code: &'a str,
    pub total_bucket_sign: &'a str,
    pub fields: &'a str,
}

#[derive(Queryable, Debug)]
pub struct FormulaRow {
    pub id: i64,
    pub formula: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = formula_definitions)]
pub struct NewFormulaRow<'a> {
    pub formula: &'a str,
}

