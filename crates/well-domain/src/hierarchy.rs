//! Jerarquía fija de entidades:
//! área → equipo → sala de medición → tipo de reporte → (plataforma) → pozo.
//!
//! Los pozos de tipo Agua cuelgan directamente del tipo de reporte; los de
//! tipo Petróleo siempre cuelgan de una plataforma.
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::reports::{OilReport, WaterReport};
use crate::DomainError;

/// Clase de reporte asociada a una sala. Como máximo uno de cada tipo por sala.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    Water,
    Oil,
}

impl ReportKind {
    /// Código estable persistido en la columna `kind`.
    pub fn code(&self) -> &'static str {
        match self {
            ReportKind::Water => "water",
            ReportKind::Oil => "oil",
        }
    }

    /// Etiqueta legible usada por los operadores.
    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::Water => "水报",
            ReportKind::Oil => "油报",
        }
    }

    /// Compara contra cualquier forma aceptada de la clave natural.
    pub fn matches_key(&self, key: &str) -> bool {
        key.parse::<ReportKind>().map(|k| k == *self).unwrap_or(false)
    }
}

impl FromStr for ReportKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "water" | "Water" | "WATER" | "水报" => Ok(ReportKind::Water),
            "oil" | "Oil" | "OIL" | "油报" => Ok(ReportKind::Oil),
            other => Err(DomainError::UnknownReportKind(other.to_string())),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub area_id: i64,
    pub seq_no: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    pub team_id: i64,
    pub code: String,
    pub is_injection: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportType {
    pub id: i64,
    pub room_id: i64,
    pub kind: ReportKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: i64,
    pub report_type_id: i64,
    pub label: String,
}

/// Pozo. `platform_id` es `Some` si y sólo si el pozo pertenece a un reporte
/// de petróleo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Well {
    pub id: i64,
    pub room_id: i64,
    pub report_type_id: i64,
    pub platform_id: Option<i64>,
    pub code: String,
}

impl Well {
    pub fn kind(&self) -> ReportKind {
        if self.platform_id.is_some() {
            ReportKind::Oil
        } else {
            ReportKind::Water
        }
    }
}

/// Dueño directo de un pozo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellOwner {
    /// Tipo de reporte (debe ser de agua).
    ReportType(i64),
    /// Plataforma (bajo un tipo de reporte de petróleo).
    Platform(i64),
}

/// Niveles direccionables de la jerarquía.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Area,
    Team,
    Room,
    ReportType,
    Platform,
    Well,
    WaterReport,
    OilReport,
}

impl Level {
    pub fn name(&self) -> &'static str {
        match self {
            Level::Area => "area",
            Level::Team => "team",
            Level::Room => "room",
            Level::ReportType => "report_type",
            Level::Platform => "platform",
            Level::Well => "well",
            Level::WaterReport => "water_report",
            Level::OilReport => "oil_report",
        }
    }
}

impl FromStr for Level {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "area" => Ok(Level::Area),
            "team" => Ok(Level::Team),
            "room" => Ok(Level::Room),
            "report_type" | "bao" => Ok(Level::ReportType),
            "platform" => Ok(Level::Platform),
            "well" => Ok(Level::Well),
            "water_report" | "report" => Ok(Level::WaterReport),
            "oil_report" => Ok(Level::OilReport),
            other => Err(DomainError::Validation(format!("nivel desconocido: {other}"))),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Clave de búsqueda de un nodo: id numérico o clave natural.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKey {
    Id(i64),
    Name(String),
}

impl From<i64> for NodeKey {
    fn from(id: i64) -> Self {
        NodeKey::Id(id)
    }
}

impl From<&str> for NodeKey {
    fn from(name: &str) -> Self {
        NodeKey::Name(name.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(name: String) -> Self {
        NodeKey::Name(name)
    }
}

/// Elemento de una ruta compuesta para `SequenceResolver`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKey {
    Id(i64),
    Name(String),
    Date(NaiveDate),
}

impl PathKey {
    /// Interpreta un segmento textual: fecha ISO, entero o nombre.
    pub fn parse(segment: &str) -> Self {
        if let Ok(d) = NaiveDate::parse_from_str(segment, "%Y-%m-%d") {
            return PathKey::Date(d);
        }
        if let Ok(id) = segment.parse::<i64>() {
            return PathKey::Id(id);
        }
        PathKey::Name(segment.to_string())
    }
}

impl From<i64> for PathKey {
    fn from(id: i64) -> Self {
        PathKey::Id(id)
    }
}

impl From<&str> for PathKey {
    fn from(name: &str) -> Self {
        PathKey::Name(name.to_string())
    }
}

impl From<NaiveDate> for PathKey {
    fn from(date: NaiveDate) -> Self {
        PathKey::Date(date)
    }
}

/// Cualquier fila de la jerarquía, incluidos los reportes hoja.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Area(Area),
    Team(Team),
    Room(Room),
    ReportType(ReportType),
    Platform(Platform),
    Well(Well),
    WaterReport(WaterReport),
    OilReport(OilReport),
}

impl Node {
    pub fn level(&self) -> Level {
        match self {
            Node::Area(_) => Level::Area,
            Node::Team(_) => Level::Team,
            Node::Room(_) => Level::Room,
            Node::ReportType(_) => Level::ReportType,
            Node::Platform(_) => Level::Platform,
            Node::Well(_) => Level::Well,
            Node::WaterReport(_) => Level::WaterReport,
            Node::OilReport(_) => Level::OilReport,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Node::Area(a) => a.id,
            Node::Team(t) => t.id,
            Node::Room(r) => r.id,
            Node::ReportType(b) => b.id,
            Node::Platform(p) => p.id,
            Node::Well(w) => w.id,
            Node::WaterReport(r) => r.id,
            Node::OilReport(r) => r.id,
        }
    }

    /// Clave natural textual (los reportes usan la fecha ISO).
    pub fn natural_key(&self) -> String {
        match self {
            Node::Area(a) => a.name.clone(),
            Node::Team(t) => t.name.clone(),
            Node::Room(r) => r.code.clone(),
            Node::ReportType(b) => b.kind.code().to_string(),
            Node::Platform(p) => p.label.clone(),
            Node::Well(w) => w.code.clone(),
            Node::WaterReport(r) => r.report_date.to_string(),
            Node::OilReport(r) => r.report_date.to_string(),
        }
    }

    /// Coincidencia por id o por clave natural. Un segmento numérico también
    /// se compara con códigos numéricos y con el número de secuencia del equipo.
    pub fn matches(&self, key: &PathKey) -> bool {
        match key {
            PathKey::Id(id) => self.id() == *id || self.matches_number(*id),
            PathKey::Name(name) => match self {
                Node::ReportType(b) => b.kind.matches_key(name),
                Node::Team(t) => t.name == *name || t.seq_no.to_string() == *name,
                other => other.natural_key() == *name,
            },
            PathKey::Date(d) => match self {
                Node::WaterReport(r) => r.report_date == *d,
                Node::OilReport(r) => r.report_date == *d,
                _ => false,
            },
        }
    }
}

impl Node {
    fn matches_number(&self, n: i64) -> bool {
        match self {
            Node::Team(t) => i64::from(t.seq_no) == n,
            Node::Area(_) | Node::Room(_) | Node::Platform(_) | Node::Well(_) => self.natural_key() == n.to_string(),
            Node::ReportType(_) | Node::WaterReport(_) | Node::OilReport(_) => false,
        }
    }
}
