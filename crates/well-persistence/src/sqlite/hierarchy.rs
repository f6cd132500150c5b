//! Upsert idempotente, listado de hijos y borrado en cascada de la jerarquía.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, info};
use well_domain::{Area, Level, Node, NodeKey, Platform, ReportKind, ReportType, Room, Team, Well, WellOwner};

use super::rows::{AreaRow, NewWellRow, OilReportRow, PlatformRow, ReportTypeRow, RoomRow, TeamRow, WaterReportRow, WellRow};
use super::{ConnectionProvider, EntityStore};
use crate::error::PersistenceError;
use crate::schema::{areas, oil_reports, platforms, report_types, rooms, teams, water_reports, wells};

/// Nodo a crear o actualizar: padre + clave natural + atributos.
#[derive(Debug, Clone, PartialEq)]
pub enum NewNode {
    Area { name: String },
    /// `name` es atributo mutable; la clave natural es `(area_id, seq_no)`.
    Team { area_id: i64, seq_no: i32, name: String },
    Room { team_id: i64, code: String, is_injection: bool },
    ReportType { room_id: i64, kind: ReportKind },
    Platform { report_type_id: i64, label: String },
    Well { owner: WellOwner, code: String },
}

impl NewNode {
    pub fn level(&self) -> Level {
        match self {
            NewNode::Area { .. } => Level::Area,
            NewNode::Team { .. } => Level::Team,
            NewNode::Room { .. } => Level::Room,
            NewNode::ReportType { .. } => Level::ReportType,
            NewNode::Platform { .. } => Level::Platform,
            NewNode::Well { .. } => Level::Well,
        }
    }
}

impl<P: ConnectionProvider> EntityStore<P> {
    /// Inserta el nodo o, si ya existe `(padre, clave)`, actualiza sus
    /// atributos mutables. Devuelve el id en ambos casos.
    pub fn upsert(&self, node: &NewNode) -> Result<i64, PersistenceError> {
        let id = self.tx(|conn| upsert_node(conn, node))?;
        debug!("store.upsert level={} id={}", node.level(), id);
        Ok(id)
    }

    pub fn upsert_area(&self, name: &str) -> Result<i64, PersistenceError> {
        self.upsert(&NewNode::Area { name: name.to_string() })
    }

    pub fn upsert_team(&self, area_id: i64, seq_no: i32, name: &str) -> Result<i64, PersistenceError> {
        self.upsert(&NewNode::Team { area_id, seq_no, name: name.to_string() })
    }

    pub fn upsert_room(&self, team_id: i64, code: &str, is_injection: bool) -> Result<i64, PersistenceError> {
        self.upsert(&NewNode::Room { team_id, code: code.to_string(), is_injection })
    }

    pub fn upsert_report_type(&self, room_id: i64, kind: ReportKind) -> Result<i64, PersistenceError> {
        self.upsert(&NewNode::ReportType { room_id, kind })
    }

    pub fn upsert_platform(&self, report_type_id: i64, label: &str) -> Result<i64, PersistenceError> {
        self.upsert(&NewNode::Platform { report_type_id, label: label.to_string() })
    }

    pub fn upsert_well(&self, owner: WellOwner, code: &str) -> Result<i64, PersistenceError> {
        self.upsert(&NewNode::Well { owner, code: code.to_string() })
    }

    /// Raíz del árbol: todas las áreas, ordenadas por nombre.
    pub fn list_areas(&self) -> Result<Vec<Area>, PersistenceError> {
        self.tx(|conn| {
                let rows: Vec<AreaRow> = areas::table.order(areas::name.asc()).load(conn)?;
                Ok(rows.into_iter().map(Area::from).collect())
            })
    }

    /// Hijos inmediatos del nodo `(level, key)`. Vacío si el padre no existe.
    pub fn list_children(&self, level: Level, key: &NodeKey) -> Result<Vec<Node>, PersistenceError> {
        self.tx(|conn| match find_node(conn, level, key)? {
                    Some(parent) => children_of(conn, &parent),
                    None => Ok(Vec::new()),
                })
    }

    /// Busca un nodo por id o clave natural (primera coincidencia por id).
    pub fn find(&self, level: Level, key: &NodeKey) -> Result<Option<Node>, PersistenceError> {
        self.tx(|conn| find_node(conn, level, key))
    }

    /// Borra el nodo y todo su subárbol, en profundidad y en una sola
    /// transacción. Devuelve el número de filas eliminadas.
    pub fn delete(&self, level: Level, id: i64) -> Result<usize, PersistenceError> {
        let removed = self.tx(|conn| {
                              let Some(node) = find_node(conn, level, &NodeKey::Id(id))? else {
                                  return Err(PersistenceError::NotFound);
                              };
                              delete_node(conn, &node)
                          })?;
        info!("store.delete level={} id={} rows={}", level, id, removed);
        Ok(removed)
    }
}

fn upsert_node(conn: &mut SqliteConnection, node: &NewNode) -> Result<i64, PersistenceError> {
    match node {
        NewNode::Area { name } => {
            if let Some(id) = areas::table.filter(areas::name.eq(name)).select(areas::id).first::<i64>(conn).optional()? {
                return Ok(id);
            }
            Ok(diesel::insert_into(areas::table).values(areas::name.eq(name))
                                                 .returning(areas::id)
                                                 .get_result(conn)?)
        }
        NewNode::Team { area_id, seq_no, name } => {
            let existing = teams::table.filter(teams::area_id.eq(*area_id).and(teams::seq_no.eq(*seq_no)))
                                       .select(teams::id)
                                       .first::<i64>(conn)
                                       .optional()?;
            if let Some(id) = existing {
                diesel::update(teams::table.find(id)).set(teams::name.eq(name)).execute(conn)?;
                return Ok(id);
            }
            Ok(diesel::insert_into(teams::table).values((teams::area_id.eq(*area_id), teams::seq_no.eq(*seq_no), teams::name.eq(name)))
                                                 .returning(teams::id)
                                                 .get_result(conn)?)
        }
        NewNode::Room { team_id, code, is_injection } => {
            let existing = rooms::table.filter(rooms::team_id.eq(*team_id).and(rooms::code.eq(code)))
                                       .select(rooms::id)
                                       .first::<i64>(conn)
                                       .optional()?;
            if let Some(id) = existing {
                diesel::update(rooms::table.find(id)).set(rooms::is_injection.eq(*is_injection)).execute(conn)?;
                return Ok(id);
            }
            Ok(diesel::insert_into(rooms::table).values((rooms::team_id.eq(*team_id),
                                                         rooms::code.eq(code),
                                                         rooms::is_injection.eq(*is_injection)))
                                                 .returning(rooms::id)
                                                 .get_result(conn)?)
        }
        NewNode::ReportType { room_id, kind } => {
            let existing = report_types::table.filter(report_types::room_id.eq(*room_id).and(report_types::kind.eq(kind.code())))
                                              .select(report_types::id)
                                              .first::<i64>(conn)
                                              .optional()?;
            if let Some(id) = existing {
                return Ok(id);
            }
            Ok(diesel::insert_into(report_types::table).values((report_types::room_id.eq(*room_id), report_types::kind.eq(kind.code())))
                                                        .returning(report_types::id)
                                                        .get_result(conn)?)
        }
        NewNode::Platform { report_type_id, label } => {
            let rt = load_report_type(conn, *report_type_id)?;
            if rt.kind != ReportKind::Oil {
                return Err(PersistenceError::Validation(format!("report_type {} no es de petróleo: no admite plataformas", rt.id)));
            }
            let existing = platforms::table.filter(platforms::report_type_id.eq(*report_type_id).and(platforms::label.eq(label)))
                                           .select(platforms::id)
                                           .first::<i64>(conn)
                                           .optional()?;
            if let Some(id) = existing {
                return Ok(id);
            }
            Ok(diesel::insert_into(platforms::table).values((platforms::report_type_id.eq(*report_type_id), platforms::label.eq(label)))
                                                     .returning(platforms::id)
                                                     .get_result(conn)?)
        }
        NewNode::Well { owner, code } => upsert_well(conn, *owner, code),
    }
}

fn load_report_type(conn: &mut SqliteConnection, id: i64) -> Result<ReportType, PersistenceError> {
    let row: ReportTypeRow = report_types::table.find(id).first(conn)?;
    ReportType::try_from(row)
}

/// El dueño determina el tipo de pozo: un tipo de reporte de agua o una
/// plataforma (siempre bajo un tipo de petróleo).
fn upsert_well(conn: &mut SqliteConnection, owner: WellOwner, code: &str) -> Result<i64, PersistenceError> {
    let (rt, platform_id) = match owner {
        WellOwner::ReportType(rt_id) => {
            let rt = load_report_type(conn, rt_id)?;
            if rt.kind != ReportKind::Water {
                return Err(PersistenceError::Validation(format!("los pozos de petróleo cuelgan de una plataforma (report_type {rt_id})")));
            }
            (rt, None)
        }
        WellOwner::Platform(platform_id) => {
            let p: PlatformRow = platforms::table.find(platform_id).first(conn)?;
            (load_report_type(conn, p.report_type_id)?, Some(platform_id))
        }
    };

    let mut query = wells::table.filter(wells::code.eq(code)).into_boxed();
    query = match platform_id {
        Some(pid) => query.filter(wells::platform_id.eq(pid)),
        None => query.filter(wells::report_type_id.eq(rt.id).and(wells::platform_id.is_null())),
    };
    if let Some(id) = query.select(wells::id).first::<i64>(conn).optional()? {
        return Ok(id);
    }
    let row = NewWellRow { room_id: rt.room_id, report_type_id: rt.id, platform_id, code };
    Ok(diesel::insert_into(wells::table).values(&row).returning(wells::id).get_result(conn)?)
}

/// Resuelve `(level, key)` a un nodo. Con clave natural toma la primera
/// coincidencia por id.
pub(crate) fn find_node(conn: &mut SqliteConnection, level: Level, key: &NodeKey) -> Result<Option<Node>, PersistenceError> {
    let node = match (level, key) {
        (Level::Area, NodeKey::Id(id)) => areas::table.find(id).first::<AreaRow>(conn).optional()?.map(|r| Node::Area(r.into())),
        (Level::Area, NodeKey::Name(n)) => areas::table.filter(areas::name.eq(n))
                                                       .order(areas::id)
                                                       .first::<AreaRow>(conn)
                                                       .optional()?
                                                       .map(|r| Node::Area(r.into())),
        (Level::Team, NodeKey::Id(id)) => teams::table.find(id).first::<TeamRow>(conn).optional()?.map(|r| Node::Team(r.into())),
        (Level::Team, NodeKey::Name(n)) => {
            let by_seq = n.parse::<i32>().ok();
            let mut q = teams::table.into_boxed().filter(teams::name.eq(n.clone()));
            if let Some(seq) = by_seq {
                q = q.or_filter(teams::seq_no.eq(seq));
            }
            q.order(teams::id).first::<TeamRow>(conn).optional()?.map(|r| Node::Team(r.into()))
        }
        (Level::Room, NodeKey::Id(id)) => rooms::table.find(id).first::<RoomRow>(conn).optional()?.map(|r| Node::Room(r.into())),
        (Level::Room, NodeKey::Name(n)) => rooms::table.filter(rooms::code.eq(n))
                                                       .order(rooms::id)
                                                       .first::<RoomRow>(conn)
                                                       .optional()?
                                                       .map(|r| Node::Room(r.into())),
        (Level::ReportType, NodeKey::Id(id)) => match report_types::table.find(id).first::<ReportTypeRow>(conn).optional()? {
            Some(r) => Some(Node::ReportType(ReportType::try_from(r)?)),
            None => None,
        },
        (Level::ReportType, NodeKey::Name(n)) => {
            let Ok(kind) = n.parse::<ReportKind>() else { return Ok(None) };
            match report_types::table.filter(report_types::kind.eq(kind.code()))
                                     .order(report_types::id)
                                     .first::<ReportTypeRow>(conn)
                                     .optional()?
            {
                Some(r) => Some(Node::ReportType(ReportType::try_from(r)?)),
                None => None,
            }
        }
        (Level::Platform, NodeKey::Id(id)) => {
            platforms::table.find(id).first::<PlatformRow>(conn).optional()?.map(|r| Node::Platform(r.into()))
        }
        (Level::Platform, NodeKey::Name(n)) => platforms::table.filter(platforms::label.eq(n))
                                                               .order(platforms::id)
                                                               .first::<PlatformRow>(conn)
                                                               .optional()?
                                                               .map(|r| Node::Platform(r.into())),
        (Level::Well, NodeKey::Id(id)) => wells::table.find(id).first::<WellRow>(conn).optional()?.map(|r| Node::Well(r.into())),
        (Level::Well, NodeKey::Name(n)) => wells::table.filter(wells::code.eq(n))
                                                       .order(wells::id)
                                                       .first::<WellRow>(conn)
                                                       .optional()?
                                                       .map(|r| Node::Well(r.into())),
        (Level::WaterReport, NodeKey::Id(id)) => {
            water_reports::table.find(id).first::<WaterReportRow>(conn).optional()?.map(|r| Node::WaterReport(r.into()))
        }
        (Level::OilReport, NodeKey::Id(id)) => match oil_reports::table.find(id).first::<OilReportRow>(conn).optional()? {
            Some(r) => Some(Node::OilReport(r.into_domain()?)),
            None => None,
        },
        // Los reportes no tienen clave natural propia fuera de su pozo.
        (Level::WaterReport | Level::OilReport, NodeKey::Name(_)) => None,
    };
    Ok(node)
}

pub(crate) fn children_of(conn: &mut SqliteConnection, parent: &Node) -> Result<Vec<Node>, PersistenceError> {
    let out = match parent {
        Node::Area(a) => teams::table.filter(teams::area_id.eq(a.id))
                                     .order(teams::seq_no)
                                     .load::<TeamRow>(conn)?
                                     .into_iter()
                                     .map(|r| Node::Team(Team::from(r)))
                                     .collect(),
        Node::Team(t) => rooms::table.filter(rooms::team_id.eq(t.id))
                                     .order(rooms::id)
                                     .load::<RoomRow>(conn)?
                                     .into_iter()
                                     .map(|r| Node::Room(Room::from(r)))
                                     .collect(),
        Node::Room(r) => report_types::table.filter(report_types::room_id.eq(r.id))
                                            .order(report_types::id)
                                            .load::<ReportTypeRow>(conn)?
                                            .into_iter()
                                            .map(|row| ReportType::try_from(row).map(Node::ReportType))
                                            .collect::<Result<Vec<_>, _>>()?,
        // Agua: pozos directos. Petróleo: plataformas.
        Node::ReportType(rt) => match rt.kind {
            ReportKind::Water => wells::table.filter(wells::report_type_id.eq(rt.id).and(wells::platform_id.is_null()))
                                             .order(wells::id)
                                             .load::<WellRow>(conn)?
                                             .into_iter()
                                             .map(|r| Node::Well(Well::from(r)))
                                             .collect(),
            ReportKind::Oil => platforms::table.filter(platforms::report_type_id.eq(rt.id))
                                               .order(platforms::id)
                                               .load::<PlatformRow>(conn)?
                                               .into_iter()
                                               .map(|r| Node::Platform(Platform::from(r)))
                                               .collect(),
        },
        Node::Platform(p) => wells::table.filter(wells::platform_id.eq(p.id))
                                         .order(wells::id)
                                         .load::<WellRow>(conn)?
                                         .into_iter()
                                         .map(|r| Node::Well(Well::from(r)))
                                         .collect(),
        Node::Well(w) => {
            let mut out: Vec<Node> = water_reports::table.filter(water_reports::well_id.eq(w.id))
                                                         .order(water_reports::report_date)
                                                         .load::<WaterReportRow>(conn)?
                                                         .into_iter()
                                                         .map(|r| Node::WaterReport(r.into()))
                                                         .collect();
            for row in oil_reports::table.filter(oil_reports::well_id.eq(w.id))
                                         .order(oil_reports::report_date)
                                         .load::<OilReportRow>(conn)?
            {
                out.push(Node::OilReport(row.into_domain()?));
            }
            out
        }
        Node::WaterReport(_) | Node::OilReport(_) => Vec::new(),
    };
    Ok(out)
}

/// Borrado en profundidad: hijos antes que el padre en cada nivel.
fn delete_node(conn: &mut SqliteConnection, node: &Node) -> Result<usize, PersistenceError> {
    let mut removed = 0;
    match node {
        // Un pozo purga reportes de ambos tipos.
        Node::Well(w) => {
            removed += diesel::delete(water_reports::table.filter(water_reports::well_id.eq(w.id))).execute(conn)?;
            removed += diesel::delete(oil_reports::table.filter(oil_reports::well_id.eq(w.id))).execute(conn)?;
        }
        // Un tipo de agua tiene pozos directos; uno de petróleo, plataformas.
        // Se barren además los pozos que apunten al tipo por cualquier vía.
        Node::ReportType(rt) => {
            for child in children_of(conn, node)? {
                removed += delete_node(conn, &child)?;
            }
            let stray: Vec<WellRow> = wells::table.filter(wells::report_type_id.eq(rt.id)).load(conn)?;
            for w in stray {
                removed += delete_node(conn, &Node::Well(w.into()))?;
            }
        }
        other => {
            for child in children_of(conn, other)? {
                removed += delete_node(conn, &child)?;
            }
        }
    }
    removed += match node {
        Node::Area(a) => diesel::delete(areas::table.find(a.id)).execute(conn)?,
        Node::Team(t) => diesel::delete(teams::table.find(t.id)).execute(conn)?,
        Node::Room(r) => diesel::delete(rooms::table.find(r.id)).execute(conn)?,
        Node::ReportType(rt) => diesel::delete(report_types::table.find(rt.id)).execute(conn)?,
        Node::Platform(p) => diesel::delete(platforms::table.find(p.id)).execute(conn)?,
        Node::Well(w) => diesel::delete(wells::table.find(w.id)).execute(conn)?,
        Node::WaterReport(r) => diesel::delete(water_reports::table.find(r.id)).execute(conn)?,
        Node::OilReport(r) => diesel::delete(oil_reports::table.find(r.id)).execute(conn)?,
    };
    Ok(removed)
}
