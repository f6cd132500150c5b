//! Resolución de rutas compuestas (área, equipo, sala, tipo, [plataforma],
//! pozo, [fecha]) sobre el listado de hijos del store.

use diesel::sqlite::SqliteConnection;
use log::debug;
use well_domain::{Level, Node, NodeKey, PathKey};

use crate::error::PersistenceError;
use crate::sqlite::{children_of, find_node, ConnectionProvider, EntityStore};

pub struct SequenceResolver<'a, P: ConnectionProvider> {
    store: &'a EntityStore<P>,
}

impl<'a, P: ConnectionProvider> SequenceResolver<'a, P> {
    pub fn new(store: &'a EntityStore<P>) -> Self {
        Self { store }
    }

    /// Devuelve el nodo final de la ruta, o `None` en cuanto un segmento no
    /// encuentra hijo. Una fecha final selecciona el reporte de ese día.
    pub fn resolve(&self, path: &[PathKey]) -> Result<Option<Node>, PersistenceError> {
        let node = self.store.tx(|conn| resolve_path(conn, path))?;
        debug!("resolver.resolve segments={} found={}", path.len(), node.is_some());
        Ok(node)
    }
}

pub(crate) fn resolve_path(conn: &mut SqliteConnection, path: &[PathKey]) -> Result<Option<Node>, PersistenceError> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(None);
    };
    let root_key = match first {
        PathKey::Id(id) => NodeKey::Id(*id),
        PathKey::Name(n) => NodeKey::Name(n.clone()),
        PathKey::Date(_) => return Ok(None),
    };
    let mut root = find_node(conn, Level::Area, &root_key)?;
    if let (None, PathKey::Id(id)) = (&root, first) {
        root = find_node(conn, Level::Area, &NodeKey::Name(id.to_string()))?;
    }
    let Some(mut current) = root else {
        return Ok(None);
    };

    for (i, key) in rest.iter().enumerate() {
        if let PathKey::Date(_) = key {
            // La fecha sólo es válida como último segmento y tras un pozo.
            if i + 1 != rest.len() || !matches!(current, Node::Well(_)) {
                return Ok(None);
            }
        }
        // El tipo de reporte decide si los hijos son pozos o plataformas.
        let mut children = children_of(conn, &current)?;
        // Un segmento numérico prefiere el id; si no, cae a la clave natural.
        let by_id = match key {
            PathKey::Id(id) => children.iter().position(|c| c.id() == *id),
            _ => None,
        };
        match by_id.or_else(|| children.iter().position(|c| c.matches(key))) {
            Some(i) => current = children.swap_remove(i),
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}
