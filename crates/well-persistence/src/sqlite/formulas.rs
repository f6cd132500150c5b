//! Tabla de definiciones de fórmulas: lectura, upsert por objetivo y borrado.
use std::collections::HashMap;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{info, warn};
use well_core::formula::{parse, substitute_labels};
use well_core::{CoreError, FormulaSource};
use well_domain::{split_definition, FormulaDefinition};

use super::rows::{FormulaRow, NewFormulaRow};
use super::{ConnectionProvider, EntityStore};
use crate::error::PersistenceError;
use crate::schema::formula_definitions;

impl<P: ConnectionProvider> EntityStore<P> {
    /// Todas las definiciones, ordenadas por id.
    pub fn load_definitions(&self) -> Result<Vec<FormulaDefinition>, PersistenceError> {
        self.tx(|conn| {
                let rows: Vec<FormulaRow> = formula_definitions::table.order(formula_definitions::id.asc()).load(conn)?;
                Ok(rows.into_iter().map(|r| FormulaDefinition::new(r.id, r.formula)).collect())
            })
    }

    /// Guarda las definiciones indexadas por su objetivo canónico. Devuelve
    /// cuántas filas cambiaron (insertadas o actualizadas). Una definición
    /// mal formada rechaza el lote entero.
    pub fn upsert_formulas<S: AsRef<str>>(&self, defs: &[S]) -> Result<usize, PersistenceError> {
        let mut incoming = Vec::with_capacity(defs.len());
        for def in defs {
            let text = def.as_ref().trim();
            let (lhs, rhs) = split_definition(text)?;
            let expr = substitute_labels(rhs);
            parse(&expr).map_err(|reason| PersistenceError::Validation(format!("{text}: {reason}")))?;
            incoming.push((substitute_labels(lhs), compact(&expr), text.to_string()));
        }

        let changed = self.tx(|conn| {
                              let mut by_target = existing_by_target(conn)?;
                              let mut changed = 0;
                              for (target, expr, text) in &incoming {
                                  match by_target.get(target) {
                                      Some(row) if same_expression(&row.formula, expr) => {}
                                      Some(row) => {
                                          diesel::update(formula_definitions::table.find(row.id))
                                              .set(formula_definitions::formula.eq(text))
                                              .execute(conn)?;
                                          changed += 1;
                                      }
                                      None => {
                                          let id: i64 = diesel::insert_into(formula_definitions::table)
                                              .values(&NewFormulaRow { formula: text })
                                              .returning(formula_definitions::id)
                                              .get_result(conn)?;
                                          by_target.insert(target.clone(), FormulaRow { id, formula: text.clone() });
                                          changed += 1;
                                      }
                                  }
                              }
                              Ok(changed)
                          })?;
        info!("store.upsert_formulas received={} changed={}", defs.len(), changed);
        Ok(changed)
    }

    pub fn delete_formula(&self, id: i64) -> Result<(), PersistenceError> {
        let n = self.tx(|conn| Ok(diesel::delete(formula_definitions::table.find(id)).execute(conn)?))?;
        if n == 0 {
            return Err(PersistenceError::NotFound);
        }
        Ok(())
    }
}

/// Expresión canónica sin espacios, para comparar definiciones.
fn compact(expr: &str) -> String {
    expr.chars().filter(|c| !c.is_whitespace()).collect()
}

fn same_expression(stored: &str, expr: &str) -> bool {
    match split_definition(stored) {
        Ok((_, rhs)) => compact(&substitute_labels(rhs)) == expr,
        Err(_) => false,
    }
}

/// Fila vigente por objetivo; si hay varias, gana la de mayor id.
fn existing_by_target(conn: &mut SqliteConnection) -> Result<HashMap<String, FormulaRow>, PersistenceError> {
    let rows: Vec<FormulaRow> = formula_definitions::table.order(formula_definitions::id.asc()).load(conn)?;
    let mut out: HashMap<String, FormulaRow> = HashMap::new();
    for row in rows {
        let Ok((lhs, _)) = split_definition(&row.formula) else {
            warn!("formula.malformed_row id={}", row.id);
            continue;
        };
        let target = substitute_labels(lhs);
        if let Some(prev) = out.get(&target) {
            warn!("formula.duplicate_target target={} ids={},{}", target, prev.id, row.id);
        }
        out.insert(target, row);
    }
    Ok(out)
}

impl<P: ConnectionProvider> FormulaSource for EntityStore<P> {
    fn load_definitions(&self) -> Result<Vec<FormulaDefinition>, CoreError> {
        EntityStore::load_definitions(self).map_err(|e| CoreError::Source(e.to_string()))
    }
}
