
use test_support::temp_store;
use well_core::FormulaSource;
use well_persistence::PersistenceError;

#[test]
fn upsert_formulas_counts_changes_by_target() {
    let (_dir, store) = temp_store();

    assert_eq!(store.upsert_formulas(&["和=油压+套压", "液量=和*2"]).unwrap(), 2);
    // misma expresión: nada cambia
    assert_eq!(store.upsert_formulas(&["和 = 油压+套压"]).unwrap(), 0);
    // el objetivo se identifica por su nombre canónico
    assert_eq!(store.upsert_formulas(&["sum_value=油压"]).unwrap(), 1);

    let defs = store.load_definitions().unwrap();
    assert_eq!(defs.len(), 2);
    assert_eq!(defs[0].formula, "sum_value=油压");
    assert_eq!(defs[1].formula, "液量=和*2");
}

#[test]
fn malformed_definition_rejects_the_batch() {
    let (_dir, store) = temp_store();
    let err = store.upsert_formulas(&["和=油压", "液量=和=2"]).unwrap_err();
    assert!(matches!(err, PersistenceError::Domain(_)));
    let err = store.upsert_formulas(&["和=油压+"]).unwrap_err();
    assert!(matches!(err, PersistenceError::Validation(_)));
    assert!(store.load_definitions().unwrap().is_empty());
}

#[test]
fn store_serves_as_formula_source() {
    let (_dir, store) = temp_store();
    store.upsert_formulas(&["和=油压"]).unwrap();
    let defs = FormulaSource::load_definitions(&store).unwrap();
    assert_eq!(defs.len(), 1);

    store.delete_formula(defs[0].id).unwrap();
    assert!(FormulaSource::load_definitions(&store).unwrap().is_empty());
    assert!(matches!(store.delete_formula(defs[0].id), Err(PersistenceError::NotFound)));
}
