use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::TempDir;
use well_core::{FileCheckpoint, InMemoryCheckpoint, TickOutcome};
use well_domain::{PathKey, ReportKind, WellOwner};
use well_persistence::{build_pool, EntityStore, PoolProvider};
use wellflow_rust::{bootstrap, roll_over_if_needed};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn scope() -> Vec<PathKey> {
    vec![PathKey::from("Norte")]
}

/// Norte / 1 / R1 / Oil / P1 / [O1, O2]; devuelve los ids de pozo.
fn seeded_store() -> (TempDir, Arc<EntityStore<PoolProvider>>, Vec<i64>) {
    let dir = tempfile::tempdir().unwrap();
    let pool = build_pool(dir.path().join("live.db").to_str().unwrap(), 1, 2).unwrap();
    let store = EntityStore::new(PoolProvider { pool });
    let area = store.upsert_area("Norte").unwrap();
    let team = store.upsert_team(area, 1, "Equipo 1").unwrap();
    let room = store.upsert_room(team, "R1", false).unwrap();
    let oil = store.upsert_report_type(room, ReportKind::Oil).unwrap();
    let platform = store.upsert_platform(oil, "P1").unwrap();
    let wells = ["O1", "O2"].iter()
                            .map(|code| store.upsert_well(WellOwner::Platform(platform), code).unwrap())
                            .collect();
    (dir, Arc::new(store), wells)
}

fn edits(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[tokio::test]
async fn stored_formula_change_reaches_live_records_on_next_tick() {
    let (_dir, store, wells) = seeded_store();
    store.upsert_formulas(&["和=油压+套压"]).unwrap();

    let mut app = bootstrap(store.clone(), Arc::new(InMemoryCheckpoint::default()), &scope(), day(1)).unwrap();
    app.session.apply_edit(wells[0], &edits(&[("oil_pressure", "2"), ("casing_pressure", "3"), ("remark", "ok")]))
       .unwrap();
    assert_eq!(app.session.record(wells[0]).unwrap().get("sum_value"), "5");

    // cebado al arrancar: sin cambios
    assert_eq!(app.watcher.tick().await.unwrap(), TickOutcome::Unchanged);

    store.upsert_formulas(&["和=油压*套压"]).unwrap();
    assert!(matches!(app.watcher.tick().await.unwrap(), TickOutcome::Reloaded(_)));

    let record = app.session.record(wells[0]).unwrap();
    assert_eq!(record.get("sum_value"), "6");
    assert_eq!(record.get("oil_pressure"), "2");
    assert_eq!(record.get("remark"), "ok");
    // sin entradas: resultado en blanco
    assert_eq!(app.session.record(wells[1]).unwrap().get("sum_value"), "");
}

#[test]
fn same_day_checkpoint_is_restored_and_stale_one_ignored() {
    let (dir, store, wells) = seeded_store();
    let path = dir.path().join("checkpoint.json");

    let app = bootstrap(store.clone(), Arc::new(FileCheckpoint::new(&path)), &scope(), day(1)).unwrap();
    app.session.apply_edit(wells[1], &edits(&[("pump_diameter", "44")])).unwrap();
    drop(app);

    let again = bootstrap(store.clone(), Arc::new(FileCheckpoint::new(&path)), &scope(), day(1)).unwrap();
    assert_eq!(again.session.record(wells[1]).unwrap().get("pump_diameter"), "44");
    drop(again);

    let next_day = bootstrap(store, Arc::new(FileCheckpoint::new(&path)), &scope(), day(2)).unwrap();
    assert_eq!(next_day.session.date(), day(2));
    assert_eq!(next_day.session.record(wells[1]).unwrap().get("pump_diameter"), "");
}

#[test]
fn shared_bucket_edit_reaches_flagged_siblings() {
    let (_dir, store, wells) = seeded_store();
    let app = bootstrap(store, Arc::new(InMemoryCheckpoint::default()), &scope(), day(1)).unwrap();

    let touched = app.session.apply_edit(wells[0], &edits(&[("total_bucket", "12")])).unwrap();
    assert_eq!(touched, wells);
    assert_eq!(app.session.record(wells[1]).unwrap().get("total_bucket"), "12");

    app.session.set_bucket_flag(wells[1], false).unwrap();
    assert_eq!(app.session.record(wells[1]).unwrap().get("total_bucket"), "");
    app.session.apply_edit(wells[0], &edits(&[("total_bucket", "15")])).unwrap();
    assert_eq!(app.session.record(wells[1]).unwrap().get("total_bucket"), "");
}

#[test]
fn rollover_persists_closing_day_and_blanks_live_set() {
    let (_dir, store, wells) = seeded_store();
    let app = bootstrap(store.clone(), Arc::new(InMemoryCheckpoint::default()), &scope(), day(1)).unwrap();
    app.session.apply_edit(wells[0], &edits(&[("oil_pressure", "7")])).unwrap();

    assert!(!roll_over_if_needed(&*store, &app.session, day(1)).unwrap());
    assert!(roll_over_if_needed(&*store, &app.session, day(2)).unwrap());

    let closed = store.oil_report(wells[0], day(1)).unwrap().unwrap();
    assert_eq!(closed.values.get("oil_pressure").map(String::as_str), Some("7"));
    assert_eq!(closed.well_code, "O1");

    let live = app.session.record(wells[0]).unwrap();
    assert_eq!(live.report_date, day(2));
    assert_eq!(live.get("oil_pressure"), "");
    assert!(live.shared_bucket);
    assert_eq!(store.previous_day_report(wells[0], day(2)).unwrap().unwrap().id, closed.id);
}
