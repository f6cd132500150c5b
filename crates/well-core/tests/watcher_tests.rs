use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use well_core::{CalculationEngine, FormulaCompiler, FormulaSource, FormulaWatcher, InMemoryCheckpoint, InMemoryFormulaSource,
                ReportSession, TickOutcome};
use well_domain::{FormulaDefinition, OilRecord};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()
}

fn live_records() -> Vec<OilRecord> {
    (1..=3).map(|i| {
               let mut r = OilRecord::new(i, today(), "P1", format!("W{i}"));
               r.set("oil_pressure", format!("{i}")).unwrap();
               r.set("casing_pressure", "1").unwrap();
               r.set("remark", "keep").unwrap();
               r
           })
           .collect()
}

fn setup(defs: Vec<FormulaDefinition>) -> (Arc<InMemoryFormulaSource>, ReportSession, FormulaWatcher) {
    let source = Arc::new(InMemoryFormulaSource::new(defs.clone()));
    let session = ReportSession::new(CalculationEngine::new(Arc::new(InMemoryCheckpoint::default())), today(), live_records());
    session.install_formulas(FormulaCompiler::compile(&defs));
    session.recompute_all().unwrap();
    let watcher = FormulaWatcher::new(source.clone(), session.clone());
    (source, session, watcher)
}

#[tokio::test]
async fn formula_change_propagates_after_one_tick() {
    let (source, session, mut watcher) = setup(vec![FormulaDefinition::new(1, "和=油压+套压"),
                                                    FormulaDefinition::new(2, "日产油=油压*10")]);
    assert_eq!(watcher.tick().await.unwrap(), TickOutcome::Initialized);
    assert_eq!(session.record(2).unwrap().get("sum_value"), "3");

    source.put(FormulaDefinition::new(1, "和=油压*套压*5"));
    assert!(matches!(watcher.tick().await.unwrap(), TickOutcome::Reloaded(_)));

    for r in session.snapshot() {
        assert_eq!(r.get("sum_value"), format!("{}", r.well_id * 5));
        assert_eq!(r.get("daily_oil"), format!("{}", r.well_id * 10));
        assert_eq!(r.get("remark"), "keep");
    }
    assert_eq!(watcher.tick().await.unwrap(), TickOutcome::Unchanged);
}

#[tokio::test]
async fn primed_watcher_reacts_on_first_change() {
    let defs = vec![FormulaDefinition::new(1, "和=油压+套压")];
    let (source, session, mut watcher) = setup(defs.clone());
    watcher.prime(&source.load_definitions().unwrap());
    assert_eq!(watcher.tick().await.unwrap(), TickOutcome::Unchanged);

    source.put(FormulaDefinition::new(1, "和=油压-套压"));
    assert!(matches!(watcher.tick().await.unwrap(), TickOutcome::Reloaded(_)));
    assert_eq!(session.record(1).unwrap().get("sum_value"), "0");
}

#[tokio::test]
async fn spawned_watcher_stops_on_shutdown() {
    let (source, session, watcher) = setup(vec![FormulaDefinition::new(1, "和=油压+套压")]);
    let handle = watcher.spawn(Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(30)).await;
    source.put(FormulaDefinition::new(1, "和=油压+套压+1"));

    let mut updated = false;
    for _ in 0..50 {
        if session.record(1).unwrap().get("sum_value") == "3" {
            updated = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.shutdown().await;
    assert!(updated, "el vigilante no aplicó el cambio");
}
