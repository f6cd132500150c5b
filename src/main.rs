use std::process::exit;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use log::{error, info, warn};
use wellflow_rust::{bootstrap, persist_live, roll_over_if_needed, App, CONFIG};
use well_core::FileCheckpoint;
use well_persistence::{build_pool, EntityStore, PoolProvider};

/// Cada cuánto se comprueba el cambio de día.
const ROLLOVER_CHECK: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cfg = &*CONFIG;

    let pool = match build_pool(&cfg.database.url, cfg.database.min_connections, cfg.database.max_connections) {
        Ok(p) => p,
        Err(e) => {
            error!("app.pool_failed error={}", e);
            exit(5);
        }
    };
    let store = Arc::new(EntityStore::new(PoolProvider { pool }));
    let checkpoint = Arc::new(FileCheckpoint::new(cfg.checkpoint_path.clone()));
    let today = Local::now().date_naive();

    let App { store, session, watcher } = match bootstrap(store, checkpoint, &cfg.scope, today) {
        Ok(app) => app,
        Err(e) => {
            error!("app.bootstrap_failed error={}", e);
            exit(5);
        }
    };
    let watcher = watcher.spawn(cfg.watch_interval);

    let rollover = {
        let store = store.clone();
        let session = session.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(ROLLOVER_CHECK);
            loop {
                ticker.tick().await;
                let (store, session) = (store.clone(), session.clone());
                let today = Local::now().date_naive();
                match tokio::task::spawn_blocking(move || roll_over_if_needed(&*store, &session, today)).await {
                    Ok(Ok(true)) => info!("app.rolled_over date={}", today),
                    Ok(Ok(false)) => {}
                    Ok(Err(e)) => warn!("app.rollover_failed error={}", e),
                    Err(e) => warn!("app.rollover_join_failed error={}", e),
                }
            }
        })
    };

    info!("app.running interval_secs={} records={}", cfg.watch_interval.as_secs(), session.snapshot().len());
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("app.signal_failed error={}", e);
    }

    rollover.abort();
    watcher.shutdown().await;
    match persist_live(&*store, &session) {
        Ok(s) => info!("app.stopped inserted={} updated={} skipped={}", s.inserted, s.updated, s.skipped),
        Err(e) => error!("app.final_sync_failed error={}", e),
    }
}
