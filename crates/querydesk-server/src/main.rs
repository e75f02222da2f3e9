use std::sync::Arc;

use tracing::info;

use querydesk_core::exec::QueryExecutor;
use querydesk_core::QuerydeskConfig;
use querydesk_scheduler::{JobStore, LogNotifier, Scheduler, SystemClock};
use querydesk_workbench::SqliteExecutor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "querydesk=info".into()),
        )
        .init();

    // config file: QUERYDESK_CONFIG wins over ~/.querydesk/querydesk.toml
    let config_path = std::env::var("QUERYDESK_CONFIG").ok();
    let config = QuerydeskConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("config load failed ({e}), using defaults");
        QuerydeskConfig::default()
    });

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    // idempotent schema migrations
    querydesk_workbench::db::init_db(&db)?;
    querydesk_scheduler::db::init_db(&db)?;
    if config.workbench.seed_demo {
        querydesk_workbench::db::seed_demo_data(&db)?;
        info!("demo data seeded");
    }
    info!("database migrations complete");

    // each subsystem gets its own connection
    let executor = Arc::new(SqliteExecutor::new(
        rusqlite::Connection::open(db_path)?,
        config.workbench.max_in_flight_queries,
    )) as Arc<dyn QueryExecutor>;
    let store = Arc::new(JobStore::new(rusqlite::Connection::open(db_path)?));

    let scheduler = Scheduler::new(store, executor, Arc::new(LogNotifier), Arc::new(SystemClock));
    let restored = scheduler.restore()?;
    info!(jobs = restored, "querydesk scheduler running");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("could not create {}: {}", parent.display(), e);
            }
        }
    }
}
