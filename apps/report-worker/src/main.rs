use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use vulnsync_report::config::WorkerConfig;
use vulnsync_report::engine::ReconciliationEngine;
use vulnsync_report::router::EventRouter;
use vulnsync_report::store::{
    PgArtifactStore, PgPatchScanStore, PgReportStore, PgSystemGroupStore,
};

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,vulnsync_report=debug")),
        )
        .init();

    // Load configuration
    let config = WorkerConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    tracing::info!(
        max_connections = config.max_connections,
        run_migrations = config.run_migrations,
        "starting report worker"
    );

    // Create database pool
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Database connection error: {e}");
            std::process::exit(1);
        });

    if config.run_migrations {
        vulnsync_report::migrations::run_migrations(&pool)
            .await
            .unwrap_or_else(|e| {
                eprintln!("Migration error: {e}");
                std::process::exit(1);
            });
    }

    let engine = Arc::new(ReconciliationEngine::new(
        Arc::new(PgReportStore::new(pool.clone())),
        Arc::new(PgPatchScanStore::new(pool.clone())),
        Arc::new(PgSystemGroupStore::new(pool.clone())),
        Arc::new(PgArtifactStore::new(pool)),
    ));
    let router = Arc::new(EventRouter::new(Arc::clone(&engine)));

    run(engine, router).await;
}

/// Consume inbound events until the stream ends or the process is
/// signalled to stop.
#[cfg(feature = "kafka")]
async fn run(_engine: Arc<ReconciliationEngine>, router: Arc<EventRouter>) {
    use vulnsync_events::config::KafkaConfig;
    use vulnsync_events::consumer::EventConsumer;
    use vulnsync_events::events::INBOUND_TOPICS;

    let kafka_config = KafkaConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    let consumer = EventConsumer::new(&kafka_config, INBOUND_TOPICS).unwrap_or_else(|e| {
        eprintln!("Event consumer error: {e}");
        std::process::exit(1);
    });

    tokio::select! {
        result = consumer.run(router) => {
            if let Err(e) = result {
                eprintln!("Consumer error: {e}");
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }
}

/// Without an event transport compiled in, perform one full refresh and
/// exit. Useful for local runs and scheduled reconciliation jobs.
#[cfg(not(feature = "kafka"))]
async fn run(engine: Arc<ReconciliationEngine>, _router: Arc<EventRouter>) {
    match engine.refresh_all().await {
        Ok(summary) => {
            tracing::info!(
                system_groups = summary.system_groups,
                finding_rows = summary.finding_rows,
                scan_rows = summary.scan_rows,
                failures = summary.failures,
                "One-shot refresh complete"
            );
        }
        Err(e) => {
            eprintln!("Refresh error: {e}");
            std::process::exit(1);
        }
    }
}
