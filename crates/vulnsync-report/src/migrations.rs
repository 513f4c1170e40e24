//! Database migration management.

use sqlx::PgPool;

use crate::error::{ReportError, ReportResult};

/// Run all pending database migrations.
///
/// Migrations are embedded at compile time from the `migrations/`
/// directory and applied in filename order.
pub async fn run_migrations(pool: &PgPool) -> ReportResult<()> {
    tracing::info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| ReportError::Persistence {
            cause: e.to_string(),
        })?;

    tracing::info!("Migrations completed");
    Ok(())
}
