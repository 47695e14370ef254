use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // One row per job id; the latest attempt replaces the previous one
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_records (
            job_id VARCHAR(64) PRIMARY KEY,
            attempt INTEGER NOT NULL DEFAULT 1,
            kind VARCHAR(20) NOT NULL,
            action JSONB NOT NULL,
            network_ref JSONB NOT NULL,
            status VARCHAR(20) NOT NULL,
            started_at TIMESTAMPTZ NOT NULL,
            ended_at TIMESTAMPTZ,
            error_kind VARCHAR(50),
            error_message TEXT,
            external_handle TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_job_records_status ON job_records(status)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_job_records_started_at ON job_records(started_at DESC)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
