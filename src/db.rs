//! Database module
//!
//! Connectivity and schema checks. The schema itself lives in the SQL files
//! under `migrations/`.

use sqlx::PgPool;

const REQUIRED_TABLES: &[&str] = &["users", "releases"];

pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check that every table the ledger needs exists
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!(table, "Required table does not exist");
            return Ok(false);
        }
    }

    Ok(true)
}
