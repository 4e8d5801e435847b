//! PostgreSQL release repository

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{Page, PageRequest, Release, ReleaseFilter, ReleaseStatus, ReleaseType};

use super::{ReleaseRepository, RepositoryError};

const RELEASE_COLUMNS: &str = "id, description, month, year, user_id, value, release_type, status, release_date, created_at";

#[derive(Debug, sqlx::FromRow)]
struct ReleaseRow {
    id: i64,
    description: String,
    month: Option<i32>,
    year: Option<i32>,
    user_id: i64,
    value: Decimal,
    release_type: String,
    status: String,
    release_date: NaiveDate,
    created_at: NaiveDate,
}

impl TryFrom<ReleaseRow> for Release {
    type Error = RepositoryError;

    fn try_from(row: ReleaseRow) -> Result<Self, Self::Error> {
        let release_type: ReleaseType = row
            .release_type
            .parse()
            .map_err(|e: crate::domain::DomainError| RepositoryError::InvalidData(e.to_string()))?;
        let status: ReleaseStatus = row
            .status
            .parse()
            .map_err(|e: crate::domain::DomainError| RepositoryError::InvalidData(e.to_string()))?;

        Ok(Release {
            id: Some(row.id),
            description: row.description,
            month: row.month,
            year: row.year,
            user_id: Some(row.user_id),
            value: Some(row.value),
            release_type: Some(release_type),
            status: Some(status),
            release_date: Some(row.release_date),
            created_at: Some(row.created_at),
        })
    }
}

fn into_releases(rows: Vec<ReleaseRow>) -> Result<Vec<Release>, RepositoryError> {
    rows.into_iter().map(Release::try_from).collect()
}

/// Escape LIKE wildcards so user text is matched literally
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Release repository backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgReleaseRepository {
    pool: PgPool,
}

impl PgReleaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReleaseRepository for PgReleaseRepository {
    async fn insert(&self, release: &Release) -> Result<Release, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: ReleaseRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO releases (description, month, year, user_id, value, release_type, status, release_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {RELEASE_COLUMNS}
            "#
        ))
        .bind(&release.description)
        .bind(release.month)
        .bind(release.year)
        .bind(release.user_id)
        .bind(release.value)
        .bind(release.release_type.map(|t| t.as_str()))
        .bind(release.status.map(|s| s.as_str()))
        .bind(release.release_date)
        .bind(release.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(release_id = row.id, user_id = row.user_id, "Release inserted");

        Release::try_from(row)
    }

    async fn update(&self, release: &Release) -> Result<Option<Release>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // created_at is owned by the server and never rewritten
        let row: Option<ReleaseRow> = sqlx::query_as(&format!(
            r#"
            UPDATE releases
            SET description = $2,
                month = $3,
                year = $4,
                user_id = $5,
                value = $6,
                release_type = $7,
                status = $8,
                release_date = $9
            WHERE id = $1
            RETURNING {RELEASE_COLUMNS}
            "#
        ))
        .bind(release.id)
        .bind(&release.description)
        .bind(release.month)
        .bind(release.year)
        .bind(release.user_id)
        .bind(release.value)
        .bind(release.release_type.map(|t| t.as_str()))
        .bind(release.status.map(|s| s.as_str()))
        .bind(release.release_date)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        row.map(Release::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let rows_affected = sqlx::query("DELETE FROM releases WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(rows_affected > 0)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Release>, RepositoryError> {
        let row: Option<ReleaseRow> = sqlx::query_as(&format!(
            "SELECT {RELEASE_COLUMNS} FROM releases WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Release::try_from).transpose()
    }

    async fn find(&self, filter: &ReleaseFilter) -> Result<Vec<Release>, RepositoryError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {RELEASE_COLUMNS} FROM releases WHERE TRUE"));

        if let Some(ref description) = filter.description {
            builder
                .push(" AND description ILIKE ")
                .push_bind(format!("%{}%", escape_like(description)));
        }
        if let Some(month) = filter.month {
            builder.push(" AND month = ").push_bind(month);
        }
        if let Some(year) = filter.year {
            builder.push(" AND year = ").push_bind(year);
        }
        if let Some(user_id) = filter.user_id {
            builder.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(release_type) = filter.release_type {
            builder
                .push(" AND release_type = ")
                .push_bind(release_type.as_str());
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        builder.push(" ORDER BY release_date DESC, id DESC");

        let rows: Vec<ReleaseRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        into_releases(rows)
    }

    async fn sum_values(
        &self,
        user_id: i64,
        release_type: ReleaseType,
        status: ReleaseStatus,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Decimal>, RepositoryError> {
        let sum: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(value)
            FROM releases
            WHERE user_id = $1
              AND release_type = $2
              AND status = $3
              AND created_at BETWEEN $4 AND $5
            "#,
        )
        .bind(user_id)
        .bind(release_type.as_str())
        .bind(status.as_str())
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }

    async fn find_created_between(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Release>, RepositoryError> {
        let rows: Vec<ReleaseRow> = sqlx::query_as(&format!(
            r#"
            SELECT {RELEASE_COLUMNS}
            FROM releases
            WHERE user_id = $1 AND created_at BETWEEN $2 AND $3
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        into_releases(rows)
    }

    async fn find_page(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Release>, RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM releases WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        if total == 0 {
            return Ok(Page::empty());
        }

        let rows: Vec<ReleaseRow> = sqlx::query_as(&format!(
            r#"
            SELECT {RELEASE_COLUMNS}
            FROM releases
            WHERE user_id = $1
            ORDER BY release_date DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(page.size())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(into_releases(rows)?, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("rent"), "rent");
    }

    #[test]
    fn test_row_conversion() {
        let row = ReleaseRow {
            id: 3,
            description: "Rent".to_string(),
            month: Some(2),
            year: Some(2024),
            user_id: 9,
            value: dec!(800.00),
            release_type: "EXPENSE".to_string(),
            status: "SETTLED".to_string(),
            release_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            created_at: NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
        };

        let release = Release::try_from(row).unwrap();

        assert_eq!(release.id, Some(3));
        assert_eq!(release.user_id, Some(9));
        assert_eq!(release.release_type, Some(ReleaseType::Expense));
        assert_eq!(release.status, Some(ReleaseStatus::Settled));
    }

    #[test]
    fn test_row_with_unknown_status_rejected() {
        let row = ReleaseRow {
            id: 3,
            description: "Rent".to_string(),
            month: None,
            year: None,
            user_id: 9,
            value: dec!(1),
            release_type: "EXPENSE".to_string(),
            status: "EFETIVADO".to_string(),
            release_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            created_at: NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
        };

        assert!(matches!(
            Release::try_from(row),
            Err(RepositoryError::InvalidData(_))
        ));
    }
}
