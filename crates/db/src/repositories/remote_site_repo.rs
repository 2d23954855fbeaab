//! Repository for the `remote_sites` table.

use roster_core::remote::SiteMode;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::remote::RemoteSite;

const COLUMNS: &str = "id, uuid, name, url, mode, description, secret, created_at, updated_at";

/// Provides CRUD operations for peer site records.
pub struct RemoteSiteRepo;

impl RemoteSiteRepo {
    /// Insert a site. Inputs are expected to be validated by the caller.
    pub async fn create(
        pool: &PgPool,
        name: &str,
        url: &str,
        mode: SiteMode,
        description: &str,
        secret: &str,
    ) -> Result<RemoteSite, sqlx::Error> {
        let query = format!(
            "INSERT INTO remote_sites (uuid, name, url, mode, description, secret)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RemoteSite>(&query)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(url)
            .bind(mode.as_str())
            .bind(description)
            .bind(secret)
            .fetch_one(pool)
            .await
    }

    /// List all sites ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<RemoteSite>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM remote_sites ORDER BY name");
        sqlx::query_as::<_, RemoteSite>(&query).fetch_all(pool).await
    }

    /// Find a site by its UUID.
    pub async fn find_by_uuid(pool: &PgPool, uuid: Uuid) -> Result<Option<RemoteSite>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM remote_sites WHERE uuid = $1");
        sqlx::query_as::<_, RemoteSite>(&query)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }

    /// Find a site by its unique name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<RemoteSite>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM remote_sites WHERE name = $1");
        sqlx::query_as::<_, RemoteSite>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Find a site in `mode` by its access secret.
    pub async fn find_by_secret(
        pool: &PgPool,
        secret: &str,
        mode: SiteMode,
    ) -> Result<Option<RemoteSite>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM remote_sites WHERE secret = $1 AND mode = $2");
        sqlx::query_as::<_, RemoteSite>(&query)
            .bind(secret)
            .bind(mode.as_str())
            .fetch_optional(pool)
            .await
    }

    /// The first registered site in `mode`.
    pub async fn find_first_by_mode(
        pool: &PgPool,
        mode: SiteMode,
    ) -> Result<Option<RemoteSite>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM remote_sites WHERE mode = $1 ORDER BY id LIMIT 1");
        sqlx::query_as::<_, RemoteSite>(&query)
            .bind(mode.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Delete a site and, by cascade, its grants.
    pub async fn delete(pool: &PgPool, uuid: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM remote_sites WHERE uuid = $1")
            .bind(uuid)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
