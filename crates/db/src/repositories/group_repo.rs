//! Repository for `groups` and the `user_groups` join table.

use roster_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::Group;

/// Group lookup and membership management.
pub struct GroupRepo;

impl GroupRepo {
    /// Return the group named `name`, creating it if needed.
    pub async fn get_or_create(pool: &PgPool, name: &str) -> Result<Group, sqlx::Error> {
        sqlx::query_as::<_, Group>(
            "INSERT INTO groups (name) VALUES ($1)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id, name",
        )
        .bind(name)
        .fetch_one(pool)
        .await
    }

    /// Group names of a user, sorted.
    pub async fn names_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT g.name FROM groups g
             JOIN user_groups ug ON ug.group_id = g.id
             WHERE ug.user_id = $1
             ORDER BY g.name",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Add a membership. Returns `false` if it already existed.
    pub async fn add_member(pool: &PgPool, user_id: DbId, group_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO user_groups (user_id, group_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(group_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a membership by group name. Returns `true` if a row was removed.
    pub async fn remove_member(pool: &PgPool, user_id: DbId, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM user_groups ug USING groups g
             WHERE ug.group_id = g.id AND ug.user_id = $1 AND g.name = $2",
        )
        .bind(user_id)
        .bind(name)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
