/// Priority model and database operations
///
/// Priority levels for tasks. The caption doubles as the slug in task
/// payloads and projections.
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A task priority level (e.g. "High Priority")
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Priority {
    pub id: i64,

    /// Unique caption; used as the slug in task payloads
    pub caption: String,
}

/// Input for creating a priority
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePriority {
    pub caption: String,
}

impl Priority {
    /// Creates a new priority level
    pub async fn create(pool: &PgPool, data: CreatePriority) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Priority>(
            "INSERT INTO priorities (caption) VALUES ($1) RETURNING id, caption",
        )
        .bind(data.caption)
        .fetch_one(pool)
        .await
    }

    /// Finds a priority by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Priority>("SELECT id, caption FROM priorities WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a priority by its unique caption
    pub async fn find_by_caption(pool: &PgPool, caption: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Priority>("SELECT id, caption FROM priorities WHERE caption = $1")
            .bind(caption)
            .fetch_optional(pool)
            .await
    }

    /// Lists all priorities ordered by caption
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Priority>("SELECT id, caption FROM priorities ORDER BY caption")
            .fetch_all(pool)
            .await
    }

    /// Renames a priority
    pub async fn update_caption(
        pool: &PgPool,
        id: i64,
        caption: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Priority>(
            "UPDATE priorities SET caption = $2 WHERE id = $1 RETURNING id, caption",
        )
        .bind(id)
        .bind(caption)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a priority
    ///
    /// Fails with a database error while tasks still reference it (RESTRICT).
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM priorities WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
