/// Status model and database operations
///
/// Workflow states for tasks ("In Progress", "Under Review", ...). The
/// caption doubles as the slug in task payloads and projections.
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A task workflow state
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Status {
    pub id: i64,

    /// Unique caption; used as the slug in task payloads
    pub caption: String,

    pub description: String,
}

/// Input for creating a status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStatus {
    pub caption: String,
    pub description: String,
}

/// Input for updating a status; only non-None fields are touched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStatus {
    pub caption: Option<String>,
    pub description: Option<String>,
}

impl Status {
    /// Creates a new status
    pub async fn create(pool: &PgPool, data: CreateStatus) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Status>(
            r#"
            INSERT INTO statuses (caption, description)
            VALUES ($1, $2)
            RETURNING id, caption, description
            "#,
        )
        .bind(data.caption)
        .bind(data.description)
        .fetch_one(pool)
        .await
    }

    /// Finds a status by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Status>(
            "SELECT id, caption, description FROM statuses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a status by its unique caption
    pub async fn find_by_caption(pool: &PgPool, caption: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Status>(
            "SELECT id, caption, description FROM statuses WHERE caption = $1",
        )
        .bind(caption)
        .fetch_optional(pool)
        .await
    }

    /// Lists all statuses ordered by caption
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Status>(
            "SELECT id, caption, description FROM statuses ORDER BY caption",
        )
        .fetch_all(pool)
        .await
    }

    /// Updates a status
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut clauses = Vec::new();
        let mut bind_count = 1;

        if data.caption.is_some() {
            bind_count += 1;
            clauses.push(format!("caption = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            clauses.push(format!("description = ${}", bind_count));
        }

        if clauses.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let query = format!(
            "UPDATE statuses SET {} WHERE id = $1 RETURNING id, caption, description",
            clauses.join(", ")
        );

        let mut q = sqlx::query_as::<_, Status>(&query).bind(id);

        if let Some(caption) = data.caption {
            q = q.bind(caption);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a status
    ///
    /// Fails with a database error while tasks still reference it (RESTRICT).
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM statuses WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
