/// Task resource model and database operations
///
/// Resources are links or references attached to a task (design docs,
/// tickets, external pages). They live and die with their task.
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A resource attached to a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskResource {
    pub id: i64,

    #[serde(skip_serializing)]
    pub task_id: i64,

    /// Short label for where the resource lives
    pub source_name: String,

    pub description: String,

    pub resource_link: String,
}

/// Input for attaching a resource to a task
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskResource {
    pub source_name: String,
    pub description: String,
    pub resource_link: String,
}

impl TaskResource {
    /// Attaches a new resource to a task
    pub async fn create(
        pool: &PgPool,
        task_id: i64,
        data: CreateTaskResource,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskResource>(
            "INSERT INTO task_resources (task_id, source_name, description, resource_link) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, task_id, source_name, description, resource_link",
        )
        .bind(task_id)
        .bind(data.source_name)
        .bind(data.description)
        .bind(data.resource_link)
        .fetch_one(pool)
        .await
    }

    /// Finds a resource by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskResource>(
            "SELECT id, task_id, source_name, description, resource_link \
             FROM task_resources WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists the resources attached to a task, oldest first
    pub async fn list_for_task(pool: &PgPool, task_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskResource>(
            "SELECT id, task_id, source_name, description, resource_link \
             FROM task_resources WHERE task_id = $1 ORDER BY id",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Detaches a resource
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_resources WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
