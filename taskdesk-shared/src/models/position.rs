/// Position model and database operations
///
/// Organizational positions ("HR Manager", "Backend Developer"), each
/// belonging to a category. Profiles reference positions optionally; the
/// `is_task_manager` flag marks positions expected to own tasks.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE positions (
///     id BIGSERIAL PRIMARY KEY,
///     title VARCHAR(100) NOT NULL UNIQUE,
///     description TEXT NOT NULL DEFAULT '',
///     is_task_manager BOOLEAN NOT NULL DEFAULT FALSE,
///     category_id BIGINT NOT NULL REFERENCES categories(id) ON DELETE RESTRICT
/// );
/// ```
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// An organizational position
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Position {
    pub id: i64,

    /// Unique title; used as the slug form of a position
    pub title: String,

    pub description: String,

    /// Whether holders of this position are expected to manage tasks
    pub is_task_manager: bool,

    pub category_id: i64,
}

/// Input for creating a position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePosition {
    pub title: String,
    pub description: String,
    pub is_task_manager: bool,
    pub category_id: i64,
}

/// Input for updating a position; only non-None fields are touched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePosition {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_task_manager: Option<bool>,
    pub category_id: Option<i64>,
}

impl Position {
    /// Creates a new position
    ///
    /// # Errors
    ///
    /// Returns an error if the title is taken or `category_id` doesn't
    /// resolve
    pub async fn create(pool: &PgPool, data: CreatePosition) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Position>(
            r#"
            INSERT INTO positions (title, description, is_task_manager, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, is_task_manager, category_id
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.is_task_manager)
        .bind(data.category_id)
        .fetch_one(pool)
        .await
    }

    /// Finds a position by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Position>(
            r#"
            SELECT id, title, description, is_task_manager, category_id
            FROM positions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a position by its unique title
    pub async fn find_by_title(pool: &PgPool, title: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Position>(
            r#"
            SELECT id, title, description, is_task_manager, category_id
            FROM positions
            WHERE title = $1
            "#,
        )
        .bind(title)
        .fetch_optional(pool)
        .await
    }

    /// Lists all positions ordered by title
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Position>(
            r#"
            SELECT id, title, description, is_task_manager, category_id
            FROM positions
            ORDER BY title
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Updates a position
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdatePosition,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut clauses = Vec::new();
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            clauses.push(format!("title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            clauses.push(format!("description = ${}", bind_count));
        }
        if data.is_task_manager.is_some() {
            bind_count += 1;
            clauses.push(format!("is_task_manager = ${}", bind_count));
        }
        if data.category_id.is_some() {
            bind_count += 1;
            clauses.push(format!("category_id = ${}", bind_count));
        }

        if clauses.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let query = format!(
            "UPDATE positions SET {} WHERE id = $1 \
             RETURNING id, title, description, is_task_manager, category_id",
            clauses.join(", ")
        );

        let mut q = sqlx::query_as::<_, Position>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(is_task_manager) = data.is_task_manager {
            q = q.bind(is_task_manager);
        }
        if let Some(category_id) = data.category_id {
            q = q.bind(category_id);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a position
    ///
    /// Profiles pointing at it fall back to NULL (SET NULL).
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM positions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
