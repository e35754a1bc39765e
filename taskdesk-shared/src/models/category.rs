/// Category model and database operations
///
/// Categories group positions and tasks by department or area of work.
/// The name doubles as the category's slug in task payloads and
/// projections, so it is unique.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE categories (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(30) NOT NULL UNIQUE,
///     description TEXT NOT NULL DEFAULT ''
/// );
/// ```
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A category of work (e.g. "Development", "Human Resource")
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,

    /// Unique short name; used as the slug in task payloads
    pub name: String,

    pub description: String,
}

/// Input for creating a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub description: String,
}

/// Input for updating a category; only non-None fields are touched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Category {
    /// Creates a new category
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already taken or the database is
    /// unreachable
    pub async fn create(pool: &PgPool, data: CreateCategory) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .fetch_one(pool)
        .await
    }

    /// Finds a category by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a category by its unique name (the slug form used in task
    /// payloads)
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// Lists all categories ordered by name
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }

    /// Updates a category
    ///
    /// Returns the updated row, or None if the id doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateCategory,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut clauses = Vec::new();
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            clauses.push(format!("name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            clauses.push(format!("description = ${}", bind_count));
        }

        if clauses.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let query = format!(
            "UPDATE categories SET {} WHERE id = $1 RETURNING id, name, description",
            clauses.join(", ")
        );

        let mut q = sqlx::query_as::<_, Category>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a category
    ///
    /// Returns true if a row was deleted. Fails with a database error when
    /// positions or tasks still reference the category (RESTRICT).
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
