/// User profile model and database operations
///
/// Profiles carry the person behind an account: names and an optional
/// organizational position. Exactly one profile exists per account — created
/// with it (see [`crate::accounts`]) and cascade-deleted with it. Tasks
/// reference profiles, not accounts.
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// A user profile, one per account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: i64,

    /// Owning account (unique: one profile per account)
    pub account_id: i64,

    pub first_name: String,

    pub last_name: String,

    /// Optional organizational position; NULLed if the position is deleted
    pub position_id: Option<i64>,
}

/// Input for updating a profile; only non-None fields are touched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Use Some(None) to clear the position
    pub position_id: Option<Option<i64>>,
}

impl UserProfile {
    /// Finds a profile by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, account_id, first_name, last_name, position_id
            FROM user_profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds the profile belonging to an account
    pub async fn find_by_account(
        pool: &PgPool,
        account_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, account_id, first_name, last_name, position_id
            FROM user_profiles
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(pool)
        .await
    }

    /// Updates a profile
    ///
    /// Returns the updated row, or None if the id doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateUserProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut clauses = Vec::new();
        let mut bind_count = 1;

        if data.first_name.is_some() {
            bind_count += 1;
            clauses.push(format!("first_name = ${}", bind_count));
        }
        if data.last_name.is_some() {
            bind_count += 1;
            clauses.push(format!("last_name = ${}", bind_count));
        }
        if data.position_id.is_some() {
            bind_count += 1;
            clauses.push(format!("position_id = ${}", bind_count));
        }

        if clauses.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let query = format!(
            "UPDATE user_profiles SET {} WHERE id = $1 \
             RETURNING id, account_id, first_name, last_name, position_id",
            clauses.join(", ")
        );

        let mut q = sqlx::query_as::<_, UserProfile>(&query).bind(id);

        if let Some(first_name) = data.first_name {
            q = q.bind(first_name);
        }
        if let Some(last_name) = data.last_name {
            q = q.bind(last_name);
        }
        if let Some(position_id) = data.position_id {
            q = q.bind(position_id);
        }

        q.fetch_optional(pool).await
    }
}
