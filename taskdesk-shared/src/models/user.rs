/// User account model and database operations
///
/// Accounts are the login identity: a unique email plus an Argon2id password
/// hash and the `is_active`/`is_staff`/`is_superuser` flags. Every account
/// owns exactly one [`crate::models::profile::UserProfile`]; the pair is
/// created together by [`crate::accounts::create_account`], which is why this
/// module has find/update/delete but no insert.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE user_accounts (
///     id BIGSERIAL PRIMARY KEY,
///     email VARCHAR(255) NOT NULL,          -- unique via LOWER(email) index
///     password_hash VARCHAR(255) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_staff BOOLEAN NOT NULL DEFAULT FALSE,
///     is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::models::category::Category;
use crate::models::position::Position;
use crate::models::profile::UserProfile;

/// A user account
///
/// Passwords are stored as Argon2id hashes, never in plaintext, and the hash
/// is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserAccount {
    pub id: i64,

    /// Email address, stored with the domain part lowercased; unique
    /// case-insensitively
    pub email: String,

    /// Argon2id password hash; excluded from every serialized form
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Inactive accounts cannot authenticate
    pub is_active: bool,

    /// Staff accounts are administrators for policy purposes
    pub is_staff: bool,

    /// Set alongside `is_staff` by the admin-creation path
    pub is_superuser: bool,

    pub created_at: DateTime<Utc>,
}

/// Input for updating an account row; only non-None fields are touched
///
/// Callers go through [`crate::accounts::update_credentials`], which
/// normalizes the email and hashes the password before it lands here.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserAccount {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl UserAccount {
    /// Finds an account by ID
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserAccount>(
            r#"
            SELECT id, email, password_hash, is_active, is_staff, is_superuser, created_at
            FROM user_accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds an account by email, case-insensitively
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserAccount>(
            r#"
            SELECT id, email, password_hash, is_active, is_staff, is_superuser, created_at
            FROM user_accounts
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Lists all accounts ordered by id
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserAccount>(
            r#"
            SELECT id, email, password_hash, is_active, is_staff, is_superuser, created_at
            FROM user_accounts
            ORDER BY id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Updates an account row
    ///
    /// Returns the updated account, or None if the id doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the new email collides with another account's
    pub async fn update(
        pool: &PgPool,
        id: i64,
        data: UpdateUserAccount,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut clauses = Vec::new();
        let mut bind_count = 1;

        if data.email.is_some() {
            bind_count += 1;
            clauses.push(format!("email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            clauses.push(format!("password_hash = ${}", bind_count));
        }
        if data.is_active.is_some() {
            bind_count += 1;
            clauses.push(format!("is_active = ${}", bind_count));
        }
        if data.is_staff.is_some() {
            bind_count += 1;
            clauses.push(format!("is_staff = ${}", bind_count));
        }
        if data.is_superuser.is_some() {
            bind_count += 1;
            clauses.push(format!("is_superuser = ${}", bind_count));
        }

        if clauses.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        let query = format!(
            "UPDATE user_accounts SET {} WHERE id = $1 \
             RETURNING id, email, password_hash, is_active, is_staff, is_superuser, created_at",
            clauses.join(", ")
        );

        let mut q = sqlx::query_as::<_, UserAccount>(&query).bind(id);

        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }
        if let Some(is_staff) = data.is_staff {
            q = q.bind(is_staff);
        }
        if let Some(is_superuser) = data.is_superuser {
            q = q.bind(is_superuser);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes an account
    ///
    /// The profile cascades away with it; team memberships held through the
    /// profile cascade as well. Fails with a database error if the profile
    /// still owns tasks (RESTRICT).
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_accounts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// An account joined with its profile, the profile's position, and the
/// position's category — everything the account projection needs, loaded in
/// one query.
#[derive(Debug, Clone)]
pub struct AccountDetail {
    pub account: UserAccount,
    pub profile: UserProfile,
    pub position: Option<Position>,
    pub category: Option<Category>,
}

/// Flat row shape for the detail join; reassembled into [`AccountDetail`].
#[derive(sqlx::FromRow)]
struct AccountDetailRow {
    account_id: i64,
    email: String,
    password_hash: String,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
    created_at: DateTime<Utc>,
    profile_id: i64,
    first_name: String,
    last_name: String,
    profile_position_id: Option<i64>,
    position_title: Option<String>,
    position_description: Option<String>,
    is_task_manager: Option<bool>,
    position_category_id: Option<i64>,
    category_name: Option<String>,
    category_description: Option<String>,
}

const DETAIL_QUERY: &str = r#"
    SELECT a.id AS account_id, a.email, a.password_hash, a.is_active, a.is_staff,
           a.is_superuser, a.created_at,
           p.id AS profile_id, p.first_name, p.last_name,
           p.position_id AS profile_position_id,
           pos.title AS position_title, pos.description AS position_description,
           pos.is_task_manager, pos.category_id AS position_category_id,
           c.name AS category_name, c.description AS category_description
    FROM user_accounts a
    JOIN user_profiles p ON p.account_id = a.id
    LEFT JOIN positions pos ON pos.id = p.position_id
    LEFT JOIN categories c ON c.id = pos.category_id
"#;

impl From<AccountDetailRow> for AccountDetail {
    fn from(row: AccountDetailRow) -> Self {
        let account = UserAccount {
            id: row.account_id,
            email: row.email,
            password_hash: row.password_hash,
            is_active: row.is_active,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            created_at: row.created_at,
        };
        let profile = UserProfile {
            id: row.profile_id,
            account_id: row.account_id,
            first_name: row.first_name,
            last_name: row.last_name,
            position_id: row.profile_position_id,
        };
        let position = match (row.profile_position_id, row.position_title) {
            (Some(id), Some(title)) => Some(Position {
                id,
                title,
                description: row.position_description.unwrap_or_default(),
                is_task_manager: row.is_task_manager.unwrap_or(false),
                category_id: row.position_category_id.unwrap_or_default(),
            }),
            _ => None,
        };
        let category = match (row.position_category_id, row.category_name) {
            (Some(id), Some(name)) => Some(Category {
                id,
                name,
                description: row.category_description.unwrap_or_default(),
            }),
            _ => None,
        };

        AccountDetail {
            account,
            profile,
            position,
            category,
        }
    }
}

impl AccountDetail {
    /// Loads one account with its profile/position/category joins
    pub async fn load(pool: &PgPool, account_id: i64) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("{DETAIL_QUERY} WHERE a.id = $1");

        let row = sqlx::query_as::<_, AccountDetailRow>(&query)
            .bind(account_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Loads every account with its joins, ordered by account id
    pub async fn load_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("{DETAIL_QUERY} ORDER BY a.id");

        let rows = sqlx::query_as::<_, AccountDetailRow>(&query)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
