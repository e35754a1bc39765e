//! Account lifecycle service
//!
//! The only way accounts come into existence. Every account is created
//! together with its profile inside one transaction, so a half-created
//! account (no profile) can never be observed. The models themselves
//! expose no account insert.
//!
//! ```no_run
//! # use taskdesk_shared::accounts::{self, AccountInput, ProfileInput};
//! # use sqlx::PgPool;
//! # async fn example(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let (account, profile) = accounts::create_account(
//!     pool,
//!     AccountInput {
//!         email: "Pat@Example.COM".to_string(),
//!         password: "correct horse battery".to_string(),
//!     },
//!     ProfileInput {
//!         first_name: "Pat".to_string(),
//!         last_name: "Doe".to_string(),
//!         position_id: None,
//!     },
//! )
//! .await?;
//!
//! // only the domain part of the email is folded
//! assert_eq!(account.email, "Pat@example.com");
//! assert_eq!(profile.account_id, account.id);
//! # Ok(())
//! # }
//! ```

use sqlx::PgPool;

use crate::auth::password::hash_password;
use crate::error::{classify_email_conflict, DomainError};
use crate::models::profile::UserProfile;
use crate::models::user::{UpdateUserAccount, UserAccount};
use crate::policy::Actor;

/// Account half of a creation request
#[derive(Debug, Clone)]
pub struct AccountInput {
    pub email: String,
    /// Plaintext password; hashed before it reaches the store
    pub password: String,
}

/// Profile half of a creation request
#[derive(Debug, Clone)]
pub struct ProfileInput {
    pub first_name: String,
    pub last_name: String,
    pub position_id: Option<i64>,
}

/// Credential changes for an existing account; None fields are untouched
#[derive(Debug, Clone, Default)]
pub struct CredentialsUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Normalizes an email address by lowercasing its domain part
///
/// The local part is preserved as given; domains are case-insensitive per
/// RFC 5321, local parts technically aren't.
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Creates a regular account with its profile
///
/// # Errors
///
/// - `DomainError::UniquenessViolation` if the email is already registered
/// - `DomainError::ReferenceNotFound` if the position id doesn't exist
/// - `DomainError::Password` if hashing fails
pub async fn create_account(
    pool: &PgPool,
    account: AccountInput,
    profile: ProfileInput,
) -> Result<(UserAccount, UserProfile), DomainError> {
    create_with_flags(pool, account, profile, false, false).await
}

/// Creates a staff account with its profile
///
/// Bootstrap path for the first administrator; not reachable from any
/// public endpoint.
pub async fn create_admin_account(
    pool: &PgPool,
    account: AccountInput,
    profile: ProfileInput,
) -> Result<(UserAccount, UserProfile), DomainError> {
    create_with_flags(pool, account, profile, true, true).await
}

async fn create_with_flags(
    pool: &PgPool,
    account: AccountInput,
    profile: ProfileInput,
    is_staff: bool,
    is_superuser: bool,
) -> Result<(UserAccount, UserProfile), DomainError> {
    let email = normalize_email(&account.email);
    let password_hash = hash_password(&account.password)?;

    let mut tx = pool.begin().await?;

    let created = sqlx::query_as::<_, UserAccount>(
        "INSERT INTO user_accounts (email, password_hash, is_staff, is_superuser) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, email, password_hash, is_active, is_staff, is_superuser, created_at",
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(is_staff)
    .bind(is_superuser)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| classify_email_conflict(e, &email))?;

    let created_profile = sqlx::query_as::<_, UserProfile>(
        "INSERT INTO user_profiles (account_id, first_name, last_name, position_id) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, account_id, first_name, last_name, position_id",
    )
    .bind(created.id)
    .bind(&profile.first_name)
    .bind(&profile.last_name)
    .bind(profile.position_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match (&e, profile.position_id) {
        (sqlx::Error::Database(db_err), Some(position_id))
            if db_err
                .constraint()
                .map(|c| c.contains("position"))
                .unwrap_or(false) =>
        {
            DomainError::unknown_pk("position", position_id)
        }
        _ => DomainError::Database(e),
    })?;

    tx.commit().await?;

    tracing::info!(
        account_id = created.id,
        profile_id = created_profile.id,
        is_staff,
        "user account created"
    );

    Ok((created, created_profile))
}

/// Updates an account's email and/or password
///
/// The email is normalized and the password hashed exactly as on creation.
/// Returns None when the account id doesn't exist.
///
/// # Errors
///
/// - `DomainError::UniquenessViolation` if the new email is taken
/// - `DomainError::Password` if hashing fails
pub async fn update_credentials(
    pool: &PgPool,
    account_id: i64,
    update: CredentialsUpdate,
) -> Result<Option<UserAccount>, DomainError> {
    let email = update.email.map(|e| normalize_email(&e));
    let password_hash = match update.password {
        Some(password) => Some(hash_password(&password)?),
        None => None,
    };

    let data = UpdateUserAccount {
        email: email.clone(),
        password_hash,
        is_active: None,
        is_staff: None,
        is_superuser: None,
    };

    let updated = UserAccount::update(pool, account_id, data)
        .await
        .map_err(|e| match email {
            Some(ref email) => classify_email_conflict(e, email),
            None => DomainError::Database(e),
        })?;

    Ok(updated)
}

/// Resolves an authenticated account id into a policy [`Actor`]
///
/// Inactive or missing accounts resolve to None so callers treat the
/// credential as dead even when the token itself is still valid.
pub async fn resolve_actor(pool: &PgPool, account_id: i64) -> Result<Option<Actor>, sqlx::Error> {
    sqlx::query_as::<_, Actor>(
        r#"
        SELECT a.id AS account_id, p.id AS profile_id, a.email, a.is_staff, a.is_superuser
        FROM user_accounts a
        JOIN user_profiles p ON p.account_id = a.id
        WHERE a.id = $1 AND a.is_active = TRUE
        "#,
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_folds_domain_only() {
        assert_eq!(normalize_email("Pat@Example.COM"), "Pat@example.com");
        assert_eq!(normalize_email("pat@example.com"), "pat@example.com");
    }

    #[test]
    fn test_normalize_email_preserves_local_part_case() {
        assert_eq!(normalize_email("MixedCase@EXAMPLE.ORG"), "MixedCase@example.org");
    }

    #[test]
    fn test_normalize_email_without_at_sign_is_untouched() {
        assert_eq!(normalize_email("not-an-email"), "not-an-email");
    }

    #[test]
    fn test_normalize_email_uses_last_at_sign() {
        // quoted local parts may contain '@'; only the real domain folds
        assert_eq!(normalize_email("\"odd@local\"@Example.COM"), "\"odd@local\"@example.com");
    }
}
