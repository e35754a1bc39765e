/// Common error types for the TaskDesk domain layer.
use thiserror::Error;

use crate::auth::password::PasswordError;

/// Errors produced by domain operations (account lifecycle, task mutations,
/// reference resolution).
///
/// The API layer maps these onto HTTP statuses: `UniquenessViolation` and
/// `ReferenceNotFound` become 400 validation failures, `NotTeamMember`
/// becomes a 400 with the current member list, and `Database` falls through
/// to the generic sqlx mapping.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A unique column already holds the given value.
    #[error("{message}")]
    UniquenessViolation {
        field: &'static str,
        message: String,
    },

    /// A reference (slug, primary key) did not resolve to an existing row.
    #[error("{message}")]
    ReferenceNotFound {
        field: &'static str,
        message: String,
    },

    /// A membership removal named an account that is not on the task's team.
    #[error("User is not a team member")]
    NotTeamMember { task_id: i64, account_id: i64 },

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl DomainError {
    /// Duplicate email on account create or update.
    pub fn duplicate_email(email: &str) -> Self {
        DomainError::UniquenessViolation {
            field: "email",
            message: format!("user account with email {email} already exists"),
        }
    }

    /// A slug (category name, priority/status caption) did not resolve.
    pub fn unknown_slug(field: &'static str, slug_field: &'static str, value: &str) -> Self {
        DomainError::ReferenceNotFound {
            field,
            message: format!("Object with {slug_field}={value} does not exist."),
        }
    }

    /// A primary-key reference did not resolve.
    pub fn unknown_pk(field: &'static str, id: i64) -> Self {
        DomainError::ReferenceNotFound {
            field,
            message: format!("Invalid pk \"{id}\" - object does not exist."),
        }
    }

    /// A team mutation named an account id with no matching profile.
    pub fn unknown_team_member(account_id: i64) -> Self {
        DomainError::ReferenceNotFound {
            field: "team_members",
            message: format!("Team member with id {account_id} does not exist"),
        }
    }
}

/// Classifies an insert/update failure against the email uniqueness
/// constraint; everything else passes through as a database error.
pub(crate) fn classify_email_conflict(err: sqlx::Error, email: &str) -> DomainError {
    if let sqlx::Error::Database(ref db_err) = err {
        let is_email_conflict = db_err
            .constraint()
            .map(|c| c.contains("email"))
            .unwrap_or(false);
        if is_email_conflict {
            return DomainError::duplicate_email(email);
        }
    }
    DomainError::Database(err)
}
