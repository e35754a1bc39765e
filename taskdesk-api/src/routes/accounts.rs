/// User account endpoints
///
/// # Endpoints
///
/// - `POST /v1/accounts` - Create account + profile (admin only)
/// - `GET /v1/accounts` - List accounts (any authenticated)
/// - `GET /v1/accounts/:id` - Retrieve one account (any authenticated)
/// - `PUT/PATCH /v1/accounts/:id` - Update email/password (admin or self)
/// - `DELETE /v1/accounts/:id` - Delete account (admin or self)
///
/// Responses never carry password material; the account view nests
/// profile → position → category with the category in slug form.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use taskdesk_shared::accounts::{self, AccountInput, CredentialsUpdate, ProfileInput};
use taskdesk_shared::error::DomainError;
use taskdesk_shared::models::position::Position;
use taskdesk_shared::models::user::{AccountDetail, UserAccount};
use taskdesk_shared::policy::{authorize, Action, Target};
use taskdesk_shared::views::{AccountView, CategoryMode};

use crate::{
    app::AppState,
    error::{validation_errors, ApiError, ApiResult},
    extract::AuthPrincipal,
};

/// Create account request
///
/// Two grouped payloads flattened into one body: account fields (email,
/// password + confirmation) and profile fields (names, optional position
/// by title).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    /// Email address; domain part is lowercased before storage
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    /// Plaintext password; hashed before persistence
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Must match `password` exactly; discarded after the check
    pub password_confirmation: String,

    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,

    /// Position referenced by its title (slug form)
    pub position: Option<String>,
}

/// Update account request; both PUT and PATCH apply partial semantics
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    /// Required whenever `password` is present
    pub password_confirmation: Option<String>,
}

/// Mutation response envelope
#[derive(Debug, Serialize)]
pub struct AccountEnvelope {
    pub message: String,
    pub data: AccountView,
}

/// Checks the password-confirmation pair and discards the confirmation
///
/// The exact mismatch message is a documented contract.
fn check_password_confirmation(password: &str, confirmation: &str) -> Result<(), ApiError> {
    if password != confirmation {
        return Err(ApiError::non_field("Passwords do not match!"));
    }
    Ok(())
}

/// Resolves an optional position title to its id
async fn resolve_position(state: &AppState, title: Option<&str>) -> Result<Option<i64>, ApiError> {
    let Some(title) = title else {
        return Ok(None);
    };

    let position = Position::find_by_title(&state.db, title)
        .await?
        .ok_or_else(|| DomainError::unknown_slug("position", "title", title))?;

    Ok(Some(position.id))
}

/// Loads the account view served by every account endpoint
async fn load_account_view(state: &AppState, account_id: i64) -> Result<AccountView, ApiError> {
    let detail = AccountDetail::load(&state.db, account_id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(AccountView::from_detail(&detail, CategoryMode::Slug))
}

/// Create a new account with its profile (admin only)
///
/// # Errors
///
/// - `400 Bad Request`: validation failure, password mismatch, duplicate
///   email, unknown position title
/// - `401 Unauthorized`: no usable credentials
/// - `403 Forbidden`: authenticated caller is not an administrator
pub async fn create_account(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<AccountEnvelope>)> {
    authorize(&principal, Action::CreateAccount, &Target::Collection)?;

    req.validate().map_err(validation_errors)?;
    check_password_confirmation(&req.password, &req.password_confirmation)?;

    let position_id = resolve_position(&state, req.position.as_deref()).await?;

    let (account, _profile) = accounts::create_account(
        &state.db,
        AccountInput {
            email: req.email,
            password: req.password,
        },
        ProfileInput {
            first_name: req.first_name,
            last_name: req.last_name,
            position_id,
        },
    )
    .await?;

    let view = load_account_view(&state, account.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountEnvelope {
            message: "User successfully created".to_string(),
            data: view,
        }),
    ))
}

/// List all accounts (any authenticated caller)
pub async fn list_accounts(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> ApiResult<Json<Vec<AccountView>>> {
    authorize(&principal, Action::ReadAccount, &Target::Collection)?;

    let details = AccountDetail::load_all(&state.db).await?;
    let views = details
        .iter()
        .map(|detail| AccountView::from_detail(detail, CategoryMode::Slug))
        .collect();

    Ok(Json(views))
}

/// Retrieve one account (any authenticated caller)
pub async fn get_account(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<i64>,
) -> ApiResult<Json<AccountView>> {
    authorize(&principal, Action::ReadAccount, &Target::Account { account_id: id })?;

    let view = load_account_view(&state, id).await?;
    Ok(Json(view))
}

/// Update an account's email and/or password (admin or the account itself)
///
/// A password change requires the matching confirmation; the confirmation
/// is never persisted.
pub async fn update_account(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAccountRequest>,
) -> ApiResult<Json<AccountEnvelope>> {
    let actor = authorize(&principal, Action::UpdateAccount, &Target::Account { account_id: id })?;
    tracing::info!(account_id = id, caller = actor.account_id, "account update");

    req.validate().map_err(validation_errors)?;

    if let Some(ref password) = req.password {
        let confirmation = req.password_confirmation.as_deref().ok_or_else(|| {
            ApiError::field(
                "password_confirmation",
                "This field is required when changing the password.",
            )
        })?;
        check_password_confirmation(password, confirmation)?;
    }

    let updated = accounts::update_credentials(
        &state.db,
        id,
        CredentialsUpdate {
            email: req.email,
            password: req.password,
        },
    )
    .await?
    .ok_or_else(ApiError::not_found)?;

    let view = load_account_view(&state, updated.id).await?;

    Ok(Json(AccountEnvelope {
        message: "User successfully updated".to_string(),
        data: view,
    }))
}

/// Delete an account (admin or the account itself)
///
/// The profile cascades away with the account. Deleting an account whose
/// profile still owns tasks is blocked by the store and answers 400.
pub async fn delete_account(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let actor = authorize(&principal, Action::DeleteAccount, &Target::Account { account_id: id })?;
    tracing::info!(account_id = id, caller = actor.account_id, "account delete");

    let deleted = UserAccount::delete(&state.db, id).await.map_err(ApiError::from)?;
    if !deleted {
        return Err(ApiError::not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}
