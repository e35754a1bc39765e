/// Principal extraction from request credentials
///
/// Resolves the `Authorization: Bearer` header into a policy
/// [`Principal`]. Unlike a gate-everything middleware, the extractor lets
/// anonymous requests through as [`Principal::Anonymous`] so the policy
/// engine can make the 401-vs-403 distinction itself; only credentials
/// that are present but unusable are rejected here.
///
/// - No `Authorization` header → `Anonymous`
/// - Header without a `Bearer ` prefix → 401
/// - Malformed, expired, or wrong-issuer token → 401
/// - Valid token whose account is missing or inactive → `Anonymous`
///   (a dead credential is treated the same as none)
/// - Valid token, active account → `Known(Actor)`
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use taskdesk_shared::accounts::resolve_actor;
use taskdesk_shared::auth::token::validate_token;
use taskdesk_shared::policy::Principal;

use crate::app::AppState;
use crate::error::ApiError;

/// Extractor wrapping the resolved [`Principal`] of a request
pub struct AuthPrincipal(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AuthPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
        else {
            return Ok(AuthPrincipal(Principal::Anonymous));
        };

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

        let claims = validate_token(token, state.jwt_secret())?;

        let principal = match resolve_actor(&state.db, claims.sub).await? {
            Some(actor) => {
                tracing::debug!(account_id = actor.account_id, "resolved principal");
                Principal::Known(actor)
            }
            None => {
                tracing::debug!(account_id = claims.sub, "token names a dead account");
                Principal::Anonymous
            }
        };

        Ok(AuthPrincipal(principal))
    }
}
