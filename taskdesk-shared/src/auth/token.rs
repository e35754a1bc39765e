/// Access token generation and validation
///
/// HS256-signed JWTs carrying the numeric account id in `sub`. The API never
/// issues tokens over HTTP (an external identity service owns the login
/// flow); this module exists so that issuer, the request-authentication
/// layer, and the test suite agree on one format.
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::token::{create_token, validate_token};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let token = create_token(42, "secret-key")?;
/// let claims = validate_token(&token, "secret-key")?;
/// assert_eq!(claims.sub, 42);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer claim stamped into and required from every token
pub const TOKEN_ISSUER: &str = "taskdesk";

/// Access token lifetime: 24 hours
const TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Claims carried by a TaskDesk access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id of the authenticated user
    pub sub: i64,

    /// Token issuer, always [`TOKEN_ISSUER`]
    pub iss: String,

    /// Issued-at (unix seconds)
    pub iat: i64,

    /// Expiration (unix seconds)
    pub exp: i64,

    /// Not-before (unix seconds)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims for the given account id, valid from now for the
    /// standard token lifetime.
    pub fn new(account_id: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: account_id,
            iss: TOKEN_ISSUER.to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECONDS,
            nbf: now,
        }
    }
}

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token is not yet valid (nbf in the future)
    #[error("Token is not yet valid")]
    NotYetValid,

    /// Token was issued by someone else
    #[error("Invalid token issuer")]
    InvalidIssuer,

    /// Token is malformed or the signature doesn't check out
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Failed to sign a new token
    #[error("Failed to create token: {0}")]
    Creation(String),
}

/// Creates a signed access token for the given account id
///
/// # Errors
///
/// Returns `TokenError::Creation` if signing fails
pub fn create_token(account_id: i64, secret: &str) -> Result<String, TokenError> {
    let claims = Claims::new(account_id);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Creation(e.to_string()))
}

/// Validates a token's signature, expiry, not-before, and issuer, returning
/// its claims
///
/// # Errors
///
/// Returns the matching `TokenError` variant for expired, immature, or
/// wrong-issuer tokens, and `TokenError::Invalid` for everything else
/// (bad signature, malformed token).
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        jsonwebtoken::errors::ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
        _ => TokenError::Invalid(e.to_string()),
    })?;

    Ok(token_data.claims)
}
