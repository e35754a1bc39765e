/// Authentication utilities
///
/// This module provides the authentication primitives for TaskDesk:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`token`]: Access token generation and validation
///
/// Token issuance endpoints live outside this service; the token module is
/// the seam the external issuer and the test suite share with the API's
/// request authentication.
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::password::{hash_password, verify_password};
/// use taskdesk_shared::auth::token::{create_token, validate_token};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Password authentication
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// // Access token for account id 1
/// let token = create_token(1, "secret-key")?;
/// let claims = validate_token(&token, "secret-key")?;
/// assert_eq!(claims.sub, 1);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```

pub mod password;
pub mod token;
