//! Read-only extraction of the claims carried by a session token.
//!
//! The signature is NOT verified here. Claims are only used to decide what to
//! show and where to navigate; the backend remains the authority on every
//! request it receives.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

use super::role::UserRole;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub role: UserRole,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no session token")]
    MissingToken,
    #[error("malformed session token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),
}

fn claims_only_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    validation
}

/// Decodes the claims of `token` without checking its signature or expiry.
pub fn decode_claims(token: &str) -> Result<Claims, DecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DecodeError::MissingToken);
    }
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(&[]),
        &claims_only_validation(),
    )?;
    Ok(data.claims)
}
