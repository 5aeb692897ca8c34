//! HS256 JSON Web Token adapter for the access token port.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use storefront_application::AccessTokenService;
use storefront_core::{AppError, AppResult, Role, UserIdentity};

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    roles: Vec<Role>,
    iat: i64,
    exp: i64,
}

/// Issues and verifies HS256-signed access tokens.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in: TimeDelta,
}

impl JwtTokenService {
    /// Creates a token service signing with `secret`. Tokens expire
    /// `expires_in_seconds` after issue.
    pub fn new(secret: &str, expires_in_seconds: u64) -> AppResult<Self> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(AppError::Validation(format!(
                "JWT secret must be at least {MIN_SECRET_LENGTH} characters"
            )));
        }

        let expires_in = i64::try_from(expires_in_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .filter(|expires_in| *expires_in > TimeDelta::zero())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "token lifetime {expires_in_seconds}s is out of range"
                ))
            })?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expires_in,
        })
    }

    fn issue_at(&self, identity: &UserIdentity, issued_at: DateTime<Utc>) -> AppResult<String> {
        let claims = Claims {
            sub: identity.subject().to_owned(),
            username: identity.username().to_owned(),
            roles: identity.roles().to_vec(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.expires_in).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|error| AppError::Internal(format!("failed to sign access token: {error}")))
    }
}

impl AccessTokenService for JwtTokenService {
    fn issue(&self, identity: &UserIdentity) -> AppResult<String> {
        self.issue_at(identity, Utc::now())
    }

    fn verify(&self, token: &str) -> AppResult<UserIdentity> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|error| {
            tracing::debug!(error = %error, "rejected access token");
            AppError::Unauthorized("Invalid or expired token".to_owned())
        })?;

        let claims = data.claims;
        Ok(UserIdentity::new(claims.sub, claims.username, claims.roles))
    }
}
