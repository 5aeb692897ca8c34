//! Argon2id password hasher.
//!
//! Defaults to m=19456 KiB, t=2, p=1. Hashes are PHC strings and carry
//! their own parameters.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use storefront_application::PasswordHasher as PasswordHasherPort;
use storefront_core::{AppError, AppResult};

/// Memory cost in KiB.
const DEFAULT_MEMORY_KIB: u32 = 19_456;
/// Number of passes.
const DEFAULT_ITERATIONS: u32 = 2;
/// Degree of parallelism.
const DEFAULT_PARALLELISM: u32 = 1;

/// Argon2id implementation of the password hashing port.
#[derive(Clone)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// Creates a hasher with the default cost parameters.
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(
            DEFAULT_MEMORY_KIB,
            DEFAULT_ITERATIONS,
            DEFAULT_PARALLELISM,
            None,
        )
        .unwrap_or_default();

        Self::from_params(params)
    }

    /// Creates a hasher with explicit cost parameters.
    pub fn with_cost(memory_kib: u32, iterations: u32, parallelism: u32) -> AppResult<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|error| {
            AppError::Validation(format!("invalid argon2 parameters: {error}"))
        })?;

        Ok(Self::from_params(params))
    }

    fn from_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasherPort for Argon2PasswordHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|error| AppError::Internal(format!("failed to hash password: {error}")))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash).map_err(|error| {
            AppError::Internal(format!("stored password hash is malformed: {error}"))
        })?;

        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(error) => Err(AppError::Internal(format!(
                "password verification failed: {error}"
            ))),
        }
    }
}
