use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use storefront_application::{DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_MS, RateLimitRule};
use storefront_core::AppError;
use storefront_infrastructure::MIN_SECRET_LENGTH;
use tracing_subscriber::EnvFilter;

const DEFAULT_JWT_EXPIRES_IN_SECONDS: u64 = 3_600;
const DEFAULT_API_PORT: u16 = 3_000;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 60;

/// Where rate limit buckets live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitStore {
    /// Process-local map; counts are per instance.
    Memory,
    /// Shared `rate_limit_buckets` table.
    Postgres,
}

impl FromStr for RateLimitStore {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres),
            other => Err(AppError::Validation(format!(
                "RATE_LIMIT_STORE must be either 'memory' or 'postgres', got '{other}'"
            ))),
        }
    }
}

/// Credentials for the account created at start-up.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expires_in_seconds: u64,
    pub api_host: String,
    pub api_port: u16,
    pub frontend_urls: Vec<String>,
    pub rate_limit_rule: RateLimitRule,
    pub rate_limit_store: RateLimitStore,
    pub rate_limit_sweep_interval: Duration,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &str| {
            optional(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < MIN_SECRET_LENGTH {
            return Err(AppError::Validation(format!(
                "JWT_SECRET must be at least {MIN_SECRET_LENGTH} characters"
            )));
        }

        let jwt_expires_in_seconds = parse_or(
            "JWT_EXPIRES_IN_SECONDS",
            optional("JWT_EXPIRES_IN_SECONDS"),
            DEFAULT_JWT_EXPIRES_IN_SECONDS,
        )?;
        let api_host = optional("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = parse_or("API_PORT", optional("API_PORT"), DEFAULT_API_PORT)?;

        let frontend_urls = optional("FRONTEND_URLS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_owned())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(ToOwned::to_owned)
            .collect::<Vec<_>>();

        let rate_limit_rule = RateLimitRule::new(
            parse_or(
                "RATE_LIMIT_WINDOW_MS",
                optional("RATE_LIMIT_WINDOW_MS"),
                DEFAULT_WINDOW_MS,
            )?,
            parse_or(
                "RATE_LIMIT_MAX_REQUESTS",
                optional("RATE_LIMIT_MAX_REQUESTS"),
                DEFAULT_MAX_REQUESTS,
            )?,
        )?;
        let rate_limit_store = optional("RATE_LIMIT_STORE")
            .map(|value| RateLimitStore::from_str(&value))
            .transpose()?
            .unwrap_or(RateLimitStore::Memory);
        let sweep_seconds = parse_or(
            "RATE_LIMIT_SWEEP_INTERVAL_SECONDS",
            optional("RATE_LIMIT_SWEEP_INTERVAL_SECONDS"),
            DEFAULT_SWEEP_INTERVAL_SECONDS,
        )?;
        if sweep_seconds == 0 {
            return Err(AppError::Validation(
                "RATE_LIMIT_SWEEP_INTERVAL_SECONDS must be greater than zero".to_owned(),
            ));
        }

        let bootstrap_admin = match (optional("ADMIN_USERNAME"), optional("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(BootstrapAdmin { username, password }),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "ADMIN_USERNAME and ADMIN_PASSWORD must be set together".to_owned(),
                ));
            }
        };

        Ok(Self {
            migrate_only,
            database_url,
            jwt_secret,
            jwt_expires_in_seconds,
            api_host,
            api_port,
            frontend_urls,
            rate_limit_rule,
            rate_limit_store,
            rate_limit_sweep_interval: Duration::from_secs(sweep_seconds),
            bootstrap_admin,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_or<T>(name: &str, value: Option<String>, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use storefront_core::AppError;

    use super::{ApiConfig, RateLimitStore};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(pairs: &[(&str, &str)]) -> Result<ApiConfig, AppError> {
        let mut vars = HashMap::from([("DATABASE_URL", "postgres://localhost/shop"), ("JWT_SECRET", SECRET)]);
        vars.extend(pairs.iter().copied());
        ApiConfig::from_lookup(false, |name| vars.get(name).map(|value| (*value).to_owned()))
    }

    #[test]
    fn defaults_apply_when_optional_variables_are_unset() -> Result<(), AppError> {
        let config = load(&[])?;

        assert_eq!(config.api_port, 3_000);
        assert_eq!(config.jwt_expires_in_seconds, 3_600);
        assert_eq!(config.frontend_urls, vec!["http://localhost:5173".to_owned()]);
        assert_eq!(config.rate_limit_rule.window_ms(), 900_000);
        assert_eq!(config.rate_limit_rule.max_requests(), 100);
        assert_eq!(config.rate_limit_store, RateLimitStore::Memory);
        assert_eq!(config.rate_limit_sweep_interval.as_secs(), 60);
        assert!(config.bootstrap_admin.is_none());
        Ok(())
    }

    #[test]
    fn overrides_are_parsed() -> Result<(), AppError> {
        let config = load(&[
            ("RATE_LIMIT_WINDOW_MS", "1000"),
            ("RATE_LIMIT_MAX_REQUESTS", "2"),
            ("RATE_LIMIT_STORE", "Postgres"),
            ("FRONTEND_URLS", "http://a.test, http://b.test,"),
            ("ADMIN_USERNAME", "root"),
            ("ADMIN_PASSWORD", "rootpass"),
        ])?;

        assert_eq!(config.rate_limit_rule.window_ms(), 1_000);
        assert_eq!(config.rate_limit_rule.max_requests(), 2);
        assert_eq!(config.rate_limit_store, RateLimitStore::Postgres);
        assert_eq!(config.frontend_urls, vec!["http://a.test", "http://b.test"]);
        assert_eq!(
            config.bootstrap_admin.map(|admin| admin.username),
            Some("root".to_owned())
        );
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() {
        for pairs in [
            &[("RATE_LIMIT_WINDOW_MS", "0")][..],
            &[("RATE_LIMIT_MAX_REQUESTS", "lots")][..],
            &[("RATE_LIMIT_STORE", "redis")][..],
            &[("API_PORT", "70000")][..],
            &[("JWT_SECRET", "too-short")][..],
            &[("ADMIN_USERNAME", "root")][..],
        ] {
            assert!(matches!(load(pairs), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn missing_required_variable_is_reported() {
        let result = ApiConfig::from_lookup(false, |_| None);
        assert!(matches!(result, Err(AppError::Validation(message)) if message.contains("DATABASE_URL")));
    }

    #[test]
    fn socket_address_rejects_bad_host() -> Result<(), AppError> {
        let mut config = load(&[])?;
        assert_eq!(config.socket_address()?.port(), 3_000);

        config.api_host = "not-an-ip".to_owned();
        assert!(config.socket_address().is_err());
        Ok(())
    }
}
