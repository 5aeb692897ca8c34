const UNKNOWN_ADDRESS: &str = "unknown";

/// Identity a request is counted against.
///
/// Bearer credentials take priority over the client address. The raw
/// credential is the key, so two tokens for the same account are two buckets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RateLimitKey {
    /// Caller presented a bearer credential.
    User(String),
    /// Anonymous caller identified by its network address.
    Ip(String),
}

impl RateLimitKey {
    /// Derives the key for a request.
    ///
    /// `client_address` should already be resolved (forwarded-for entry first,
    /// then the transport peer address). Blank inputs are ignored.
    #[must_use]
    pub fn for_request(bearer_token: Option<&str>, client_address: Option<&str>) -> Self {
        if let Some(token) = bearer_token.map(str::trim).filter(|token| !token.is_empty()) {
            return Self::User(token.to_owned());
        }

        let address = client_address
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .unwrap_or(UNKNOWN_ADDRESS);

        Self::Ip(address.to_owned())
    }

    /// Returns `"user"` or `"ip"`; safe to log.
    #[must_use]
    pub fn scope(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Ip(_) => "ip",
        }
    }

    /// Returns the bucket key, `"user:<token>"` or `"ip:<address>"`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        match self {
            Self::User(token) => format!("user:{token}"),
            Self::Ip(address) => format!("ip:{address}"),
        }
    }
}
