//! Platform configuration — loaded from environment variables.

/// Default import payload ceiling: 1 MiB.
pub const DEFAULT_MAX_IMPORT_BYTES: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct ImpactConfig {
    /// Allowed CORS origin; `*` allows any.
    pub cors_origin: String,
    /// Load the mock dataset into an empty store at startup.
    pub seed_data: bool,
    /// Largest accepted import body, in bytes.
    pub max_import_bytes: usize,
    /// Featured organizations returned by the landing page.
    pub featured_limit: usize,
    /// Days before an unaccepted invitation expires.
    pub invitation_ttl_days: i64,
    /// Maximum pooled database connections.
    pub db_pool_size: usize,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            cors_origin: "*".to_string(),
            seed_data: true,
            max_import_bytes: DEFAULT_MAX_IMPORT_BYTES,
            featured_limit: 3,
            invitation_ttl_days: 14,
            db_pool_size: 10,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl ImpactConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origin = std::env::var("IMPACT_CORS_ORIGIN").unwrap_or(defaults.cors_origin);
        let seed_data = std::env::var("IMPACT_SEED_DATA")
            .ok()
            .map(|s| !matches!(s.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(defaults.seed_data);
        let max_import_bytes =
            env_parse("IMPACT_MAX_IMPORT_BYTES").unwrap_or(defaults.max_import_bytes);
        let featured_limit = env_parse("IMPACT_FEATURED_LIMIT").unwrap_or(defaults.featured_limit);
        let invitation_ttl_days =
            env_parse("IMPACT_INVITATION_TTL_DAYS").unwrap_or(defaults.invitation_ttl_days);
        let db_pool_size = env_parse("IMPACT_DB_POOL_SIZE").unwrap_or(defaults.db_pool_size);

        if cors_origin == "*" {
            tracing::warn!("IMPACT_CORS_ORIGIN not set -- accepting requests from any origin");
        }

        Self {
            cors_origin,
            seed_data,
            max_import_bytes,
            featured_limit,
            invitation_ttl_days,
            db_pool_size,
        }
    }
}
