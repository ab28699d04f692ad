//! Configuration for the Quyca reporting service.

use std::path::PathBuf;
use std::time::Duration;

/// MongoDB collection names of the KAHI database.
pub mod collections {
    /// Research products.
    pub const WORKS: &str = "works";

    /// Researchers.
    pub const PERSON: &str = "person";

    /// Institutions, faculties, departments and research groups.
    pub const AFFILIATIONS: &str = "affiliations";

    /// Journals, conferences and other venues.
    pub const SOURCES: &str = "sources";

    /// Patents.
    pub const PATENTS: &str = "patents";

    /// Research projects.
    pub const PROJECTS: &str = "projects";
}

/// Result size limits.
pub mod limits {
    /// Default page size for product listings.
    pub const DEFAULT_PAGE_SIZE: i64 = 10;

    /// Largest page size a client may request.
    pub const MAX_PAGE_SIZE: i64 = 250;

    /// Highest page number a client may request.
    pub const MAX_PAGE: i64 = 100_000;

    /// Nodes kept in a collaboration network.
    pub const NETWORK_MAX_NODES: usize = 50;

    /// Works scanned when building a collaboration network.
    pub const NETWORK_WORK_LIMIT: i64 = 5000;

    /// Slices shown in pie plots before folding into "Others".
    pub const PIE_TOP: usize = 10;

    /// Publishers shown in the annual publisher plot.
    pub const TOP_PUBLISHERS: usize = 5;
}

/// Cache defaults.
pub mod cache {
    use std::time::Duration;

    /// Plot and indicator cache TTL (10 minutes).
    pub const TTL: Duration = Duration::from_secs(600);

    /// Maximum cached entries.
    pub const MAX_SIZE: u64 = 2000;
}

/// Default MongoDB connection string.
pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";

/// Default database name.
pub const DEFAULT_DATABASE: &str = "kahi";

/// Default home country for the city collaboration map.
pub const DEFAULT_HOME_COUNTRY: &str = "CO";

/// Language preferred when picking titles and names.
pub const DISPLAY_LANG: &str = "es";

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// MongoDB connection string.
    pub mongo_uri: String,

    /// Database holding the KAHI collections.
    pub database: String,

    /// ISO-3166 alpha-2 code used by the city collaboration map.
    pub home_country: String,

    /// Year APC amounts are normalized to (USD of that year).
    pub apc_target_year: i32,

    /// Optional JSON file overriding the built-in currency tables.
    pub currency_table: Option<PathBuf>,

    /// Cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cache size.
    pub cache_max_size: u64,

    /// Nodes kept in collaboration networks.
    pub network_max_nodes: usize,

    /// Works scanned when building a collaboration network.
    pub network_work_limit: i64,
}

impl Config {
    /// Create a configuration for the given database.
    #[must_use]
    pub fn new(mongo_uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            mongo_uri: mongo_uri.into(),
            database: database.into(),
            home_country: DEFAULT_HOME_COUNTRY.to_string(),
            apc_target_year: crate::stats::currency::LATEST_CPI_YEAR,
            currency_table: None,
            cache_ttl: cache::TTL,
            cache_max_size: cache::MAX_SIZE,
            network_max_nodes: limits::NETWORK_MAX_NODES,
            network_work_limit: limits::NETWORK_WORK_LIMIT,
        }
    }

    /// Create a test configuration with caching disabled.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            cache_ttl: Duration::from_secs(0),
            cache_max_size: 0,
            ..Self::new(DEFAULT_MONGO_URI, "kahi_test")
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads a `.env` file first when one is present.
    ///
    /// # Errors
    ///
    /// Returns error if environment variables are invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let mongo_uri =
            std::env::var("MONGO_URI").unwrap_or_else(|_| DEFAULT_MONGO_URI.to_string());
        let database =
            std::env::var("MONGO_DATABASE").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());

        let mut config = Self::new(mongo_uri, database);

        if let Ok(country) = std::env::var("QUYCA_HOME_COUNTRY") {
            config = config.with_home_country(&country)?;
        }
        if let Ok(path) = std::env::var("QUYCA_CURRENCY_TABLE") {
            config.currency_table = Some(PathBuf::from(path));
        }
        if let Ok(year) = std::env::var("QUYCA_APC_YEAR") {
            config.apc_target_year = year.parse()?;
        }

        Ok(config)
    }

    /// Set the home country, validating the ISO code.
    ///
    /// # Errors
    ///
    /// Returns error if the code is not two ASCII letters.
    pub fn with_home_country(mut self, code: &str) -> anyhow::Result<Self> {
        let code = code.trim();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            anyhow::bail!("home country must be an ISO-3166 alpha-2 code, got '{code}'");
        }
        self.home_country = code.to_ascii_uppercase();
        Ok(self)
    }

    /// Check if result caching is enabled.
    #[must_use]
    pub const fn caching_enabled(&self) -> bool {
        self.cache_max_size > 0 && !self.cache_ttl.is_zero()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_MONGO_URI, DEFAULT_DATABASE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.database, "kahi");
        assert_eq!(config.home_country, "CO");
        assert!(config.caching_enabled());
    }

    #[test]
    fn test_config_for_testing_disables_cache() {
        let config = Config::for_testing();
        assert!(!config.caching_enabled());
    }

    #[test]
    fn test_home_country_validation() {
        let config = Config::default().with_home_country("mx").unwrap();
        assert_eq!(config.home_country, "MX");

        assert!(Config::default().with_home_country("MEX").is_err());
        assert!(Config::default().with_home_country("1A").is_err());
    }
}
