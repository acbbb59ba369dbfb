//! Process-wide configuration.
//!
//! Loaded once at startup from environment variables (`.env` is read via
//! `dotenvy` in development, the way `edgelord`'s CLI does). Every field
//! except `auto_execute` is immutable for the life of the process; the
//! spec's invariant (§3 Configuration) is enforced by giving `auto_execute`
//! its own atomic cell rather than folding it into the snapshot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;
use url::Url;

use crate::error::{Error, Result};

/// Per-venue connection endpoints and credentials.
#[derive(Debug, Clone)]
pub struct VenueEndpoints {
    pub ws_url: Url,
    pub api_url: Url,
    pub api_key: String,
    pub private_key: String,
}

/// Immutable configuration snapshot, plus the one runtime-mutable flag.
#[derive(Debug, Clone)]
pub struct Config {
    pub venue_a: VenueEndpoints,
    pub venue_b: VenueEndpoints,
    pub database_url: String,
    pub arb_threshold: Decimal,
    pub min_liquidity: Decimal,
    pub max_position_size: Decimal,
    pub venue_a_fee_rate: Decimal,
    pub venue_b_fee_rate: Decimal,
    pub similarity_threshold: f64,
    pub port: u16,
    pub log_level: String,
    auto_execute: Arc<AtomicBool>,
}

impl Config {
    /// Load and validate configuration from the process environment.
    ///
    /// # Errors
    /// Returns `Error::Config` if a required variable is missing, a URL
    /// fails to parse, or a numeric field is out of its documented range.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let venue_a = VenueEndpoints {
            ws_url: parse_url(&require_env("VENUE_A_WS_URL")?)?,
            api_url: parse_url(&require_env("VENUE_A_API_URL")?)?,
            api_key: require_env("VENUE_A_API_KEY")?,
            private_key: require_env("VENUE_A_PRIVATE_KEY")?,
        };
        let venue_b = VenueEndpoints {
            ws_url: parse_url(&require_env("VENUE_B_WS_URL")?)?,
            api_url: parse_url(&require_env("VENUE_B_API_URL")?)?,
            api_key: require_env("VENUE_B_API_KEY")?,
            private_key: require_env("VENUE_B_PRIVATE_KEY")?,
        };
        let database_url = require_env("DATABASE_URL")?;

        let arb_threshold = optional_decimal("ARB_THRESHOLD", Decimal::new(98, 2))?;
        let min_liquidity = optional_decimal("MIN_LIQUIDITY", Decimal::new(1000, 0))?;
        let max_position_size = optional_decimal("MAX_POSITION_SIZE", Decimal::new(10000, 0))?;
        let auto_execute = optional_bool("AUTO_EXECUTE", false)?;
        let port = optional_u16("PORT", 3001)?;
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let config = Self {
            venue_a,
            venue_b,
            database_url,
            arb_threshold,
            min_liquidity,
            max_position_size,
            venue_a_fee_rate: Decimal::new(2, 2),
            venue_b_fee_rate: Decimal::new(2, 2),
            similarity_threshold: 0.85,
            port,
            log_level,
            auto_execute: Arc::new(AtomicBool::new(auto_execute)),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.arb_threshold <= Decimal::ZERO || self.arb_threshold > Decimal::ONE {
            return Err(Error::Config("ARB_THRESHOLD must be in (0, 1]".into()));
        }
        if self.min_liquidity < Decimal::ZERO {
            return Err(Error::Config("MIN_LIQUIDITY cannot be negative".into()));
        }
        if self.max_position_size < self.min_liquidity {
            return Err(Error::Config(
                "MAX_POSITION_SIZE cannot be smaller than MIN_LIQUIDITY".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::Config("similarity_threshold must be in [0, 1]".into()));
        }
        Ok(())
    }

    /// Read the current auto-execute flag. A torn read is acceptable here
    /// (spec §5): the Coordinator re-checks it before acting.
    #[must_use]
    pub fn auto_execute(&self) -> bool {
        self.auto_execute.load(Ordering::Relaxed)
    }

    /// The only runtime-mutable configuration field.
    pub fn set_auto_execute(&self, enabled: bool) {
        self.auto_execute.store(enabled, Ordering::Relaxed);
    }

    /// Install a global `tracing` subscriber at `log_level`, optionally
    /// overridden by `RUST_LOG`.
    pub fn init_logging(&self) {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    /// A configuration snapshot with the spec's documented defaults, for
    /// tests that don't want to touch process environment variables.
    #[cfg(any(test, feature = "testkit"))]
    #[must_use]
    pub fn for_test() -> Self {
        let endpoints = || VenueEndpoints {
            ws_url: Url::parse("wss://example.com/ws").unwrap(),
            api_url: Url::parse("https://example.com/api").unwrap(),
            api_key: "test-key".to_string(),
            private_key: "test-private-key".to_string(),
        };
        Self {
            venue_a: endpoints(),
            venue_b: endpoints(),
            database_url: ":memory:".to_string(),
            arb_threshold: Decimal::new(98, 2),
            min_liquidity: Decimal::new(1000, 0),
            max_position_size: Decimal::new(10000, 0),
            venue_a_fee_rate: Decimal::new(2, 2),
            venue_b_fee_rate: Decimal::new(2, 2),
            similarity_threshold: 0.85,
            port: 3001,
            log_level: "info".to_string(),
            auto_execute: Arc::new(AtomicBool::new(false)),
        }
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Config(format!("missing required environment variable {name}")))
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(Error::Url)
}

fn optional_decimal(name: &str, default: Decimal) -> Result<Decimal> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<Decimal>()
            .map_err(|e| Error::Config(format!("invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn optional_bool(name: &str, default: bool) -> Result<bool> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<bool>()
            .map_err(|e| Error::Config(format!("invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn optional_u16(name: &str, default: u16) -> Result<u16> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u16>()
            .map_err(|e| Error::Config(format!("invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn set_required_vars() {
        std::env::set_var("VENUE_A_WS_URL", "wss://a.example.com/ws");
        std::env::set_var("VENUE_A_API_URL", "https://a.example.com/api");
        std::env::set_var("VENUE_A_API_KEY", "key-a");
        std::env::set_var("VENUE_A_PRIVATE_KEY", "priv-a");
        std::env::set_var("VENUE_B_WS_URL", "wss://b.example.com/ws");
        std::env::set_var("VENUE_B_API_URL", "https://b.example.com/api");
        std::env::set_var("VENUE_B_API_KEY", "key-b");
        std::env::set_var("VENUE_B_PRIVATE_KEY", "priv-b");
        std::env::set_var("DATABASE_URL", "test.sqlite");
    }

    fn clear_vars() {
        for var in [
            "VENUE_A_WS_URL", "VENUE_A_API_URL", "VENUE_A_API_KEY", "VENUE_A_PRIVATE_KEY",
            "VENUE_B_WS_URL", "VENUE_B_API_URL", "VENUE_B_API_KEY", "VENUE_B_PRIVATE_KEY",
            "DATABASE_URL", "ARB_THRESHOLD", "MIN_LIQUIDITY", "MAX_POSITION_SIZE", "AUTO_EXECUTE",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn from_env_applies_documented_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_vars();
        set_required_vars();
        let config = Config::from_env().unwrap();
        assert_eq!(config.arb_threshold, Decimal::new(98, 2));
        assert_eq!(config.min_liquidity, Decimal::new(1000, 0));
        assert_eq!(config.max_position_size, Decimal::new(10000, 0));
        assert!(!config.auto_execute());
        assert_eq!(config.port, 3001);
        clear_vars();
    }

    #[test]
    fn from_env_fails_on_missing_required_var() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_vars();
        let result = Config::from_env();
        assert!(result.is_err());
        clear_vars();
    }

    #[test]
    fn set_auto_execute_is_observable() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_vars();
        set_required_vars();
        let config = Config::from_env().unwrap();
        assert!(!config.auto_execute());
        config.set_auto_execute(true);
        assert!(config.auto_execute());
        clear_vars();
    }
}
