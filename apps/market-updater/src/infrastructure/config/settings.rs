//! Updater Configuration Settings
//!
//! Configuration types for the updater, loaded once from environment
//! variables at startup and passed explicitly to every component.

use std::time::Duration;

use crate::application::services::{
    DEFAULT_BATCH_COLLECTION, DEFAULT_INDIVIDUAL_COLLECTION, FetchSettings, PipelineKind,
    Schedule, SinkCollections,
};
use crate::infrastructure::coinmarketcap::{CoinMarketCapConfig, DEFAULT_LISTINGS_URL};
use crate::infrastructure::store::{DEFAULT_DATABASE, FirestoreConfig};

/// Listings requested per tick.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page the listings endpoint serves.
pub const MAX_LIMIT: u32 = 5000;

/// Period of both schedules.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Schedule periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalSettings {
    /// Per-record write cadence.
    pub individual: Duration,
    /// Batch write cadence.
    pub batch: Duration,
}

impl Default for IntervalSettings {
    fn default() -> Self {
        Self {
            individual: DEFAULT_INTERVAL,
            batch: DEFAULT_INTERVAL,
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    /// Health check HTTP port.
    pub health_port: u16,
    /// Prometheus metrics port (0 = disabled).
    pub metrics_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            health_port: 8080,
            metrics_port: 0,
        }
    }
}

/// Complete updater configuration.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// Listings provider client settings.
    pub coinmarketcap: CoinMarketCapConfig,
    /// Document store settings.
    pub firestore: FirestoreConfig,
    /// Per-tick fetch parameters.
    pub fetch: FetchSettings,
    /// Target collections.
    pub collections: SinkCollections,
    /// Schedule periods.
    pub intervals: IntervalSettings,
    /// Server ports.
    pub server: ServerSettings,
}

impl UpdaterConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `APIKEY` or `PROJECT_ID` is missing or empty, or
    /// if an optional variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    ///
    /// Optional variables that are set but blank count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let api_key = env.required("APIKEY")?;
        let project_id = env.required("PROJECT_ID")?;

        let convert = env
            .optional("CMC_CONVERT")
            .unwrap_or_else(|| crate::domain::market::DEFAULT_QUOTE_CURRENCY.to_string());
        let coinmarketcap = CoinMarketCapConfig::new(api_key)
            .with_listings_url(
                env.optional("CMC_LISTINGS_URL")
                    .unwrap_or_else(|| DEFAULT_LISTINGS_URL.to_string()),
            )
            .with_convert(convert.clone());

        let limit = env.parse("CMC_LIMIT", DEFAULT_LIMIT)?;
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(ConfigError::InvalidValue {
                key: "CMC_LIMIT".to_string(),
                message: format!("must be between 1 and {MAX_LIMIT}, got {limit}"),
            });
        }

        let mut firestore = FirestoreConfig::new(project_id).with_database(
            env.optional("FIRESTORE_DATABASE")
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        );
        if let Some(host) = env.optional("FIRESTORE_EMULATOR_HOST") {
            firestore = firestore.with_emulator_host(&host);
        }
        if let Some(token) = env.optional("GOOGLE_OAUTH_ACCESS_TOKEN") {
            firestore = firestore.with_access_token(token);
        }

        let collections = SinkCollections {
            individual: env
                .optional("INDIVIDUAL_COLLECTION")
                .unwrap_or_else(|| DEFAULT_INDIVIDUAL_COLLECTION.to_string()),
            batch: env
                .optional("BATCH_COLLECTION")
                .unwrap_or_else(|| DEFAULT_BATCH_COLLECTION.to_string()),
        };

        let intervals = IntervalSettings {
            individual: env.interval_secs("INDIVIDUAL_INTERVAL_SECS", DEFAULT_INTERVAL)?,
            batch: env.interval_secs("BATCH_INTERVAL_SECS", DEFAULT_INTERVAL)?,
        };

        let server = ServerSettings {
            health_port: env.parse("PORT", ServerSettings::default().health_port)?,
            metrics_port: env.parse("METRICS_PORT", ServerSettings::default().metrics_port)?,
        };

        Ok(Self {
            coinmarketcap,
            firestore,
            fetch: FetchSettings {
                limit,
                quote_currency: convert,
            },
            collections,
            intervals,
            server,
        })
    }

    /// One schedule per pipeline kind.
    #[must_use]
    pub fn schedules(&self) -> Vec<Schedule> {
        vec![
            Schedule::new(self.intervals.individual, PipelineKind::Individual),
            Schedule::new(self.intervals.batch, PipelineKind::Batch),
        ]
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable is set but unusable.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// What is wrong with it.
        message: String,
    },
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        let value = (self.0)(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::EmptyValue(key.to_string()));
        }
        Ok(value.to_string())
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            })
        })
    }

    fn interval_secs(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        let secs: u64 = self.parse(key, default.as_secs())?;
        if secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: "interval must be at least one second".to_string(),
            });
        }
        Ok(Duration::from_secs(secs))
    }
}
