use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};

use crate::cache::CacheTtls;
use crate::pricing::ancillary::ElevatorFloorPolicy;
use crate::pricing::calculators::DistanceBands;
use crate::pricing::services::PricingSettings;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    pub database_url: String,
    /// Pool size (default: `10`).
    pub database_max_connections: u32,
    pub cache_ttls: CacheTtls,
    /// How often the reference tables are reloaded in the background.
    pub cache_warm_interval: Duration,
    pub pricing: PricingSettings,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default           |
    /// |------------------------------|-------------------|
    /// | `HOST`                       | `0.0.0.0`         |
    /// | `PORT`                       | `3000`            |
    /// | `DATABASE_URL`               | required          |
    /// | `DATABASE_MAX_CONNECTIONS`   | `10`              |
    /// | `REFERENCE_CACHE_TTL_SECS`   | `300`             |
    /// | `CALENDAR_CACHE_TTL_SECS`    | `60`              |
    /// | `QUOTE_CACHE_TTL_SECS`       | `60`              |
    /// | `CACHE_WARM_INTERVAL_SECS`   | `600`             |
    /// | `ELEVATOR_FLOOR_POLICY`      | `multiplier_only` |
    /// | `CALENDAR_MAX_RANGE_DAYS`    | `92`              |
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = parse_var("PORT", 3000)?;

        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections: u32 = parse_var("DATABASE_MAX_CONNECTIONS", 10)?;

        let cache_ttls = CacheTtls {
            reference: Duration::from_secs(parse_var("REFERENCE_CACHE_TTL_SECS", 300)?),
            calendar: Duration::from_secs(parse_var("CALENDAR_CACHE_TTL_SECS", 60)?),
            quotes: Duration::from_secs(parse_var("QUOTE_CACHE_TTL_SECS", 60)?),
        };
        let cache_warm_interval = Duration::from_secs(parse_var("CACHE_WARM_INTERVAL_SECS", 600)?);

        let elevator_policy = match std::env::var("ELEVATOR_FLOOR_POLICY") {
            Ok(raw) => ElevatorFloorPolicy::from_str(&raw).map_err(|e| anyhow!(e))?,
            Err(_) => ElevatorFloorPolicy::default(),
        };
        let calendar_max_range_days: i64 = parse_var("CALENDAR_MAX_RANGE_DAYS", 92)?;
        if calendar_max_range_days < 1 {
            return Err(anyhow!("CALENDAR_MAX_RANGE_DAYS must be at least 1"));
        }

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
            cache_ttls,
            cache_warm_interval,
            pricing: PricingSettings {
                elevator_policy,
                distance_bands: DistanceBands::default(),
                calendar_max_range_days,
            },
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}
