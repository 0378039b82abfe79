//! In-memory caching using moka
//!
//! Three caches sit in front of the pricing engine: the reference tables
//! (minutes), calendar range snapshots (one minute) and finished quotes
//! (one minute). Administrative writes call [`AppCache::invalidate_all`].

use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::pricing::calendar::CalendarStatusProvider;
use crate::pricing::reference::ReferenceConfigCache;
use crate::pricing::responses::PriceBreakdown;
use crate::pricing::source::{CalendarSource, ReferenceSource};

/// Time-to-live of each cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub reference: Duration,
    pub calendar: Duration,
    pub quotes: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            reference: Duration::from_secs(5 * 60),
            calendar: Duration::from_secs(60),
            quotes: Duration::from_secs(60),
        }
    }
}

/// Application cache holding reference data, calendar snapshots and quotes
#[derive(Clone)]
pub struct AppCache {
    pub reference: ReferenceConfigCache,
    pub calendar: CalendarStatusProvider,
    /// Quotes (normalised request key -> PriceBreakdown)
    pub quotes: Cache<String, Arc<PriceBreakdown>>,
}

impl AppCache {
    /// Create a cache over one source serving both read contracts
    pub fn new<S>(source: Arc<S>, ttls: CacheTtls) -> Self
    where
        S: ReferenceSource + CalendarSource + 'static,
    {
        Self::with_sources(source.clone(), source, ttls)
    }

    pub fn with_sources(
        reference: Arc<dyn ReferenceSource>,
        calendar: Arc<dyn CalendarSource>,
        ttls: CacheTtls,
    ) -> Self {
        Self {
            reference: ReferenceConfigCache::new(reference, ttls.reference),
            calendar: CalendarStatusProvider::new(calendar, ttls.calendar),
            // Quotes: 10k entries. A quote can outlive the calendar snapshot it was
            // priced from by at most the quote TTL.
            quotes: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttls.quotes)
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            reference_cached: self.reference.is_cached(),
            calendar_snapshots: self.calendar.entry_count(),
            quotes_size: self.quotes.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.reference.invalidate();
        self.calendar.invalidate();
        self.quotes.invalidate_all();
        info!("All caches invalidated");
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub reference_cached: bool,
    pub calendar_snapshots: u64,
    pub quotes_size: u64,
}

/// Start background cache warmer
///
/// Loads the reference tables on startup and reloads them every `every`.
pub async fn start_cache_warmer(cache: AppCache, every: Duration) {
    let mut interval = interval(every);
    loop {
        // First tick completes immediately
        interval.tick().await;
        warm_cache(&cache).await;
    }
}

/// Warm the cache with the reference snapshot
async fn warm_cache(cache: &AppCache) {
    info!("Starting cache warm-up...");

    match cache.reference.refresh().await {
        Ok(snapshot) => info!(loaded_at = %snapshot.loaded_at, "Reference snapshot refreshed"),
        Err(e) => warn!("Failed to warm reference cache: {}", e),
    }

    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}
