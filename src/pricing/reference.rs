//! Read-through cache for slow-changing pricing tables.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::city::CityRates;
use super::models::{
    AssemblyRate, CarryingConfig, DiscountFeeConfig, ExtraHelperConfig, FurnitureItem,
};
use super::services::PricingError;
use super::source::ReferenceSource;

const SNAPSHOT_KEY: &str = "reference";

/// Every configuration table the engine needs, read at one point in time
#[derive(Debug, Clone)]
pub struct ReferenceSnapshot {
    pub city_rates: CityRates,
    pub furniture: HashMap<Uuid, FurnitureItem>,
    pub carrying: CarryingConfig,
    pub assembly: Vec<AssemblyRate>,
    pub extra_helper: ExtraHelperConfig,
    pub discount_fee: DiscountFeeConfig,
    pub loaded_at: DateTime<Utc>,
}

/// TTL cache holding a single [`ReferenceSnapshot`]
#[derive(Clone)]
pub struct ReferenceConfigCache {
    source: Arc<dyn ReferenceSource>,
    snapshot: Cache<&'static str, Arc<ReferenceSnapshot>>,
}

impl ReferenceConfigCache {
    pub fn new(source: Arc<dyn ReferenceSource>, ttl: Duration) -> Self {
        Self {
            source,
            snapshot: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// Current snapshot, loading all tables on a miss.
    ///
    /// A failed load is fatal to the caller: there is no price without
    /// configuration.
    pub async fn snapshot(&self) -> Result<Arc<ReferenceSnapshot>, PricingError> {
        if let Some(cached) = self.snapshot.get(SNAPSHOT_KEY).await {
            debug!("Reference cache HIT");
            return Ok(cached);
        }
        debug!("Reference cache MISS");
        self.refresh().await
    }

    /// Reload all tables and replace the cached snapshot.
    ///
    /// On failure the previous snapshot, if any, stays in place.
    pub async fn refresh(&self) -> Result<Arc<ReferenceSnapshot>, PricingError> {
        let loaded = Arc::new(self.load().await?);
        self.snapshot
            .insert(SNAPSHOT_KEY, Arc::clone(&loaded))
            .await;
        Ok(loaded)
    }

    async fn load(&self) -> Result<ReferenceSnapshot, PricingError> {
        let (rates, items, carrying, assembly, extra_helper, discount_fee) = tokio::try_join!(
            self.source.city_rates(),
            self.source.furniture_items(),
            self.source.carrying_config(),
            self.source.assembly_rates(),
            self.source.extra_helper_config(),
            self.source.discount_fee_config(),
        )
        .map_err(|e| PricingError::ReferenceData(e.to_string()))?;

        for rate in rates.iter().filter(|r| r.cheap_rate > r.standard_rate) {
            warn!(
                city = %rate.city_name,
                cheap = %rate.cheap_rate,
                standard = %rate.standard_rate,
                "City has a cheap rate above its standard rate"
            );
        }

        let city_rates = CityRates::new(rates)
            .ok_or_else(|| PricingError::ReferenceData("no city rates configured".to_string()))?;

        let furniture: HashMap<Uuid, FurnitureItem> =
            items.into_iter().map(|item| (item.id, item)).collect();

        info!(
            cities = city_rates.as_slice().len(),
            items = furniture.len(),
            assembly_rates = assembly.len(),
            "Loaded pricing reference data"
        );

        Ok(ReferenceSnapshot {
            city_rates,
            furniture,
            carrying,
            assembly,
            extra_helper,
            discount_fee,
            loaded_at: Utc::now(),
        })
    }

    /// Drop the cached snapshot
    pub fn invalidate(&self) {
        self.snapshot.invalidate_all();
        info!("Reference snapshot invalidated");
    }

    pub fn is_cached(&self) -> bool {
        self.snapshot.contains_key(SNAPSHOT_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    use crate::pricing::models::CityRate;

    struct StaticTables {
        cities: Vec<CityRate>,
    }

    #[async_trait]
    impl ReferenceSource for StaticTables {
        async fn city_rates(&self) -> Result<Vec<CityRate>> {
            Ok(self.cities.clone())
        }

        async fn furniture_items(&self) -> Result<Vec<FurnitureItem>> {
            Ok(vec![])
        }

        async fn carrying_config(&self) -> Result<CarryingConfig> {
            Ok(CarryingConfig {
                standard_multiplier: dec!(1),
                box_multiplier: dec!(0.5),
                box_tiring_multiplier: dec!(0.75),
                box_tiring_threshold: 10,
                bag_multiplier: dec!(0.3),
                luggage_multiplier: dec!(0.4),
                elevator_multiplier: dec!(0.3),
                minimum_points: dec!(5),
                minimum_fee: dec!(15),
            })
        }

        async fn assembly_rates(&self) -> Result<Vec<AssemblyRate>> {
            Ok(vec![])
        }

        async fn extra_helper_config(&self) -> Result<ExtraHelperConfig> {
            Ok(ExtraHelperConfig {
                points_threshold: dec!(30),
                small_fee: dec!(25),
                big_fee: dec!(45),
            })
        }

        async fn discount_fee_config(&self) -> Result<DiscountFeeConfig> {
            Ok(DiscountFeeConfig {
                student_discount_rate: dec!(0.0885),
                late_booking_days: 3,
                late_booking_fee: dec!(25),
            })
        }
    }

    fn cache(cities: Vec<CityRate>) -> ReferenceConfigCache {
        ReferenceConfigCache::new(
            Arc::new(StaticTables { cities }),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_cheap_rate_above_standard_still_loads() {
        let cache = cache(vec![CityRate {
            city_name: "Zwolle".to_string(),
            cheap_rate: dec!(120),
            standard_rate: dec!(80),
            latitude: None,
            longitude: None,
        }]);

        let snapshot = cache.snapshot().await.unwrap();
        let zwolle = snapshot.city_rates.first();
        assert_eq!(zwolle.cheap_rate, dec!(120));
        assert_eq!(zwolle.standard_rate, dec!(80));
        assert!(cache.is_cached());
    }

    #[tokio::test]
    async fn test_empty_city_table_is_reference_error() {
        let cache = cache(vec![]);
        assert!(matches!(
            cache.snapshot().await,
            Err(PricingError::ReferenceData(_))
        ));
        assert!(!cache.is_cached());
    }
}
