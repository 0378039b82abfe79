//! Read contracts the pricing engine consumes.
//!
//! The engine never talks to storage directly. Caches are built over these
//! traits so tests can inject in-memory tables and the server injects
//! [`PgPricingSource`].

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::Result;

use super::models::{
    AssemblyRate, BlockedDate, CarryingConfig, CityRate, DiscountFeeConfig, ExtraHelperConfig,
    FurnitureItem, ScheduledCity,
};
use super::queries;

/// Slow-changing configuration tables
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn city_rates(&self) -> Result<Vec<CityRate>>;

    async fn furniture_items(&self) -> Result<Vec<FurnitureItem>>;

    async fn carrying_config(&self) -> Result<CarryingConfig>;

    async fn assembly_rates(&self) -> Result<Vec<AssemblyRate>>;

    async fn extra_helper_config(&self) -> Result<ExtraHelperConfig>;

    async fn discount_fee_config(&self) -> Result<DiscountFeeConfig>;
}

/// Route schedule and blocked dates, both over an inclusive range
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn scheduled_cities(&self, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<ScheduledCity>>;

    async fn blocked_dates(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BlockedDate>>;
}

/// Postgres-backed implementation of both contracts
#[derive(Clone)]
pub struct PgPricingSource {
    pool: PgPool,
}

impl PgPricingSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceSource for PgPricingSource {
    async fn city_rates(&self) -> Result<Vec<CityRate>> {
        queries::get_city_rates(&self.pool).await
    }

    async fn furniture_items(&self) -> Result<Vec<FurnitureItem>> {
        queries::get_furniture_items(&self.pool).await
    }

    async fn carrying_config(&self) -> Result<CarryingConfig> {
        queries::get_carrying_config(&self.pool).await
    }

    async fn assembly_rates(&self) -> Result<Vec<AssemblyRate>> {
        queries::get_assembly_rates(&self.pool).await
    }

    async fn extra_helper_config(&self) -> Result<ExtraHelperConfig> {
        queries::get_extra_helper_config(&self.pool).await
    }

    async fn discount_fee_config(&self) -> Result<DiscountFeeConfig> {
        queries::get_discount_fee_config(&self.pool).await
    }
}

#[async_trait]
impl CalendarSource for PgPricingSource {
    async fn scheduled_cities(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ScheduledCity>> {
        queries::get_scheduled_cities(&self.pool, start, end).await
    }

    async fn blocked_dates(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BlockedDate>> {
        queries::get_blocked_dates(&self.pool, start, end).await
    }
}
