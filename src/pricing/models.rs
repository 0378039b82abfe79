//! Database models for pricing reference data and the route calendar.
//!
//! These models use sqlx's FromRow derive for direct database deserialization.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Base charge row from city_base_charges
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CityRate {
    pub city_name: String,
    /// Charge on a day the route passes through the city
    pub cheap_rate: Decimal,
    /// Charge on any other day
    pub standard_rate: Decimal,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CityRate {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Catalog entry from furniture_items
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct FurnitureItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub points: Decimal,
}

/// How an item is handled when carried up or down stairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemClass {
    Standard,
    Box,
    Bag,
    Luggage,
}

impl FurnitureItem {
    pub fn class(&self) -> ItemClass {
        let category = self.category.to_lowercase();
        if (category.contains("box") && !category.contains("boxspring"))
            || category.contains("doos")
        {
            ItemClass::Box
        } else if category.contains("bag") || category.contains("tassen") {
            ItemClass::Bag
        } else if category.contains("luggage") || category.contains("suitcase") {
            ItemClass::Luggage
        } else {
            ItemClass::Standard
        }
    }
}

/// Singleton row from carrying_config
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CarryingConfig {
    pub standard_multiplier: Decimal,
    pub box_multiplier: Decimal,
    /// Applied to boxes once the total box quantity exceeds `box_tiring_threshold`
    pub box_tiring_multiplier: Decimal,
    pub box_tiring_threshold: i32,
    pub bag_multiplier: Decimal,
    pub luggage_multiplier: Decimal,
    pub elevator_multiplier: Decimal,
    /// Jobs below this many carried points pay `minimum_fee` on top
    pub minimum_points: Decimal,
    pub minimum_fee: Decimal,
}

/// Assembly price row from assembly_prices
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AssemblyRate {
    pub category: String,
    /// Exact item name, or `default` for the category-wide price
    pub item_type: String,
    pub price: Decimal,
}

/// Singleton row from extra_helper_config
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ExtraHelperConfig {
    pub points_threshold: Decimal,
    pub small_fee: Decimal,
    pub big_fee: Decimal,
}

/// Singleton row from discount_fee_config
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct DiscountFeeConfig {
    /// Fraction of the subtotal, e.g. 0.0885
    pub student_discount_rate: Decimal,
    pub late_booking_days: i32,
    pub late_booking_fee: Decimal,
}

/// Route stop from city_schedules
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ScheduledCity {
    pub date: NaiveDate,
    pub city: String,
}

/// Entry from blocked_dates. An empty `cities` list blocks every city.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct BlockedDate {
    pub date: NaiveDate,
    pub cities: Vec<String>,
}
