//! Response DTOs for pricing results.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::ancillary::{AssemblyCost, CarryingCost, ExtraHelperCost};
use super::base_price::{BasePrice, PriceTier};
use super::calculators::DistanceBand;
use super::city::ResolutionMethod;

/// Full price breakdown of one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreakdown {
    #[serde(with = "rust_decimal::serde::str")]
    pub base_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub item_value: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub distance_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub carrying_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub assembly_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub extra_helper_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub student_discount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub late_booking_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    pub breakdown: BreakdownDetail,
}

/// Per-component detail behind the totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownDetail {
    pub base: BaseDetail,
    pub distance: DistanceDetail,
    pub carrying: CarryingCost,
    pub assembly: AssemblyCost,
    pub extra_helper: ExtraHelperCost,
    /// False when the calendar could not be read and default status was used
    pub calendar_available: bool,
    pub unknown_item_ids: Vec<uuid::Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseDetail {
    #[serde(rename = "type")]
    pub tier: PriceTier,
    pub pickup_city: String,
    pub dropoff_city: String,
    pub pickup_resolution: ResolutionMethod,
    pub dropoff_resolution: ResolutionMethod,
    pub is_intercity: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceDetail {
    #[serde(with = "rust_decimal::serde::str")]
    pub km: Decimal,
    pub band: DistanceBand,
}

/// Base price of one day for the calendar view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub base: BasePrice,
}
