//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no database access.

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ancillary::ResolvedItem;
use super::models::DiscountFeeConfig;
use super::requests::ServiceType;

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use rehome_pricing::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// House moves carry the whole household, so each point is worth double.
pub fn item_value_multiplier(service_type: ServiceType) -> Decimal {
    match service_type {
        ServiceType::HouseMoving => dec!(2),
        ServiceType::ItemTransport => dec!(1),
    }
}

/// Sum of `points × quantity × service multiplier` over all items
pub fn item_value(items: &[ResolvedItem<'_>], service_type: ServiceType) -> Decimal {
    let points: Decimal = items.iter().map(ResolvedItem::total_points).sum();
    points * item_value_multiplier(service_type)
}

/// Per-kilometre distance charge bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceBands {
    /// Distances up to this are free
    pub free_km: Decimal,
    /// Upper bound of the medium band
    pub medium_km: Decimal,
    pub medium_rate: Decimal,
    pub long_rate: Decimal,
}

impl Default for DistanceBands {
    fn default() -> Self {
        Self {
            free_km: dec!(10),
            medium_km: dec!(50),
            medium_rate: dec!(0.7),
            long_rate: dec!(0.5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceBand {
    Free,
    Medium,
    Long,
}

/// Distance charge; the whole distance is billed at the rate of its band.
pub fn distance_cost(distance_km: Decimal, bands: &DistanceBands) -> (Decimal, DistanceBand) {
    if distance_km <= bands.free_km {
        (Decimal::ZERO, DistanceBand::Free)
    } else if distance_km <= bands.medium_km {
        (distance_km * bands.medium_rate, DistanceBand::Medium)
    } else {
        (distance_km * bands.long_rate, DistanceBand::Long)
    }
}

/// Convert a haversine distance to kilometres with two decimals
pub fn km_from_f64(distance: f64) -> Decimal {
    Decimal::try_from(distance)
        .map(|d| round_money(d, 2))
        .unwrap_or(Decimal::ZERO)
}

/// Discount granted to customers with a student id
pub fn student_discount(subtotal: Decimal, config: &DiscountFeeConfig, eligible: bool) -> Decimal {
    if eligible && subtotal > Decimal::ZERO {
        round_money(subtotal * config.student_discount_rate, 2)
    } else {
        Decimal::ZERO
    }
}

/// Fee for booking a move at most `late_booking_days` ahead of `today`.
///
/// Dates already in the past count as late.
pub fn late_booking_fee(
    move_date: Option<NaiveDate>,
    today: NaiveDate,
    config: &DiscountFeeConfig,
) -> Decimal {
    match move_date {
        Some(date) if (date - today).num_days() <= i64::from(config.late_booking_days) => {
            config.late_booking_fee
        }
        _ => Decimal::ZERO,
    }
}
