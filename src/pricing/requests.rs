//! Request DTOs for the pricing engine.
//!
//! [`PriceRequest`] is the one canonical shape the engine accepts. Field
//! aliases and loosely-typed payloads are normalised before they get here.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::base_price::{range_days, FLEXIBLE_CHEAP_WINDOW_DAYS};
use super::services::PricingError;

/// Upper bound on floors at either end
pub const MAX_FLOORS: u32 = 100;

/// Upper bound on the quantity of a single line
pub const MAX_ITEM_QUANTITY: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    HouseMoving,
    ItemTransport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOption {
    /// Customer picks the date(s)
    Fixed,
    /// Customer gives a window, we pick a day inside it
    Flexible,
    /// We pick the date
    RehomeChoose,
}

/// A pickup or dropoff location as entered by the customer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,
    /// Free-text address or geocoder display name
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Location {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }

    fn is_blank(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        blank(&self.city) && blank(&self.address) && self.coordinates().is_none()
    }
}

/// A catalog item with the optional services requested for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedItem {
    pub id: Uuid,
    pub quantity: u32,
    #[serde(default)]
    pub carrying: bool,
    #[serde(default)]
    pub assembly: bool,
    #[serde(default)]
    pub extra_helper: bool,
}

/// Stairs and elevators at both ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Access {
    #[serde(default)]
    pub pickup_floors: u32,
    #[serde(default)]
    pub dropoff_floors: u32,
    #[serde(default)]
    pub pickup_elevator: bool,
    #[serde(default)]
    pub dropoff_elevator: bool,
}

impl Access {
    pub fn has_elevator(&self) -> bool {
        self.pickup_elevator || self.dropoff_elevator
    }
}

/// Raw date fields; which ones are required depends on the date option
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDates {
    #[serde(default)]
    pub selected_date: Option<NaiveDate>,
    /// Item transport only: a dropoff on a different day than the pickup
    #[serde(default)]
    pub dropoff_date: Option<NaiveDate>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Request to price a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub service_type: ServiceType,
    pub date_option: DateOption,
    pub pickup: Location,
    pub dropoff: Location,
    #[serde(default)]
    pub items: Vec<RequestedItem>,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub dates: MoveDates,
    /// Route distance when the caller already knows it
    #[serde(default)]
    pub distance_km: Option<Decimal>,
}

/// The validated date shape of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSelection {
    Fixed(NaiveDate),
    Split { pickup: NaiveDate, dropoff: NaiveDate },
    Range { start: NaiveDate, end: NaiveDate },
    ProviderChooses,
}

impl DateSelection {
    /// Inclusive spans the calendar must be read for.
    ///
    /// Split dates read their two days separately. A flexible window longer
    /// than a week always prices at the cheap rate, so it reads nothing.
    pub fn calendar_ranges(&self) -> Vec<(NaiveDate, NaiveDate)> {
        match *self {
            DateSelection::Fixed(date) => vec![(date, date)],
            DateSelection::Split { pickup, dropoff } => vec![(pickup, pickup), (dropoff, dropoff)],
            DateSelection::Range { start, end }
                if range_days(start, end) <= FLEXIBLE_CHEAP_WINDOW_DAYS =>
            {
                vec![(start, end)]
            }
            DateSelection::Range { .. } | DateSelection::ProviderChooses => Vec::new(),
        }
    }

    /// First day of the move, used for the late booking fee
    pub fn move_date(&self) -> Option<NaiveDate> {
        match *self {
            DateSelection::Fixed(date) => Some(date),
            DateSelection::Split { pickup, .. } => Some(pickup),
            DateSelection::Range { start, .. } => Some(start),
            DateSelection::ProviderChooses => None,
        }
    }
}

impl PriceRequest {
    /// Check required fields and derive the date selection.
    pub fn validate(&self) -> Result<DateSelection, PricingError> {
        if self.pickup.is_blank() {
            return Err(PricingError::Validation(
                "pickup location is required".to_string(),
            ));
        }
        if self.dropoff.is_blank() {
            return Err(PricingError::Validation(
                "dropoff location is required".to_string(),
            ));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity == 0) {
            return Err(PricingError::Validation(format!(
                "item {} has zero quantity",
                item.id
            )));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity > MAX_ITEM_QUANTITY) {
            return Err(PricingError::Validation(format!(
                "item {} quantity exceeds {}",
                item.id, MAX_ITEM_QUANTITY
            )));
        }
        if self.access.pickup_floors > MAX_FLOORS || self.access.dropoff_floors > MAX_FLOORS {
            return Err(PricingError::Validation(format!(
                "floors cannot exceed {}",
                MAX_FLOORS
            )));
        }
        if self.distance_km.is_some_and(|km| km.is_sign_negative()) {
            return Err(PricingError::Validation(
                "distance_km cannot be negative".to_string(),
            ));
        }

        let dates = &self.dates;
        match self.date_option {
            DateOption::Fixed => {
                let pickup = dates.selected_date.ok_or_else(|| {
                    PricingError::Validation("selected_date is required for fixed dates".into())
                })?;
                match (self.service_type, dates.dropoff_date) {
                    (ServiceType::ItemTransport, Some(dropoff)) if dropoff != pickup => {
                        if dropoff < pickup {
                            return Err(PricingError::Validation(
                                "dropoff_date cannot be before selected_date".into(),
                            ));
                        }
                        Ok(DateSelection::Split { pickup, dropoff })
                    }
                    _ => Ok(DateSelection::Fixed(pickup)),
                }
            }
            DateOption::Flexible => match (dates.start_date, dates.end_date) {
                (Some(start), Some(end)) if end >= start => Ok(DateSelection::Range { start, end }),
                (Some(_), Some(_)) => Err(PricingError::Validation(
                    "end_date cannot be before start_date".into(),
                )),
                _ => Err(PricingError::Validation(
                    "start_date and end_date are required for flexible dates".into(),
                )),
            },
            DateOption::RehomeChoose => Ok(DateSelection::ProviderChooses),
        }
    }

    pub fn has_student_id(&self) -> bool {
        self.student_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }

    /// Normalised key for the quote cache.
    ///
    /// Two requests that differ only in item order, letter case or
    /// surrounding whitespace share a key.
    pub fn cache_key(&self, as_of: NaiveDate) -> Option<String> {
        let mut canonical = self.clone();
        for location in [&mut canonical.pickup, &mut canonical.dropoff] {
            location.city = normalize_text(location.city.take());
            location.address = normalize_text(location.address.take());
        }
        canonical.student_id = normalize_text(canonical.student_id.take());
        canonical.items.sort_by(|a, b| {
            (a.id, a.carrying, a.assembly, a.extra_helper)
                .cmp(&(b.id, b.carrying, b.assembly, b.extra_helper))
        });
        canonical.distance_km = canonical.distance_km.map(|d| d.normalize());

        let body = serde_json::to_string(&canonical).ok()?;
        Some(format!("quote:{}:{}", as_of, body))
    }
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// Request for per-day base prices across a date range
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarQuery {
    pub service_type: ServiceType,
    pub pickup: Location,
    pub dropoff: Location,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
