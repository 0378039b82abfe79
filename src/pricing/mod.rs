//! Pricing engine module for moving and item transport bookings.
//!
//! Reference tables and calendar status are read through TTL caches; every
//! calculation after those reads is a pure function over the snapshots.

pub mod ancillary;
pub mod base_price;
pub mod calculators;
pub mod calendar;
pub mod city;
pub mod models;
pub mod queries;
pub mod reference;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;
pub mod source;

// Re-export commonly used items
pub use calculators::round_money;
pub use requests::{CalendarQuery, PriceRequest};
pub use responses::{CalendarDay, PriceBreakdown};
pub use routes::router;
pub use services::{PricingError, PricingService, PricingSettings};
pub use source::{CalendarSource, PgPricingSource, ReferenceSource};
