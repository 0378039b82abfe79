//! Pricing orchestration.
//!
//! [`PricingService`] reads the reference and calendar snapshots (the only
//! suspension points), then runs every calculator synchronously against those
//! two snapshots so one request never sees a mix of old and new data.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::cache::AppCache;

use super::ancillary::{
    assembly_cost, carrying_cost, extra_helper_cost, ElevatorFloorPolicy, ResolvedItem,
};
use super::base_price::{self, range_days, BasePrice, Rates};
use super::calculators::{
    self, distance_cost, item_value, km_from_f64, late_booking_fee, round_money, DistanceBands,
};
use super::calendar::{CalendarStatus, RangeSnapshot};
use super::city::{self, haversine_km};
use super::reference::ReferenceSnapshot;
use super::requests::{CalendarQuery, DateSelection, PriceRequest, ServiceType};
use super::responses::{BaseDetail, BreakdownDetail, CalendarDay, DistanceDetail, PriceBreakdown};

/// Pricing calculation error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("{date} is not available for bookings in {city}")]
    BookingBlocked { date: NaiveDate, city: String },

    #[error("Pricing reference data unavailable: {0}")]
    ReferenceData(String),
}

pub type PricingResult<T> = Result<T, PricingError>;

/// Whether the result is a quote or the price of a booking being created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingMode {
    /// Cached; blocked dates show a zero base price
    Quote,
    /// Never cached; blocked dates are rejected and the late fee applies
    Booking,
}

/// Tunables that are not stored in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingSettings {
    pub elevator_policy: ElevatorFloorPolicy,
    pub distance_bands: DistanceBands,
    pub calendar_max_range_days: i64,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            elevator_policy: ElevatorFloorPolicy::MultiplierOnly,
            distance_bands: DistanceBands::default(),
            calendar_max_range_days: 92,
        }
    }
}

/// Computes price breakdowns over cached reference and calendar data
#[derive(Clone)]
pub struct PricingService {
    cache: AppCache,
    settings: PricingSettings,
}

impl PricingService {
    pub fn new(cache: AppCache, settings: PricingSettings) -> Self {
        Self { cache, settings }
    }

    pub fn cache(&self) -> &AppCache {
        &self.cache
    }

    /// Quote a request.
    ///
    /// `as_of` is the pricing day (default: today). Results computed from a
    /// readable calendar are cached under the normalised request key.
    pub async fn calculate(
        &self,
        request: &PriceRequest,
        as_of: Option<NaiveDate>,
    ) -> PricingResult<PriceBreakdown> {
        let selection = self.validate(request)?;
        let today = as_of.unwrap_or_else(|| Utc::now().date_naive());

        let key = request.cache_key(today);
        if let Some(key) = key.as_deref() {
            if let Some(cached) = self.cache.quotes.get(key).await {
                debug!("Quote cache HIT");
                return Ok((*cached).clone());
            }
        }
        debug!("Quote cache MISS");

        let breakdown = self
            .compute(request, selection, PricingMode::Quote, today)
            .await?;

        if let Some(key) = key {
            if breakdown.breakdown.calendar_available {
                self.cache
                    .quotes
                    .insert(key, Arc::new(breakdown.clone()))
                    .await;
            }
        }
        Ok(breakdown)
    }

    /// Price a booking being created.
    ///
    /// Fails with [`PricingError::BookingBlocked`] when an explicitly chosen
    /// date is blocked for the pickup or dropoff city.
    pub async fn calculate_for_booking(
        &self,
        request: &PriceRequest,
        as_of: Option<NaiveDate>,
    ) -> PricingResult<PriceBreakdown> {
        let selection = self.validate(request)?;
        let today = as_of.unwrap_or_else(|| Utc::now().date_naive());
        let breakdown = self
            .compute(request, selection, PricingMode::Booking, today)
            .await?;
        info!(
            total = %breakdown.total,
            tier = %breakdown.breakdown.base.tier,
            "Priced booking"
        );
        Ok(breakdown)
    }

    /// Base price of every day in a range, for the calendar view.
    ///
    /// Blocked days are reported as a zero price with the `blocked` tier.
    pub async fn calendar_prices(&self, query: &CalendarQuery) -> PricingResult<Vec<CalendarDay>> {
        self.check_range(query.start_date, query.end_date)?;

        let (reference, snapshot) = tokio::join!(
            self.cache.reference.snapshot(),
            self.cache
                .calendar
                .prefetch_range(query.start_date, query.end_date),
        );
        let reference = reference?;

        let pickup = city::resolve(&query.pickup, &reference.city_rates);
        let dropoff = city::resolve(&query.dropoff, &reference.city_rates);
        let rates = Rates::between(pickup.rate, dropoff.rate);
        let is_intercity = is_intercity(&pickup.rate.city_name, &dropoff.rate.city_name);

        let prices = query
            .start_date
            .iter_days()
            .take_while(|date| *date <= query.end_date)
            .map(|date| {
                let p = snapshot.status_for(date, &pickup.rate.city_name);
                let d = snapshot.status_for(date, &dropoff.rate.city_name);
                let base = match query.service_type {
                    ServiceType::HouseMoving => {
                        base_price::house_moving_fixed(&rates, is_intercity, p, d)
                    }
                    ServiceType::ItemTransport => {
                        base_price::item_transport_same_date(&rates, is_intercity, p, d)
                    }
                };
                CalendarDay {
                    date,
                    base: BasePrice {
                        price: round_money(base.price, 2),
                        ..base
                    },
                }
            })
            .collect();

        Ok(prices)
    }

    /// Drop every cached snapshot and quote
    pub fn invalidate_caches(&self) {
        self.cache.invalidate_all();
    }

    /// Request validation plus the window limit shared with the calendar view
    fn validate(&self, request: &PriceRequest) -> PricingResult<DateSelection> {
        let selection = request.validate()?;
        if let DateSelection::Range { start, end } = selection {
            self.check_range(start, end)?;
        }
        Ok(selection)
    }

    fn check_range(&self, start: NaiveDate, end: NaiveDate) -> PricingResult<()> {
        if end < start {
            return Err(PricingError::Validation(
                "end_date cannot be before start_date".into(),
            ));
        }
        let days = range_days(start, end);
        if days > self.settings.calendar_max_range_days {
            return Err(PricingError::Validation(format!(
                "date range of {} days exceeds the maximum of {}",
                days, self.settings.calendar_max_range_days
            )));
        }
        Ok(())
    }

    async fn compute(
        &self,
        request: &PriceRequest,
        selection: DateSelection,
        mode: PricingMode,
        today: NaiveDate,
    ) -> PricingResult<PriceBreakdown> {
        let calendar = async {
            let mut snapshots = Vec::new();
            for (start, end) in selection.calendar_ranges() {
                snapshots.push(self.cache.calendar.prefetch_range(start, end).await);
            }
            snapshots
        };
        let (reference, calendar) = tokio::join!(self.cache.reference.snapshot(), calendar);
        let reference = reference?;

        // No suspension points below this line.
        self.price(request, selection, mode, today, &reference, &calendar)
    }

    fn price(
        &self,
        request: &PriceRequest,
        selection: DateSelection,
        mode: PricingMode,
        today: NaiveDate,
        reference: &ReferenceSnapshot,
        calendar: &[Arc<RangeSnapshot>],
    ) -> PricingResult<PriceBreakdown> {
        let pickup = city::resolve(&request.pickup, &reference.city_rates);
        let dropoff = city::resolve(&request.dropoff, &reference.city_rates);
        let pickup_city = pickup.rate.city_name.as_str();
        let dropoff_city = dropoff.rate.city_name.as_str();
        let is_intercity = is_intercity(pickup_city, dropoff_city);
        let rates = Rates::between(pickup.rate, dropoff.rate);

        let snapshot_for = |date: NaiveDate| calendar.iter().find(|s| s.covers(date));
        let status = |date: NaiveDate, city: &str| {
            snapshot_for(date).map_or(CalendarStatus::UNAVAILABLE, |s| s.status_for(date, city))
        };

        if mode == PricingMode::Booking {
            let chosen: Vec<(NaiveDate, &str)> = match selection {
                DateSelection::Fixed(date) => vec![(date, pickup_city), (date, dropoff_city)],
                DateSelection::Split { pickup, dropoff } => {
                    vec![(pickup, pickup_city), (dropoff, dropoff_city)]
                }
                DateSelection::Range { .. } | DateSelection::ProviderChooses => Vec::new(),
            };
            if let Some((date, city)) = chosen
                .into_iter()
                .find(|&(date, city)| status(date, city).is_blocked)
            {
                warn!(%date, city, "Rejected booking on blocked date");
                return Err(PricingError::BookingBlocked {
                    date,
                    city: city.to_string(),
                });
            }
        }

        let base = match selection {
            DateSelection::Fixed(date) => {
                let p = status(date, pickup_city);
                let d = status(date, dropoff_city);
                match request.service_type {
                    ServiceType::HouseMoving => {
                        base_price::house_moving_fixed(&rates, is_intercity, p, d)
                    }
                    ServiceType::ItemTransport => {
                        base_price::item_transport_same_date(&rates, is_intercity, p, d)
                    }
                }
            }
            DateSelection::Split { pickup, dropoff } => base_price::item_transport_diff_dates(
                &rates,
                is_intercity,
                status(pickup, pickup_city),
                status(dropoff, dropoff_city),
            ),
            DateSelection::Range { start, end } => {
                let (pickup_days, dropoff_days) = snapshot_for(start)
                    .map(|s| (s.scheduled_days(pickup_city), s.scheduled_days(dropoff_city)))
                    .unwrap_or_default();
                base_price::flexible_range(
                    &rates,
                    is_intercity,
                    range_days(start, end),
                    &pickup_days,
                    &dropoff_days,
                )
            }
            DateSelection::ProviderChooses => base_price::rehome_choose(&rates),
        };

        let mut unknown_item_ids = Vec::new();
        let items: Vec<ResolvedItem<'_>> = request
            .items
            .iter()
            .filter_map(|requested| match reference.furniture.get(&requested.id) {
                Some(item) => Some(ResolvedItem {
                    item,
                    quantity: requested.quantity,
                    carrying: requested.carrying,
                    assembly: requested.assembly,
                    extra_helper: requested.extra_helper,
                }),
                None => {
                    warn!(item_id = %requested.id, "Unknown furniture item, skipping");
                    unknown_item_ids.push(requested.id);
                    None
                }
            })
            .collect();

        let km = request
            .distance_km
            .or_else(|| {
                let from = request.pickup.coordinates()?;
                let to = request.dropoff.coordinates()?;
                Some(km_from_f64(haversine_km(from, to)))
            })
            .unwrap_or(Decimal::ZERO);
        let (distance, distance_band) = distance_cost(km, &self.settings.distance_bands);

        let carrying = carrying_cost(
            &items,
            &request.access,
            &reference.carrying,
            self.settings.elevator_policy,
        );
        let assembly = assembly_cost(&items, &reference.assembly);
        let extra_helper = extra_helper_cost(&items, &reference.extra_helper);

        let base_amount = round_money(base.price, 2);
        let item_value = round_money(item_value(&items, request.service_type), 2);
        let distance = round_money(distance, 2);
        let carrying_amount = round_money(carrying.total, 2);
        let assembly_amount = round_money(assembly.total, 2);
        let extra_helper_amount = round_money(extra_helper.total, 2);

        let subtotal = base_amount
            + item_value
            + distance
            + carrying_amount
            + assembly_amount
            + extra_helper_amount;
        let student_discount = calculators::student_discount(
            subtotal,
            &reference.discount_fee,
            request.has_student_id(),
        );
        let late_booking_fee = match (mode, request.service_type) {
            (PricingMode::Booking, ServiceType::HouseMoving) => {
                late_booking_fee(selection.move_date(), today, &reference.discount_fee)
            }
            _ => Decimal::ZERO,
        };
        let total = subtotal - student_discount + late_booking_fee;

        debug!(
            pickup = pickup_city,
            dropoff = dropoff_city,
            tier = %base.tier,
            %subtotal,
            %total,
            "Priced request"
        );

        Ok(PriceBreakdown {
            base_price: base_amount,
            item_value,
            distance_cost: distance,
            carrying_cost: carrying_amount,
            assembly_cost: assembly_amount,
            extra_helper_cost: extra_helper_amount,
            subtotal,
            student_discount,
            late_booking_fee,
            total,
            breakdown: BreakdownDetail {
                base: BaseDetail {
                    tier: base.tier,
                    pickup_city: pickup_city.to_string(),
                    dropoff_city: dropoff_city.to_string(),
                    pickup_resolution: pickup.method,
                    dropoff_resolution: dropoff.method,
                    is_intercity,
                },
                distance: DistanceDetail {
                    km,
                    band: distance_band,
                },
                carrying,
                assembly,
                extra_helper,
                calendar_available: calendar.iter().all(|s| s.is_available()),
                unknown_item_ids,
            },
        })
    }
}

fn is_intercity(pickup_city: &str, dropoff_city: &str) -> bool {
    !pickup_city.eq_ignore_ascii_case(dropoff_city)
}
