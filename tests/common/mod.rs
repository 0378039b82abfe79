//! In-memory pricing tables shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use rehome_pricing::cache::{AppCache, CacheTtls};
use rehome_pricing::error::{AppError, Result};
use rehome_pricing::pricing::models::{
    AssemblyRate, BlockedDate, CarryingConfig, CityRate, DiscountFeeConfig, ExtraHelperConfig,
    FurnitureItem, ScheduledCity,
};
use rehome_pricing::pricing::requests::{
    Access, DateOption, Location, MoveDates, PriceRequest, RequestedItem, ServiceType,
};
use rehome_pricing::pricing::{CalendarSource, PricingService, PricingSettings, ReferenceSource};

pub const SOFA_ID: Uuid = Uuid::from_u128(0x1);
pub const BOX_ID: Uuid = Uuid::from_u128(0x2);
pub const BED_ID: Uuid = Uuid::from_u128(0x3);

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn city(name: &str, cheap: Decimal, standard: Decimal, lat: f64, lon: f64) -> CityRate {
    CityRate {
        city_name: name.to_string(),
        cheap_rate: cheap,
        standard_rate: standard,
        latitude: Some(lat),
        longitude: Some(lon),
    }
}

/// Reference tables and calendar held in memory, counting every read
pub struct MemorySource {
    pub scheduled: Mutex<Vec<ScheduledCity>>,
    pub blocked: Mutex<Vec<BlockedDate>>,
    pub reference_reads: AtomicUsize,
    pub calendar_reads: AtomicUsize,
    pub fail_reference: AtomicBool,
    pub fail_calendar: AtomicBool,
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            scheduled: Mutex::new(Vec::new()),
            blocked: Mutex::new(Vec::new()),
            reference_reads: AtomicUsize::new(0),
            calendar_reads: AtomicUsize::new(0),
            fail_reference: AtomicBool::new(false),
            fail_calendar: AtomicBool::new(false),
        }
    }

    pub fn schedule(&self, date: NaiveDate, city: &str) {
        self.scheduled.lock().unwrap().push(ScheduledCity {
            date,
            city: city.to_string(),
        });
    }

    pub fn block(&self, date: NaiveDate, cities: &[&str]) {
        self.blocked.lock().unwrap().push(BlockedDate {
            date,
            cities: cities.iter().map(|c| c.to_string()).collect(),
        });
    }

    pub fn reference_reads(&self) -> usize {
        self.reference_reads.load(Ordering::SeqCst)
    }

    pub fn calendar_reads(&self) -> usize {
        self.calendar_reads.load(Ordering::SeqCst)
    }

    fn reference_read(&self) -> Result<()> {
        self.reference_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reference.load(Ordering::SeqCst) {
            return Err(AppError::Internal("reference store offline".into()));
        }
        Ok(())
    }

    fn calendar_read(&self) -> Result<()> {
        self.calendar_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_calendar.load(Ordering::SeqCst) {
            return Err(AppError::Internal("calendar store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReferenceSource for MemorySource {
    async fn city_rates(&self) -> Result<Vec<CityRate>> {
        self.reference_read()?;
        Ok(vec![
            city("Amsterdam", dec!(39), dec!(119), 52.3676, 4.9041),
            city("Eindhoven", dec!(34), dec!(89), 51.4416, 5.4697),
            city("Den Haag", dec!(35), dec!(99), 52.0705, 4.3007),
            city("Utrecht", dec!(36), dec!(95), 52.0907, 5.1214),
        ])
    }

    async fn furniture_items(&self) -> Result<Vec<FurnitureItem>> {
        Ok(vec![
            FurnitureItem {
                id: SOFA_ID,
                name: "3-seater sofa".into(),
                category: "Sofas".into(),
                points: dec!(10),
            },
            FurnitureItem {
                id: BOX_ID,
                name: "Moving box".into(),
                category: "Boxes".into(),
                points: dec!(1),
            },
            FurnitureItem {
                id: BED_ID,
                name: "Double bed".into(),
                category: "Beds".into(),
                points: dec!(8),
            },
        ])
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
        Ok(vec![
            AssemblyRate {
                category: "bed".into(),
                item_type: "Double bed".into(),
                price: dec!(45),
            },
            AssemblyRate {
                category: "bed".into(),
                item_type: "default".into(),
                price: dec!(35),
            },
            AssemblyRate {
                category: "sofa".into(),
                item_type: "default".into(),
                price: dec!(20),
            },
        ])
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

#[async_trait]
impl CalendarSource for MemorySource {
    async fn scheduled_cities(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ScheduledCity>> {
        self.calendar_read()?;
        Ok(self
            .scheduled
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.date >= start && s.date <= end)
            .cloned()
            .collect())
    }

    async fn blocked_dates(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BlockedDate>> {
        Ok(self
            .blocked
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect())
    }
}

/// A fresh service over a fresh source; caches are never shared between tests
pub fn service() -> (PricingService, Arc<MemorySource>) {
    let source = Arc::new(MemorySource::new());
    let cache = AppCache::new(Arc::clone(&source), CacheTtls::default());
    (PricingService::new(cache, PricingSettings::default()), source)
}

pub fn at(city: &str) -> Location {
    Location {
        city: Some(city.to_string()),
        ..Default::default()
    }
}

pub fn request(
    service_type: ServiceType,
    date_option: DateOption,
    pickup: &str,
    dropoff: &str,
) -> PriceRequest {
    PriceRequest {
        service_type,
        date_option,
        pickup: at(pickup),
        dropoff: at(dropoff),
        items: Vec::new(),
        access: Access::default(),
        student_id: None,
        dates: MoveDates::default(),
        distance_km: None,
    }
}

pub fn fixed(
    service_type: ServiceType,
    pickup: &str,
    dropoff: &str,
    on: NaiveDate,
) -> PriceRequest {
    let mut req = request(service_type, DateOption::Fixed, pickup, dropoff);
    req.dates.selected_date = Some(on);
    req
}

pub fn item(id: Uuid, quantity: u32) -> RequestedItem {
    RequestedItem {
        id,
        quantity,
        carrying: false,
        assembly: false,
        extra_helper: false,
    }
}
