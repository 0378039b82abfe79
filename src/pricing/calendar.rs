//! Route calendar lookups.
//!
//! [`CalendarStatusProvider::prefetch_range`] reads the schedule and the
//! blocked dates for a range once, freezes them into an immutable
//! [`RangeSnapshot`], and keeps it for a short TTL. All per-(city, date)
//! questions are then answered from the snapshot without further I/O.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use moka::future::Cache;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::models::{BlockedDate, ScheduledCity};
use super::source::CalendarSource;

/// Calendar state of one city on one date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CalendarStatus {
    /// The route passes through this city on this date
    pub is_scheduled: bool,
    /// No city at all is on the route this date
    pub is_empty: bool,
    pub is_blocked: bool,
}

impl CalendarStatus {
    /// Used when the calendar could not be read: price as an unscheduled,
    /// empty, bookable day.
    pub const UNAVAILABLE: CalendarStatus = CalendarStatus {
        is_scheduled: false,
        is_empty: true,
        is_blocked: false,
    };
}

/// Frozen view of the calendar for an inclusive date range
#[derive(Debug, Clone, Default)]
pub struct RangeSnapshot {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    /// date -> scheduled cities (lowercased)
    scheduled: HashMap<NaiveDate, Vec<String>>,
    /// date -> one entry per block, each listing its cities (lowercased)
    blocked: HashMap<NaiveDate, Vec<Vec<String>>>,
    available: bool,
}

impl RangeSnapshot {
    pub fn build(
        start: NaiveDate,
        end: NaiveDate,
        scheduled: Vec<ScheduledCity>,
        blocked: Vec<BlockedDate>,
    ) -> Self {
        let mut by_date: HashMap<NaiveDate, Vec<String>> = HashMap::new();
        for row in scheduled {
            let city = normalize(&row.city);
            let cities = by_date.entry(row.date).or_default();
            if !city.is_empty() && !cities.contains(&city) {
                cities.push(city);
            }
        }

        let mut blocks: HashMap<NaiveDate, Vec<Vec<String>>> = HashMap::new();
        for row in blocked {
            let cities = row
                .cities
                .iter()
                .map(|c| normalize(c))
                .filter(|c| !c.is_empty())
                .collect();
            blocks.entry(row.date).or_default().push(cities);
        }

        Self {
            start: Some(start),
            end: Some(end),
            scheduled: by_date,
            blocked: blocks,
            available: true,
        }
    }

    /// Placeholder returned when the calendar read failed
    pub fn unavailable(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn status_for(&self, date: NaiveDate, city: &str) -> CalendarStatus {
        if !self.available {
            return CalendarStatus::UNAVAILABLE;
        }
        let city = normalize(city);
        let scheduled = self.scheduled.get(&date).map(Vec::as_slice).unwrap_or(&[]);
        let is_blocked = self.blocked.get(&date).is_some_and(|entries| {
            entries
                .iter()
                .any(|cities| cities.is_empty() || cities.contains(&city))
        });

        CalendarStatus {
            is_scheduled: scheduled.contains(&city),
            is_empty: scheduled.is_empty(),
            is_blocked,
        }
    }

    /// Dates within the snapshot range on which `city` is scheduled
    pub fn scheduled_days(&self, city: &str) -> BTreeSet<NaiveDate> {
        let city = normalize(city);
        self.scheduled
            .iter()
            .filter(|(date, cities)| self.covers(**date) && cities.contains(&city))
            .map(|(date, _)| *date)
            .collect()
    }

    /// Whether `date` falls inside the snapshot range
    pub fn covers(&self, date: NaiveDate) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= date && date <= end,
            _ => true,
        }
    }
}

fn normalize(city: &str) -> String {
    city.trim().to_lowercase()
}

/// TTL cache of calendar snapshots keyed by `(start, end)`
#[derive(Clone)]
pub struct CalendarStatusProvider {
    source: Arc<dyn CalendarSource>,
    snapshots: Cache<(NaiveDate, NaiveDate), Arc<RangeSnapshot>>,
}

impl CalendarStatusProvider {
    pub fn new(source: Arc<dyn CalendarSource>, ttl: Duration) -> Self {
        Self {
            source,
            snapshots: Cache::builder()
                .max_capacity(512)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Snapshot for an inclusive range.
    ///
    /// A cached snapshot younger than the TTL is returned as is. Otherwise the
    /// schedule and the blocked dates are read concurrently and the new
    /// snapshot replaces whatever was cached. A failed read is logged and
    /// yields an uncached [`RangeSnapshot::unavailable`].
    pub async fn prefetch_range(&self, start: NaiveDate, end: NaiveDate) -> Arc<RangeSnapshot> {
        let key = (start.min(end), start.max(end));

        if let Some(snapshot) = self.snapshots.get(&key).await {
            debug!("Calendar cache HIT for {}..{}", key.0, key.1);
            return snapshot;
        }
        debug!("Calendar cache MISS for {}..{}", key.0, key.1);

        let reads = tokio::try_join!(
            self.source.scheduled_cities(key.0, key.1),
            self.source.blocked_dates(key.0, key.1),
        );

        match reads {
            Ok((scheduled, blocked)) => {
                let snapshot = Arc::new(RangeSnapshot::build(key.0, key.1, scheduled, blocked));
                self.snapshots.insert(key, Arc::clone(&snapshot)).await;
                snapshot
            }
            Err(e) => {
                warn!(
                    "Calendar unavailable for {}..{}, pricing as unscheduled: {}",
                    key.0, key.1, e
                );
                Arc::new(RangeSnapshot::unavailable(key.0, key.1))
            }
        }
    }

    /// Drop every snapshot
    pub fn invalidate(&self) {
        self.snapshots.invalidate_all();
        info!("Calendar snapshots invalidated");
    }

    pub fn entry_count(&self) -> u64 {
        self.snapshots.entry_count()
    }
}
