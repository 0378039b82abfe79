//! Base rate tier selection.
//!
//! Pure functions, one per scenario family. Each returns the base charge and
//! the tier that produced it so a quote can be audited afterwards.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::calendar::CalendarStatus;
use super::models::CityRate;

/// Share of the standard rate charged on a day with no route at all
const EMPTY_DAY_FACTOR: Decimal = dec!(0.75);

/// Windows longer than this always contain a cheap day
pub const FLEXIBLE_CHEAP_WINDOW_DAYS: i64 = 7;

/// The four rates a base price is chosen from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rates {
    pub pickup_cheap: Decimal,
    pub pickup_standard: Decimal,
    pub dropoff_cheap: Decimal,
    pub dropoff_standard: Decimal,
}

impl Rates {
    pub fn between(pickup: &CityRate, dropoff: &CityRate) -> Self {
        Self {
            pickup_cheap: pickup.cheap_rate,
            pickup_standard: pickup.standard_rate,
            dropoff_cheap: dropoff.cheap_rate,
            dropoff_standard: dropoff.standard_rate,
        }
    }

    fn max_standard(&self) -> Decimal {
        self.pickup_standard.max(self.dropoff_standard)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    Blocked,
    CityDay,
    EmptyDay,
    Standard,
    BothScheduled,
    PickupScheduled,
    DropoffScheduled,
    IntercityEmptyDay,
    IntercityStandard,
    FlexibleLongWindow,
    FlexibleCityDay,
    FlexibleSharedDay,
    FlexibleStandard,
    RehomeChoose,
}

impl PriceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Blocked => "blocked",
            PriceTier::CityDay => "city_day",
            PriceTier::EmptyDay => "empty_day",
            PriceTier::Standard => "standard",
            PriceTier::BothScheduled => "both_scheduled",
            PriceTier::PickupScheduled => "pickup_scheduled",
            PriceTier::DropoffScheduled => "dropoff_scheduled",
            PriceTier::IntercityEmptyDay => "intercity_empty_day",
            PriceTier::IntercityStandard => "intercity_standard",
            PriceTier::FlexibleLongWindow => "flexible_long_window",
            PriceTier::FlexibleCityDay => "flexible_city_day",
            PriceTier::FlexibleSharedDay => "flexible_shared_day",
            PriceTier::FlexibleStandard => "flexible_standard",
            PriceTier::RehomeChoose => "rehome_choose",
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BasePrice {
    pub price: Decimal,
    #[serde(rename = "type")]
    pub tier: PriceTier,
}

impl BasePrice {
    fn new(price: Decimal, tier: PriceTier) -> Self {
        Self { price, tier }
    }

    pub fn blocked() -> Self {
        Self::new(Decimal::ZERO, PriceTier::Blocked)
    }
}

fn avg(a: Decimal, b: Decimal) -> Decimal {
    (a + b) / dec!(2)
}

/// How an intercity job on an empty day is priced
#[derive(Debug, Clone, Copy)]
enum EmptyIntercity {
    /// 75% of the higher standard rate
    DiscountedMax,
    /// Mean of both standard rates
    AverageStandard,
}

/// Pickup and dropoff statuses are for the same date.
fn same_date(
    rates: &Rates,
    is_intercity: bool,
    pickup: CalendarStatus,
    dropoff: CalendarStatus,
    empty_rule: EmptyIntercity,
) -> BasePrice {
    if pickup.is_blocked || dropoff.is_blocked {
        return BasePrice::blocked();
    }

    if !is_intercity {
        return if pickup.is_scheduled {
            BasePrice::new(rates.pickup_cheap, PriceTier::CityDay)
        } else if pickup.is_empty {
            BasePrice::new(rates.pickup_standard * EMPTY_DAY_FACTOR, PriceTier::EmptyDay)
        } else {
            BasePrice::new(rates.pickup_standard, PriceTier::Standard)
        };
    }

    match (pickup.is_scheduled, dropoff.is_scheduled) {
        (true, true) => BasePrice::new(
            avg(rates.pickup_cheap, rates.dropoff_cheap),
            PriceTier::BothScheduled,
        ),
        (true, false) => BasePrice::new(
            avg(rates.pickup_cheap, rates.dropoff_standard),
            PriceTier::PickupScheduled,
        ),
        (false, true) => BasePrice::new(
            avg(rates.pickup_standard, rates.dropoff_cheap),
            PriceTier::DropoffScheduled,
        ),
        (false, false) if pickup.is_empty && dropoff.is_empty => {
            let price = match empty_rule {
                EmptyIntercity::DiscountedMax => rates.max_standard() * EMPTY_DAY_FACTOR,
                EmptyIntercity::AverageStandard => {
                    avg(rates.pickup_standard, rates.dropoff_standard)
                }
            };
            BasePrice::new(price, PriceTier::IntercityEmptyDay)
        }
        (false, false) => BasePrice::new(rates.max_standard(), PriceTier::IntercityStandard),
    }
}

/// House moving on a date chosen by the customer.
pub fn house_moving_fixed(
    rates: &Rates,
    is_intercity: bool,
    pickup: CalendarStatus,
    dropoff: CalendarStatus,
) -> BasePrice {
    same_date(rates, is_intercity, pickup, dropoff, EmptyIntercity::DiscountedMax)
}

/// Item transport with pickup and dropoff on the same chosen date.
///
/// Identical to [`house_moving_fixed`] except an intercity empty day is the
/// mean of both standard rates rather than 75% of the higher one.
pub fn item_transport_same_date(
    rates: &Rates,
    is_intercity: bool,
    pickup: CalendarStatus,
    dropoff: CalendarStatus,
) -> BasePrice {
    same_date(
        rates,
        is_intercity,
        pickup,
        dropoff,
        EmptyIntercity::AverageStandard,
    )
}

/// Item transport with pickup and dropoff on different chosen dates.
///
/// `pickup` is the pickup city on the pickup date, `dropoff` the dropoff city
/// on the dropoff date. A scheduled side earns the averaged cheap rate
/// regardless of whether the other date is empty.
pub fn item_transport_diff_dates(
    rates: &Rates,
    is_intercity: bool,
    pickup: CalendarStatus,
    dropoff: CalendarStatus,
) -> BasePrice {
    match (pickup.is_scheduled, dropoff.is_scheduled) {
        (true, true) => BasePrice::new(
            avg(rates.pickup_cheap, rates.dropoff_cheap),
            PriceTier::BothScheduled,
        ),
        (true, false) => BasePrice::new(
            avg(rates.pickup_cheap, rates.dropoff_standard),
            PriceTier::PickupScheduled,
        ),
        (false, true) => BasePrice::new(
            avg(rates.pickup_standard, rates.dropoff_cheap),
            PriceTier::DropoffScheduled,
        ),
        (false, false) if pickup.is_empty && dropoff.is_empty => {
            if is_intercity {
                BasePrice::new(
                    avg(rates.pickup_standard, rates.dropoff_standard),
                    PriceTier::IntercityEmptyDay,
                )
            } else {
                BasePrice::new(rates.pickup_standard * EMPTY_DAY_FACTOR, PriceTier::EmptyDay)
            }
        }
        (false, false) => {
            if is_intercity {
                BasePrice::new(rates.max_standard(), PriceTier::IntercityStandard)
            } else {
                BasePrice::new(rates.pickup_standard, PriceTier::Standard)
            }
        }
    }
}

/// Inclusive number of days in a window
pub fn range_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Flexible window chosen by the customer.
///
/// `pickup_days` and `dropoff_days` are the dates inside the window on which
/// each city is scheduled. Empty days do not count as availability.
pub fn flexible_range(
    rates: &Rates,
    is_intercity: bool,
    range_days: i64,
    pickup_days: &BTreeSet<NaiveDate>,
    dropoff_days: &BTreeSet<NaiveDate>,
) -> BasePrice {
    if range_days > FLEXIBLE_CHEAP_WINDOW_DAYS {
        return BasePrice::new(rates.pickup_cheap, PriceTier::FlexibleLongWindow);
    }

    if !is_intercity {
        return if pickup_days.is_empty() {
            BasePrice::new(rates.pickup_standard, PriceTier::FlexibleStandard)
        } else {
            BasePrice::new(rates.pickup_cheap, PriceTier::FlexibleCityDay)
        };
    }

    if pickup_days.intersection(dropoff_days).next().is_some() {
        BasePrice::new(
            avg(rates.pickup_cheap, rates.dropoff_cheap),
            PriceTier::FlexibleSharedDay,
        )
    } else {
        BasePrice::new(rates.pickup_standard, PriceTier::FlexibleStandard)
    }
}

/// We choose the date, so we always choose a cheap one.
pub fn rehome_choose(rates: &Rates) -> BasePrice {
    BasePrice::new(rates.pickup_cheap, PriceTier::RehomeChoose)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMSTERDAM_EINDHOVEN: Rates = Rates {
        pickup_cheap: dec!(39),
        pickup_standard: dec!(119),
        dropoff_cheap: dec!(34),
        dropoff_standard: dec!(89),
    };

    const AMSTERDAM: Rates = Rates {
        pickup_cheap: dec!(39),
        pickup_standard: dec!(119),
        dropoff_cheap: dec!(39),
        dropoff_standard: dec!(119),
    };

    fn status(is_scheduled: bool, is_empty: bool) -> CalendarStatus {
        CalendarStatus {
            is_scheduled,
            is_empty,
            is_blocked: false,
        }
    }

    const SCHEDULED: CalendarStatus = CalendarStatus {
        is_scheduled: true,
        is_empty: false,
        is_blocked: false,
    };
    const EMPTY: CalendarStatus = CalendarStatus {
        is_scheduled: false,
        is_empty: true,
        is_blocked: false,
    };
    const OTHER_CITY: CalendarStatus = CalendarStatus {
        is_scheduled: false,
        is_empty: false,
        is_blocked: false,
    };

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    // ==================== house moving, fixed date ====================

    #[test]
    fn test_house_moving_same_city_scheduled() {
        let p = house_moving_fixed(&AMSTERDAM, false, SCHEDULED, SCHEDULED);
        assert_eq!(p.price, dec!(39));
        assert_eq!(p.tier, PriceTier::CityDay);
    }

    #[test]
    fn test_house_moving_same_city_empty_day() {
        let p = house_moving_fixed(&AMSTERDAM, false, EMPTY, EMPTY);
        assert_eq!(p.price, dec!(89.25));
        assert_eq!(p.tier, PriceTier::EmptyDay);
    }

    #[test]
    fn test_house_moving_same_city_standard() {
        let p = house_moving_fixed(&AMSTERDAM, false, OTHER_CITY, OTHER_CITY);
        assert_eq!(p.price, dec!(119));
        assert_eq!(p.tier, PriceTier::Standard);
    }

    #[test]
    fn test_house_moving_intercity_both_scheduled() {
        let p = house_moving_fixed(&AMSTERDAM_EINDHOVEN, true, SCHEDULED, SCHEDULED);
        assert_eq!(p.price, dec!(36.5));
        assert_eq!(p.tier, PriceTier::BothScheduled);
    }

    #[test]
    fn test_house_moving_intercity_one_side_scheduled() {
        let p = house_moving_fixed(&AMSTERDAM_EINDHOVEN, true, SCHEDULED, OTHER_CITY);
        assert_eq!(p.price, dec!(64)); // (39 + 89) / 2
        assert_eq!(p.tier, PriceTier::PickupScheduled);

        let p = house_moving_fixed(&AMSTERDAM_EINDHOVEN, true, OTHER_CITY, SCHEDULED);
        assert_eq!(p.price, dec!(76.5)); // (119 + 34) / 2
        assert_eq!(p.tier, PriceTier::DropoffScheduled);
    }

    #[test]
    fn test_house_moving_intercity_empty_day() {
        let p = house_moving_fixed(&AMSTERDAM_EINDHOVEN, true, EMPTY, EMPTY);
        assert_eq!(p.price, dec!(89.25)); // 119 * 0.75
        assert_eq!(p.tier, PriceTier::IntercityEmptyDay);
    }

    #[test]
    fn test_house_moving_intercity_standard() {
        let p = house_moving_fixed(&AMSTERDAM_EINDHOVEN, true, OTHER_CITY, OTHER_CITY);
        assert_eq!(p.price, dec!(119));
        assert_eq!(p.tier, PriceTier::IntercityStandard);
    }

    #[test]
    fn test_blocked_short_circuits() {
        let blocked = CalendarStatus {
            is_blocked: true,
            ..SCHEDULED
        };
        for p in [
            house_moving_fixed(&AMSTERDAM, false, blocked, blocked),
            house_moving_fixed(&AMSTERDAM_EINDHOVEN, true, SCHEDULED, blocked),
            item_transport_same_date(&AMSTERDAM_EINDHOVEN, true, blocked, EMPTY),
        ] {
            assert_eq!(p.price, Decimal::ZERO);
            assert_eq!(p.tier.as_str(), "blocked");
        }
    }

    // ==================== item transport ====================

    #[test]
    fn test_item_transport_same_date_intercity_empty_day() {
        let p = item_transport_same_date(&AMSTERDAM_EINDHOVEN, true, EMPTY, EMPTY);
        assert_eq!(p.price, dec!(104)); // (119 + 89) / 2
    }

    #[test]
    fn test_item_transport_same_date_matches_house_moving_elsewhere() {
        for (pickup, dropoff) in [
            (SCHEDULED, SCHEDULED),
            (SCHEDULED, OTHER_CITY),
            (OTHER_CITY, SCHEDULED),
            (OTHER_CITY, OTHER_CITY),
        ] {
            assert_eq!(
                house_moving_fixed(&AMSTERDAM_EINDHOVEN, true, pickup, dropoff),
                item_transport_same_date(&AMSTERDAM_EINDHOVEN, true, pickup, dropoff)
            );
        }
        assert_eq!(
            house_moving_fixed(&AMSTERDAM, false, EMPTY, EMPTY),
            item_transport_same_date(&AMSTERDAM, false, EMPTY, EMPTY)
        );
    }

    #[test]
    fn test_services_diverge_on_intercity_empty_days() {
        for (a, b) in [(dec!(119), dec!(89)), (dec!(60), dec!(140)), (dec!(100), dec!(99))] {
            let rates = Rates {
                pickup_cheap: dec!(30),
                pickup_standard: a,
                dropoff_cheap: dec!(30),
                dropoff_standard: b,
            };
            let house = house_moving_fixed(&rates, true, EMPTY, EMPTY);
            let items = item_transport_same_date(&rates, true, EMPTY, EMPTY);
            assert_ne!(house.price, items.price, "standards {a} / {b}");
        }
    }

    #[test]
    fn test_diff_dates_pickup_scheduled_regardless_of_empty_dropoff_date() {
        let p = item_transport_diff_dates(&AMSTERDAM_EINDHOVEN, true, SCHEDULED, EMPTY);
        assert_eq!(p.price, dec!(64)); // (39 + 89) / 2
        assert_eq!(p.tier, PriceTier::PickupScheduled);
    }

    #[test]
    fn test_diff_dates_dropoff_scheduled_regardless_of_empty_pickup_date() {
        let p = item_transport_diff_dates(&AMSTERDAM_EINDHOVEN, true, EMPTY, SCHEDULED);
        assert_eq!(p.price, dec!(76.5)); // (119 + 34) / 2
    }

    #[test]
    fn test_diff_dates_both_scheduled_and_both_empty() {
        let p = item_transport_diff_dates(&AMSTERDAM_EINDHOVEN, true, SCHEDULED, SCHEDULED);
        assert_eq!(p.price, dec!(36.5));

        let p = item_transport_diff_dates(&AMSTERDAM_EINDHOVEN, true, EMPTY, EMPTY);
        assert_eq!(p.price, dec!(104));

        let p = item_transport_diff_dates(&AMSTERDAM, false, EMPTY, EMPTY);
        assert_eq!(p.price, dec!(89.25));
    }

    #[test]
    fn test_diff_dates_neither_scheduled_one_empty() {
        let p = item_transport_diff_dates(&AMSTERDAM_EINDHOVEN, true, EMPTY, OTHER_CITY);
        assert_eq!(p.price, dec!(119));
        assert_eq!(p.tier, PriceTier::IntercityStandard);

        let p = item_transport_diff_dates(&AMSTERDAM, false, OTHER_CITY, EMPTY);
        assert_eq!(p.price, dec!(119));
        assert_eq!(p.tier, PriceTier::Standard);
    }

    #[test]
    fn test_diff_dates_ignore_blocked_flag() {
        let blocked = CalendarStatus {
            is_blocked: true,
            ..SCHEDULED
        };
        let p = item_transport_diff_dates(&AMSTERDAM_EINDHOVEN, true, blocked, blocked);
        assert_eq!(p.tier, PriceTier::BothScheduled);
    }

    // ==================== flexible ====================

    #[test]
    fn test_range_days_is_inclusive() {
        assert_eq!(range_days(day(1), day(1)), 1);
        assert_eq!(range_days(day(1), day(10)), 10);
    }

    #[test]
    fn test_flexible_long_window_is_always_pickup_cheap() {
        let none = BTreeSet::new();
        let p = flexible_range(&AMSTERDAM_EINDHOVEN, true, 10, &none, &none);
        assert_eq!(p.price, dec!(39));
        assert_eq!(p.tier, PriceTier::FlexibleLongWindow);

        let p = flexible_range(&AMSTERDAM, false, 8, &none, &none);
        assert_eq!(p.price, dec!(39));
    }

    #[test]
    fn test_flexible_same_city_needs_a_scheduled_day() {
        let none = BTreeSet::new();
        let some: BTreeSet<_> = [day(3)].into();
        assert_eq!(flexible_range(&AMSTERDAM, false, 7, &none, &none).price, dec!(119));
        assert_eq!(flexible_range(&AMSTERDAM, false, 7, &some, &some).price, dec!(39));
    }

    #[test]
    fn test_flexible_intercity_needs_a_shared_day() {
        let pickup: BTreeSet<_> = [day(3), day(5)].into();
        let disjoint: BTreeSet<_> = [day(4)].into();
        let shared: BTreeSet<_> = [day(4), day(5)].into();

        let p = flexible_range(&AMSTERDAM_EINDHOVEN, true, 7, &pickup, &disjoint);
        assert_eq!(p.price, dec!(119));
        assert_eq!(p.tier, PriceTier::FlexibleStandard);

        let p = flexible_range(&AMSTERDAM_EINDHOVEN, true, 7, &pickup, &shared);
        assert_eq!(p.price, dec!(36.5));
        assert_eq!(p.tier, PriceTier::FlexibleSharedDay);
    }

    // ==================== rehome choose & properties ====================

    #[test]
    fn test_rehome_choose_is_always_pickup_cheap() {
        for rates in [AMSTERDAM, AMSTERDAM_EINDHOVEN] {
            let p = rehome_choose(&rates);
            assert_eq!(p.price, rates.pickup_cheap);
            assert_eq!(p.tier, PriceTier::RehomeChoose);
        }
    }

    #[test]
    fn test_rules_are_idempotent() {
        let statuses = [
            SCHEDULED,
            EMPTY,
            OTHER_CITY,
            status(true, true),
            status(false, false),
        ];
        for pickup in statuses {
            for dropoff in statuses {
                for intercity in [false, true] {
                    let first = (
                        house_moving_fixed(&AMSTERDAM_EINDHOVEN, intercity, pickup, dropoff),
                        item_transport_same_date(&AMSTERDAM_EINDHOVEN, intercity, pickup, dropoff),
                        item_transport_diff_dates(&AMSTERDAM_EINDHOVEN, intercity, pickup, dropoff),
                    );
                    let second = (
                        house_moving_fixed(&AMSTERDAM_EINDHOVEN, intercity, pickup, dropoff),
                        item_transport_same_date(&AMSTERDAM_EINDHOVEN, intercity, pickup, dropoff),
                        item_transport_diff_dates(&AMSTERDAM_EINDHOVEN, intercity, pickup, dropoff),
                    );
                    assert_eq!(first, second);
                }
            }
        }
    }

    #[test]
    fn test_tier_serializes_as_type_label() {
        let json = serde_json::to_value(rehome_choose(&AMSTERDAM)).unwrap();
        assert_eq!(json["type"], "rehome_choose");
        assert_eq!(json["price"], "39");
    }
}
