//! City resolution.
//!
//! Maps a free-form location onto one configured [`CityRate`] row. Resolution
//! never fails: every price path needs a rate, so an unresolvable location
//! degrades to the first configured city with a warning.
//!
//! The cascade, first match wins:
//! 1. the explicit city field (exact, then bidirectional containment)
//! 2. the name variation table
//! 3. a configured city name inside the free-text address
//! 4. the nearest configured city by great-circle distance
//! 5. the first row of the rate table

use serde::Serialize;
use tracing::warn;

use super::models::CityRate;
use super::requests::Location;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Shorter city inputs only resolve on an exact match
const MIN_PARTIAL_MATCH_LEN: usize = 3;

/// Regional and historic spellings mapped to the canonical configured name
const NAME_VARIATIONS: &[(&str, &str)] = &[
    ("'s-gravenhage", "Den Haag"),
    ("s-gravenhage", "Den Haag"),
    ("the hague", "Den Haag"),
    ("den bosch", "'s-Hertogenbosch"),
    ("s-hertogenbosch", "'s-Hertogenbosch"),
    ("hertogenbosch", "'s-Hertogenbosch"),
    ("leyden", "Leiden"),
    ("nimwegen", "Nijmegen"),
];

/// Non-empty city rate table, in configured order
#[derive(Debug, Clone, PartialEq)]
pub struct CityRates(Vec<CityRate>);

impl CityRates {
    /// Returns `None` for an empty table
    pub fn new(rates: Vec<CityRate>) -> Option<Self> {
        if rates.is_empty() {
            None
        } else {
            Some(Self(rates))
        }
    }

    pub fn as_slice(&self) -> &[CityRate] {
        &self.0
    }

    pub fn first(&self) -> &CityRate {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &CityRate> {
        self.0.iter()
    }

    /// Case-insensitive lookup by configured name
    pub fn find(&self, name: &str) -> Option<&CityRate> {
        self.0
            .iter()
            .find(|rate| rate.city_name.eq_ignore_ascii_case(name.trim()))
    }
}

/// Which step of the cascade produced the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    CityName,
    NameVariation,
    Address,
    Nearest,
    Fallback,
}

/// Outcome of [`resolve`]
#[derive(Debug, Clone, Copy)]
pub struct ResolvedCity<'a> {
    pub rate: &'a CityRate,
    pub method: ResolutionMethod,
}

/// Resolve a location to a configured city rate.
///
/// Deterministic for identical inputs: every step scans the table in order
/// and breaks ties in favour of the earlier row.
pub fn resolve<'a>(location: &Location, rates: &'a CityRates) -> ResolvedCity<'a> {
    let city = normalized(location.city.as_deref());
    let address = normalized(location.address.as_deref());

    if let Some(city) = city.as_deref() {
        if let Some(rate) = match_city_field(city, rates) {
            return ResolvedCity {
                rate,
                method: ResolutionMethod::CityName,
            };
        }
    }

    for text in [city.as_deref(), address.as_deref()].into_iter().flatten() {
        if let Some(rate) = match_variation(text, rates) {
            return ResolvedCity {
                rate,
                method: ResolutionMethod::NameVariation,
            };
        }
    }

    if let Some(address) = address.as_deref() {
        if let Some(rate) = match_address(address, rates) {
            return ResolvedCity {
                rate,
                method: ResolutionMethod::Address,
            };
        }
    }

    if let Some(origin) = location.coordinates() {
        if let Some(rate) = nearest(origin, rates) {
            return ResolvedCity {
                rate,
                method: ResolutionMethod::Nearest,
            };
        }
    }

    let rate = rates.first();
    warn!(
        city = ?location.city,
        address = ?location.address,
        fallback = %rate.city_name,
        "Could not resolve location to a configured city, using fallback"
    );
    ResolvedCity {
        rate,
        method: ResolutionMethod::Fallback,
    }
}

fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

fn match_city_field<'a>(city: &str, rates: &'a CityRates) -> Option<&'a CityRate> {
    if let Some(rate) = rates.find(city) {
        return Some(rate);
    }
    if city.chars().count() < MIN_PARTIAL_MATCH_LEN {
        return None;
    }
    rates.iter().find(|rate| {
        let name = rate.city_name.trim().to_lowercase();
        !name.is_empty() && (city.contains(&name) || name.contains(city))
    })
}

fn match_variation<'a>(text: &str, rates: &'a CityRates) -> Option<&'a CityRate> {
    NAME_VARIATIONS
        .iter()
        .filter(|(variant, _)| text.contains(variant))
        .find_map(|(_, canonical)| rates.find(canonical))
}

/// Addresses end with the city, so the name found furthest right wins;
/// equal positions prefer the longer name, then the earlier row.
fn match_address<'a>(address: &str, rates: &'a CityRates) -> Option<&'a CityRate> {
    let mut best: Option<(usize, usize, &CityRate)> = None;
    for rate in rates.iter() {
        let name = rate.city_name.trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        let Some(position) = address.rfind(&name) else {
            continue;
        };
        let better = match best {
            None => true,
            Some((best_pos, best_len, _)) => {
                position > best_pos || (position == best_pos && name.len() > best_len)
            }
        };
        if better {
            best = Some((position, name.len(), rate));
        }
    }
    best.map(|(_, _, rate)| rate)
}

fn nearest(origin: (f64, f64), rates: &CityRates) -> Option<&CityRate> {
    let mut best: Option<(f64, &CityRate)> = None;
    for rate in rates.iter() {
        let Some(target) = rate.coordinates() else {
            continue;
        };
        let distance = haversine_km(origin, target);
        if best.map_or(true, |(best_distance, _)| distance < best_distance) {
            best = Some((distance, rate));
        }
    }
    best.map(|(_, rate)| rate)
}

/// Great-circle distance in kilometres between two (latitude, longitude) points
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}
