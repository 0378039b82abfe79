//! Carrying, assembly and extra helper costs.
//!
//! Pure functions over resolved items, access flags and reference tables.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::models::{AssemblyRate, CarryingConfig, ExtraHelperConfig, FurnitureItem, ItemClass};
use super::requests::Access;

/// A requested item joined with its catalog entry
#[derive(Debug, Clone, Copy)]
pub struct ResolvedItem<'a> {
    pub item: &'a FurnitureItem,
    pub quantity: u32,
    pub carrying: bool,
    pub assembly: bool,
    pub extra_helper: bool,
}

impl ResolvedItem<'_> {
    pub fn total_points(&self) -> Decimal {
        self.item.points * Decimal::from(self.quantity)
    }
}

/// How an elevator changes the carrying calculation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevatorFloorPolicy {
    /// Floors count as entered; an elevator lowers the multiplier instead
    #[default]
    MultiplierOnly,
    /// Legacy rule: an elevator turns any floor count on that side into one.
    /// Kept for old quotes only.
    CollapseToOne,
}

impl FromStr for ElevatorFloorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multiplier_only" => Ok(ElevatorFloorPolicy::MultiplierOnly),
            "collapse_to_one" => Ok(ElevatorFloorPolicy::CollapseToOne),
            other => Err(format!("unknown elevator floor policy '{}'", other)),
        }
    }
}

/// Floors carried across both ends
pub fn effective_floors(access: &Access, policy: ElevatorFloorPolicy) -> u32 {
    match policy {
        ElevatorFloorPolicy::MultiplierOnly => {
            access.pickup_floors.saturating_add(access.dropoff_floors)
        }
        ElevatorFloorPolicy::CollapseToOne => {
            let side = |floors: u32, elevator: bool| if elevator { floors.min(1) } else { floors };
            side(access.pickup_floors, access.pickup_elevator)
                .saturating_add(side(access.dropoff_floors, access.dropoff_elevator))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarryingLine {
    pub item_id: Uuid,
    pub name: String,
    pub class: ItemClass,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub points: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub multiplier: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarryingCost {
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    pub effective_floors: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub carried_points: Decimal,
    pub box_count: u32,
    pub minimum_fee_applied: bool,
    pub lines: Vec<CarryingLine>,
}

/// Carrying cost for every item flagged for carrying.
///
/// Per item: `points × quantity × multiplier × effective floors`. Boxes switch
/// to the tiring multiplier once the box count passes the threshold, and an
/// elevator on either side overrides every multiplier with the elevator one
/// under [`ElevatorFloorPolicy::MultiplierOnly`]. Jobs carrying fewer points
/// than the configured minimum pay the minimum fee on top.
pub fn carrying_cost(
    items: &[ResolvedItem<'_>],
    access: &Access,
    config: &CarryingConfig,
    policy: ElevatorFloorPolicy,
) -> CarryingCost {
    let carried: Vec<&ResolvedItem<'_>> = items.iter().filter(|i| i.carrying).collect();
    let floors = effective_floors(access, policy);

    let box_count: u32 = carried
        .iter()
        .filter(|i| i.item.class() == ItemClass::Box)
        .fold(0u32, |count, i| count.saturating_add(i.quantity));
    let tiring = i64::from(box_count) > i64::from(config.box_tiring_threshold);
    let elevator_override = policy == ElevatorFloorPolicy::MultiplierOnly && access.has_elevator();

    let lines: Vec<CarryingLine> = carried
        .iter()
        .map(|resolved| {
            let class = resolved.item.class();
            let multiplier = if elevator_override {
                config.elevator_multiplier
            } else {
                match class {
                    ItemClass::Standard => config.standard_multiplier,
                    ItemClass::Box if tiring => config.box_tiring_multiplier,
                    ItemClass::Box => config.box_multiplier,
                    ItemClass::Bag => config.bag_multiplier,
                    ItemClass::Luggage => config.luggage_multiplier,
                }
            };
            let points = resolved.total_points();
            CarryingLine {
                item_id: resolved.item.id,
                name: resolved.item.name.clone(),
                class,
                quantity: resolved.quantity,
                points,
                multiplier,
                cost: points * multiplier * Decimal::from(floors),
            }
        })
        .collect();

    let carried_points: Decimal = lines.iter().map(|l| l.points).sum();
    let minimum_fee_applied = !lines.is_empty() && carried_points < config.minimum_points;

    let mut total: Decimal = lines.iter().map(|l| l.cost).sum();
    if minimum_fee_applied {
        total += config.minimum_fee;
    }

    CarryingCost {
        total,
        effective_floors: floors,
        carried_points,
        box_count,
        minimum_fee_applied,
        lines,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyCategory {
    Bed,
    Closet,
    Table,
    Sofa,
}

impl AssemblyCategory {
    /// Checked in order; the first keyword hit decides
    const KEYWORDS: &'static [(AssemblyCategory, &'static [&'static str])] = &[
        (AssemblyCategory::Sofa, &["sofa", "couch", "bank"]),
        (AssemblyCategory::Bed, &["bed", "boxspring"]),
        (AssemblyCategory::Closet, &["closet", "wardrobe", "cabinet", "kast"]),
        (AssemblyCategory::Table, &["table", "tafel", "desk", "bureau"]),
    ];

    pub fn classify(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| name.contains(w)))
            .map(|(category, _)| *category)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssemblyCategory::Bed => "bed",
            AssemblyCategory::Closet => "closet",
            AssemblyCategory::Table => "table",
            AssemblyCategory::Sofa => "sofa",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssemblyLine {
    pub item_id: Uuid,
    pub name: String,
    pub category: AssemblyCategory,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssemblyCost {
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    pub lines: Vec<AssemblyLine>,
}

fn assembly_price(
    category: AssemblyCategory,
    name: &str,
    rates: &[AssemblyRate],
) -> Option<Decimal> {
    let in_category = |rate: &&AssemblyRate| rate.category.eq_ignore_ascii_case(category.as_str());
    rates
        .iter()
        .filter(in_category)
        .find(|rate| rate.item_type.trim().eq_ignore_ascii_case(name.trim()))
        .or_else(|| {
            rates
                .iter()
                .filter(in_category)
                .find(|rate| rate.item_type.eq_ignore_ascii_case("default"))
        })
        .map(|rate| rate.price)
}

/// Assembly and disassembly cost for every item flagged for assembly.
///
/// Items outside the known categories, or without a price row, add nothing.
pub fn assembly_cost(items: &[ResolvedItem<'_>], rates: &[AssemblyRate]) -> AssemblyCost {
    let mut lines = Vec::new();
    for resolved in items.iter().filter(|i| i.assembly) {
        let name = resolved.item.name.as_str();
        let Some(category) = AssemblyCategory::classify(name) else {
            debug!("No assembly category for '{}', skipping", name);
            continue;
        };
        let Some(unit_price) = assembly_price(category, name, rates) else {
            debug!("No {} assembly price for '{}', skipping", category.as_str(), name);
            continue;
        };
        lines.push(AssemblyLine {
            item_id: resolved.item.id,
            name: name.to_string(),
            category,
            quantity: resolved.quantity,
            unit_price,
            cost: unit_price * Decimal::from(resolved.quantity),
        });
    }

    AssemblyCost {
        total: lines.iter().map(|l| l.cost).sum(),
        lines,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HelperBand {
    None,
    Small,
    Big,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtraHelperCost {
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub points: Decimal,
    pub band: HelperBand,
}

/// Flat extra helper fee banded on the points of the flagged items
pub fn extra_helper_cost(
    items: &[ResolvedItem<'_>],
    config: &ExtraHelperConfig,
) -> ExtraHelperCost {
    let points: Decimal = items
        .iter()
        .filter(|i| i.extra_helper)
        .map(ResolvedItem::total_points)
        .sum();

    let (band, total) = if points <= Decimal::ZERO {
        (HelperBand::None, Decimal::ZERO)
    } else if points <= config.points_threshold {
        (HelperBand::Small, config.small_fee)
    } else {
        (HelperBand::Big, config.big_fee)
    };

    ExtraHelperCost {
        total,
        points,
        band,
    }
}
