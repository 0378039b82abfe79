//! Database queries for the pricing engine.
//!
//! Read-only: administrative writes happen elsewhere and call
//! `AppCache::invalidate_all` afterwards.

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::AppError;

use super::models::{
    AssemblyRate, BlockedDate, CarryingConfig, CityRate, DiscountFeeConfig, ExtraHelperConfig,
    FurnitureItem, ScheduledCity,
};

/// Get all configured city base charges, in table order
pub async fn get_city_rates(pool: &PgPool) -> Result<Vec<CityRate>, AppError> {
    let rates = sqlx::query_as::<_, CityRate>(
        r#"
        SELECT city_name, cheap_rate, standard_rate, latitude, longitude
        FROM city_base_charges
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rates)
}

/// Get the full furniture catalog
pub async fn get_furniture_items(pool: &PgPool) -> Result<Vec<FurnitureItem>, AppError> {
    let items = sqlx::query_as::<_, FurnitureItem>(
        r#"
        SELECT id, name, category, points
        FROM furniture_items
        ORDER BY category, name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// Get the carrying multipliers (singleton row)
pub async fn get_carrying_config(pool: &PgPool) -> Result<CarryingConfig, AppError> {
    sqlx::query_as::<_, CarryingConfig>(
        r#"
        SELECT
            standard_multiplier, box_multiplier, box_tiring_multiplier,
            box_tiring_threshold, bag_multiplier, luggage_multiplier,
            elevator_multiplier, minimum_points, minimum_fee
        FROM carrying_config
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)
}

/// Get all assembly prices
pub async fn get_assembly_rates(pool: &PgPool) -> Result<Vec<AssemblyRate>, AppError> {
    let rates = sqlx::query_as::<_, AssemblyRate>(
        r#"
        SELECT category, item_type, price
        FROM assembly_prices
        ORDER BY category, item_type
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rates)
}

/// Get the extra helper fee bands (singleton row)
pub async fn get_extra_helper_config(pool: &PgPool) -> Result<ExtraHelperConfig, AppError> {
    sqlx::query_as::<_, ExtraHelperConfig>(
        r#"
        SELECT points_threshold, small_fee, big_fee
        FROM extra_helper_config
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)
}

/// Get the discount and fee settings (singleton row)
pub async fn get_discount_fee_config(pool: &PgPool) -> Result<DiscountFeeConfig, AppError> {
    sqlx::query_as::<_, DiscountFeeConfig>(
        r#"
        SELECT student_discount_rate, late_booking_days, late_booking_fee
        FROM discount_fee_config
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)
}

/// Get every (date, city) route stop within an inclusive date range
pub async fn get_scheduled_cities(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ScheduledCity>, AppError> {
    let rows = sqlx::query_as::<_, ScheduledCity>(
        r#"
        SELECT schedule_date AS date, city
        FROM city_schedules
        WHERE schedule_date BETWEEN $1 AND $2
        ORDER BY schedule_date
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Get blocked dates within an inclusive date range
pub async fn get_blocked_dates(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<BlockedDate>, AppError> {
    let rows = sqlx::query_as::<_, BlockedDate>(
        r#"
        SELECT blocked_date AS date, COALESCE(cities, '{}') AS cities
        FROM blocked_dates
        WHERE blocked_date BETWEEN $1 AND $2
        ORDER BY blocked_date
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
