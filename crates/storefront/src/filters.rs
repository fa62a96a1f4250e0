//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a đồng amount with dot separators, e.g. `1800000` as `1.800.000₫`.
///
/// Accepts a [`Price`](optica_core::Price) or a plain integer.
///
/// Usage in templates: `{{ product.price|vnd }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn vnd(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    Ok(digits
        .parse::<u64>()
        .map_or(raw, |amount| optica_core::Price::new(amount).to_string()))
}
