//! Prices in Vietnamese đồng.
//!
//! VND has no minor unit in practice, so a price is a plain integer number of
//! đồng. Formatting follows local convention: dot thousands separators and a
//! trailing `₫` (e.g. `1.800.000₫`).

use core::fmt;

use serde::{Deserialize, Serialize};

/// A price in the smallest currency unit (đồng).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Price(u64);

impl Price {
    /// Zero đồng.
    pub const ZERO: Self = Self(0);

    /// Create a price from an amount in đồng.
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// The raw amount in đồng.
    #[must_use]
    pub const fn amount(self) -> u64 {
        self.0
    }

    /// Percentage saved relative to an original (pre-sale) price, rounded down.
    ///
    /// Returns `None` when the original is not strictly higher.
    #[must_use]
    pub const fn discount_percent(self, original: Self) -> Option<u8> {
        if original.0 <= self.0 || original.0 == 0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)] // always in 1..=100
        let pct = scale(original.0 - self.0, 100, original.0) as u8;
        Some(pct)
    }

    /// Price after a member discount of `percent`, rounded down to the thousand đồng.
    #[must_use]
    pub const fn member_price(self, percent: u8) -> Self {
        let percent = if percent > 100 { 100 } else { percent as u64 };
        let raw = scale(self.0, 100 - percent, 100);
        Self(raw - raw % 1000)
    }

    /// `percent` of this price, rounded down.
    #[must_use]
    pub const fn percent_of(self, percent: u8) -> Self {
        Self(scale(self.0, percent as u64, 100))
    }

    /// Line total for `quantity` units.
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }

    /// Difference down to zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

/// `amount * numerator / denominator` without intermediate overflow,
/// saturating at `u64::MAX`.
#[allow(clippy::cast_possible_truncation)] // checked before narrowing
const fn scale(amount: u64, numerator: u64, denominator: u64) -> u64 {
    let wide = amount as u128 * numerator as u128 / denominator as u128;
    if wide > u64::MAX as u128 {
        u64::MAX
    } else {
        wide as u64
    }
}

impl core::ops::Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl core::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, p| acc + p)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let len = digits.len();
        let mut out = String::with_capacity(len + len / 3 + 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                out.push('.');
            }
            out.push(ch);
        }
        write!(f, "{out}₫")
    }
}

impl From<u64> for Price {
    fn from(amount: u64) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::new(1_800_000).to_string(), "1.800.000₫");
        assert_eq!(Price::new(950).to_string(), "950₫");
        assert_eq!(Price::new(12_500).to_string(), "12.500₫");
        assert_eq!(Price::ZERO.to_string(), "0₫");
    }

    #[test]
    fn test_discount_percent() {
        let price = Price::new(1_600_000);
        assert_eq!(price.discount_percent(Price::new(2_000_000)), Some(20));
        assert_eq!(price.discount_percent(Price::new(1_600_000)), None);
        assert_eq!(price.discount_percent(Price::new(1_000_000)), None);
    }

    #[test]
    fn test_member_price_rounds_to_thousand() {
        assert_eq!(Price::new(1_890_000).member_price(5), Price::new(1_795_000));
        assert_eq!(Price::new(1_000_000).member_price(150), Price::ZERO);
    }

    #[test]
    fn test_line_totals_sum() {
        let total: Price = [Price::new(450_000).times(2), Price::new(1_200_000)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::new(2_100_000));
        assert_eq!(Price::new(5).saturating_sub(Price::new(9)), Price::ZERO);
    }

    #[test]
    fn test_huge_prices_do_not_overflow() {
        let huge = Price::new(u64::MAX);
        assert_eq!(huge.percent_of(30).amount(), u64::MAX / 100 * 30 + u64::MAX % 100 * 30 / 100);
        assert_eq!(Price::new(u64::MAX / 2).discount_percent(huge), Some(50));
        assert!(huge.member_price(5) < huge);
        assert_eq!(huge.percent_of(200), huge);
    }
}
