//! Catalog narrowing selections and sort order.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::catalog::{Category, FrameDesign, Material, Shape};
use super::price::Price;

/// Sentinel slug meaning "no constraint".
pub const ALL_SLUG: &str = "all";

/// One filter field: unconstrained, a known value, or an unrecognized slug.
///
/// An unrecognized slug (e.g. a stale bookmark naming a retired shape) is kept
/// rather than rejected, and matches no product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Selection<T> {
    /// No constraint.
    #[default]
    All,
    /// Only products carrying this value.
    Only(T),
    /// A value outside the known vocabulary.
    Unrecognized(String),
}

impl<T: FromStr> Selection<T> {
    /// Parse a raw query value. Empty input and `"all"` mean [`Selection::All`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case(ALL_SLUG) {
            return Self::All;
        }
        raw.parse::<T>()
            .map_or_else(|_| Self::Unrecognized(raw.to_owned()), Self::Only)
    }
}

impl<T> Selection<T> {
    /// Whether this field constrains the result.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::All)
    }

    /// The selected value, if it is a known one.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Only(value) => Some(value),
            Self::All | Self::Unrecognized(_) => None,
        }
    }

    /// Test a product attribute against this selection with a custom equality.
    pub fn matches_by<U>(&self, attribute: Option<U>, eq: impl FnOnce(&T, U) -> bool) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => attribute.is_some_and(|value| eq(wanted, value)),
            Self::Unrecognized(_) => false,
        }
    }
}

impl<T: PartialEq + Copy> Selection<T> {
    /// Test a product attribute against this selection.
    #[must_use]
    pub fn matches(&self, attribute: Option<T>) -> bool {
        self.matches_by(attribute, |wanted, value| *wanted == value)
    }
}

impl<T: fmt::Display> Selection<T> {
    /// Slug for URLs; `None` when unconstrained.
    #[must_use]
    pub fn slug(&self) -> Option<String> {
        match self {
            Self::All => None,
            Self::Only(value) => Some(value.to_string()),
            Self::Unrecognized(raw) => Some(raw.clone()),
        }
    }
}

impl<T: fmt::Display> Serialize for Selection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.slug() {
            Some(slug) => serializer.serialize_str(&slug),
            None => serializer.serialize_str(ALL_SLUG),
        }
    }
}

impl<'de, T: FromStr> Deserialize<'de> for Selection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
    /// Highest rating first; ties keep catalog order.
    RatingDesc,
    /// New arrivals first; otherwise catalog order.
    NewestFirst,
    /// Highest rating first; ties keep catalog order.
    #[default]
    Popular,
}

impl SortKey {
    /// Every sort key, in menu order.
    pub const ALL: &'static [Self] = &[
        Self::Popular,
        Self::NewestFirst,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::RatingDesc,
    ];

    /// URL slug.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::RatingDesc => "rating-desc",
            Self::NewestFirst => "newest-first",
            Self::Popular => "popular",
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PriceAsc => "Giá thấp đến cao",
            Self::PriceDesc => "Giá cao đến thấp",
            Self::RatingDesc => "Đánh giá cao nhất",
            Self::NewestFirst => "Mới nhất",
            Self::Popular => "Phổ biến",
        }
    }

    /// Parse a slug, falling back to the default order for unknown input.
    #[must_use]
    pub fn parse_or_default(raw: &str) -> Self {
        let raw = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.slug().eq_ignore_ascii_case(raw))
            .unwrap_or_default()
    }
}

/// The full set of catalog narrowing selections plus the sort order.
///
/// Every active field is combined with logical AND.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub category: Selection<Category>,
    pub brand: Selection<String>,
    pub style: Selection<Shape>,
    pub material: Selection<Material>,
    pub frame_design: Selection<FrameDesign>,
    /// Inclusive price ceiling.
    pub price_max: Price,
    pub on_sale_only: bool,
    pub new_only: bool,
    pub sort: SortKey,
}

impl FilterState {
    /// All fields unconstrained; the price ceiling is the catalog's maximum.
    #[must_use]
    pub fn initial(catalog_ceiling: Price) -> Self {
        Self {
            category: Selection::All,
            brand: Selection::All,
            style: Selection::All,
            material: Selection::All,
            frame_design: Selection::All,
            price_max: catalog_ceiling,
            on_sale_only: false,
            new_only: false,
            sort: SortKey::default(),
        }
    }

    /// Whether the narrowing fields (everything but `sort`) equal `other`'s.
    #[must_use]
    pub fn same_filters(&self, other: &Self) -> bool {
        self.category == other.category
            && self.brand == other.brand
            && self.style == other.style
            && self.material == other.material
            && self.frame_design == other.frame_design
            && self.price_max == other.price_max
            && self.on_sale_only == other.on_sale_only
            && self.new_only == other.new_only
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_parse() {
        assert_eq!(Selection::<Shape>::parse(""), Selection::All);
        assert_eq!(Selection::<Shape>::parse("ALL"), Selection::All);
        assert_eq!(
            Selection::<Shape>::parse("round"),
            Selection::Only(Shape::Round)
        );
        assert_eq!(
            Selection::<Shape>::parse("hexagon"),
            Selection::Unrecognized("hexagon".to_string())
        );
    }

    #[test]
    fn test_selection_matching() {
        assert!(Selection::<Shape>::All.matches(None));
        assert!(Selection::Only(Shape::Round).matches(Some(Shape::Round)));
        assert!(!Selection::Only(Shape::Round).matches(Some(Shape::Oval)));
        assert!(!Selection::Only(Shape::Round).matches(None));
        assert!(!Selection::<Shape>::Unrecognized("x".into()).matches(Some(Shape::Round)));
    }

    #[test]
    fn test_selection_serde() {
        let json = serde_json::to_string(&Selection::Only(Shape::CatEye)).unwrap();
        assert_eq!(json, "\"cat-eye\"");
        let all: Selection<Shape> = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, Selection::All);
        assert_eq!(serde_json::to_string(&all).unwrap(), "\"all\"");
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!(SortKey::parse_or_default("price-asc"), SortKey::PriceAsc);
        assert_eq!(SortKey::parse_or_default("bogus"), SortKey::Popular);
    }

    #[test]
    fn test_same_filters_ignores_sort() {
        let a = FilterState::initial(Price::new(5_000_000));
        let mut b = a.clone();
        b.sort = SortKey::PriceDesc;
        assert!(a.same_filters(&b));
        b.new_only = true;
        assert!(!a.same_filters(&b));
    }
}
