//! Display projection of the active filters.
//!
//! The chip row, the active-filter badge and the "clear all" control are all
//! read from one [`FilterSummary`], so they can never disagree.

use optica_core::{FilterState, Price, Selection};
use serde::Serialize;

use super::browser::BrowseAction;

/// A filter field that can be shown as a chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterField {
    Category,
    Brand,
    Style,
    Material,
    FrameDesign,
    PriceMax,
    OnSale,
    New,
}

impl FilterField {
    /// Field caption shown before the value.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Category => "Danh mục",
            Self::Brand => "Thương hiệu",
            Self::Style => "Kiểu dáng",
            Self::Material => "Chất liệu",
            Self::FrameDesign => "Thiết kế gọng",
            Self::PriceMax => "Giá",
            Self::OnSale => "Khuyến mãi",
            Self::New => "Hàng mới",
        }
    }
}

/// One active filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterChip {
    pub field: FilterField,
    /// Human-readable value, e.g. `Tròn` or `≤ 2.000.000₫`.
    pub value: String,
    /// The action that removes this filter.
    #[serde(skip)]
    pub clear: BrowseAction,
}

/// Everything the page shows about which filters are active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSummary {
    pub chips: Vec<FilterChip>,
    pub active_count: usize,
    pub show_clear_all: bool,
}

impl FilterSummary {
    /// Project `filters` into chips. `ceiling` is the catalog's highest price;
    /// a price limit at or above it is not a constraint.
    #[must_use]
    pub fn project(filters: &FilterState, ceiling: Price) -> Self {
        let mut chips = Vec::new();

        push_selection(
            &mut chips,
            FilterField::Category,
            &filters.category,
            |c| c.label().to_string(),
            BrowseAction::SetCategory(Selection::All),
        );
        push_selection(
            &mut chips,
            FilterField::Brand,
            &filters.brand,
            String::clone,
            BrowseAction::SetBrand(Selection::All),
        );
        push_selection(
            &mut chips,
            FilterField::Style,
            &filters.style,
            |s| s.label().to_string(),
            BrowseAction::SetStyle(Selection::All),
        );
        push_selection(
            &mut chips,
            FilterField::Material,
            &filters.material,
            |m| m.label().to_string(),
            BrowseAction::SetMaterial(Selection::All),
        );
        push_selection(
            &mut chips,
            FilterField::FrameDesign,
            &filters.frame_design,
            |d| d.label().to_string(),
            BrowseAction::SetFrameDesign(Selection::All),
        );

        if filters.price_max < ceiling {
            chips.push(FilterChip {
                field: FilterField::PriceMax,
                value: format!("≤ {}", filters.price_max),
                clear: BrowseAction::SetPriceMax(ceiling),
            });
        }
        if filters.on_sale_only {
            chips.push(FilterChip {
                field: FilterField::OnSale,
                value: "Đang giảm giá".to_string(),
                clear: BrowseAction::SetOnSaleOnly(false),
            });
        }
        if filters.new_only {
            chips.push(FilterChip {
                field: FilterField::New,
                value: "Mới về".to_string(),
                clear: BrowseAction::SetNewOnly(false),
            });
        }

        let active_count = chips.len();
        Self {
            chips,
            active_count,
            show_clear_all: active_count > 0,
        }
    }
}

fn push_selection<T>(
    chips: &mut Vec<FilterChip>,
    field: FilterField,
    selection: &Selection<T>,
    label: impl FnOnce(&T) -> String,
    clear: BrowseAction,
) {
    let value = match selection {
        Selection::All => return,
        Selection::Only(value) => label(value),
        Selection::Unrecognized(raw) => raw.clone(),
    };
    chips.push(FilterChip {
        field,
        value,
        clear,
    });
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use optica_core::{Material, Shape};

    use super::*;

    const CEILING: Price = Price::new(6_500_000);

    #[test]
    fn test_initial_state_has_no_chips() {
        let summary = FilterSummary::project(&FilterState::initial(CEILING), CEILING);
        assert!(summary.chips.is_empty());
        assert_eq!(summary.active_count, 0);
        assert!(!summary.show_clear_all);
    }

    #[test]
    fn test_chips_follow_field_order() {
        let mut filters = FilterState::initial(CEILING);
        filters.new_only = true;
        filters.style = Selection::Only(Shape::Round);
        filters.price_max = Price::new(2_000_000);

        let summary = FilterSummary::project(&filters, CEILING);
        let fields: Vec<FilterField> = summary.chips.iter().map(|c| c.field).collect();
        assert_eq!(
            fields,
            vec![FilterField::Style, FilterField::PriceMax, FilterField::New]
        );
        assert_eq!(summary.active_count, 3);
        assert!(summary.show_clear_all);
        assert_eq!(summary.chips[1].value, "≤ 2.000.000₫");
        assert_eq!(summary.chips[1].clear, BrowseAction::SetPriceMax(CEILING));
    }

    #[test]
    fn test_sort_is_not_a_filter() {
        let mut filters = FilterState::initial(CEILING);
        filters.sort = optica_core::SortKey::PriceDesc;
        assert_eq!(FilterSummary::project(&filters, CEILING).active_count, 0);
    }

    #[test]
    fn test_unrecognized_value_shows_raw_slug() {
        let mut filters = FilterState::initial(CEILING);
        filters.material = Selection::<Material>::Unrecognized("wood".to_string());
        let summary = FilterSummary::project(&filters, CEILING);
        assert_eq!(summary.chips[0].value, "wood");
        assert_eq!(
            summary.chips[0].clear,
            BrowseAction::SetMaterial(Selection::All)
        );
    }
}
