//! Catalog browsing state: the active filters plus the visible-count cursor.
//!
//! All state changes go through [`CatalogBrowser::apply`]. Any change to a
//! narrowing field resets the cursor to [`PAGE_SIZE`]; changing only the sort
//! order keeps it. Page links (chips, facets, "load more") are produced by
//! applying an action to a copy of the current state and serializing the
//! result, so a link can never skip the reset.

use optica_core::{
    Category, FilterState, FrameDesign, Material, Price, Product, Selection, Shape, SortKey,
};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::engine::{self, PAGE_SIZE};
use super::summary::FilterSummary;

/// Base path of the listing page.
const LISTING_PATH: &str = "/products";

/// Price-limit presets offered as facet options.
const PRICE_STEPS: &[u64] = &[1_000_000, 2_000_000, 3_000_000, 5_000_000];

/// A discrete user action on the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseAction {
    SetCategory(Selection<Category>),
    SetBrand(Selection<String>),
    SetStyle(Selection<Shape>),
    SetMaterial(Selection<Material>),
    SetFrameDesign(Selection<FrameDesign>),
    SetPriceMax(Price),
    SetOnSaleOnly(bool),
    SetNewOnly(bool),
    SetSort(SortKey),
    /// Show another page; `total` is the current result length.
    LoadMore { total: usize },
    /// Back to the initial state.
    ClearAll,
}

/// Raw query parameters of the listing page and the JSON catalog endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseQuery {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub style: Option<String>,
    pub material: Option<String>,
    pub design: Option<String>,
    pub price_max: Option<String>,
    pub sale: Option<String>,
    pub new: Option<String>,
    pub sort: Option<String>,
    pub show: Option<String>,
}

/// Filter state and pagination cursor for one listing view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogBrowser {
    filters: FilterState,
    visible: usize,
    ceiling: Price,
}

impl CatalogBrowser {
    /// Fresh state for a catalog whose most expensive item costs `ceiling`.
    #[must_use]
    pub fn new(ceiling: Price) -> Self {
        Self {
            filters: FilterState::initial(ceiling),
            visible: PAGE_SIZE,
            ceiling,
        }
    }

    /// Rebuild state from query parameters. Unknown tag values are kept as
    /// unrecognized selections; malformed numbers fall back to defaults.
    #[must_use]
    pub fn from_query(query: &BrowseQuery, ceiling: Price) -> Self {
        let mut filters = FilterState::initial(ceiling);
        if let Some(raw) = &query.category {
            filters.category = Selection::parse(raw);
        }
        if let Some(raw) = &query.brand {
            filters.brand = Selection::parse(raw);
        }
        if let Some(raw) = &query.style {
            filters.style = Selection::parse(raw);
        }
        if let Some(raw) = &query.material {
            filters.material = Selection::parse(raw);
        }
        if let Some(raw) = &query.design {
            filters.frame_design = Selection::parse(raw);
        }
        if let Some(limit) = query
            .price_max
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
        {
            filters.price_max = Price::new(limit).min(ceiling);
        }
        filters.on_sale_only = query.sale.as_deref().is_some_and(is_truthy);
        filters.new_only = query.new.as_deref().is_some_and(is_truthy);
        if let Some(raw) = &query.sort {
            filters.sort = SortKey::parse_or_default(raw);
        }

        let visible = query
            .show
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .map_or(PAGE_SIZE, |n| n.max(PAGE_SIZE));

        Self {
            filters,
            visible,
            ceiling,
        }
    }

    /// Current filters.
    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Number of items requested for display.
    #[must_use]
    pub const fn visible(&self) -> usize {
        self.visible
    }

    /// The catalog's highest price.
    #[must_use]
    pub const fn ceiling(&self) -> Price {
        self.ceiling
    }

    /// Apply one action.
    pub fn apply(&mut self, action: BrowseAction) {
        let before = self.filters.clone();
        match action {
            BrowseAction::SetCategory(value) => self.filters.category = value,
            BrowseAction::SetBrand(value) => self.filters.brand = value,
            BrowseAction::SetStyle(value) => self.filters.style = value,
            BrowseAction::SetMaterial(value) => self.filters.material = value,
            BrowseAction::SetFrameDesign(value) => self.filters.frame_design = value,
            BrowseAction::SetPriceMax(limit) => self.filters.price_max = limit.min(self.ceiling),
            BrowseAction::SetOnSaleOnly(on) => self.filters.on_sale_only = on,
            BrowseAction::SetNewOnly(on) => self.filters.new_only = on,
            BrowseAction::SetSort(key) => self.filters.sort = key,
            BrowseAction::LoadMore { total } => {
                self.visible = engine::next_visible(self.visible, total);
                return;
            }
            BrowseAction::ClearAll => {
                self.filters = FilterState::initial(self.ceiling);
                self.visible = PAGE_SIZE;
                return;
            }
        }
        if !self.filters.same_filters(&before) {
            self.visible = PAGE_SIZE;
        }
    }

    /// A copy with `action` applied.
    #[must_use]
    pub fn with(&self, action: BrowseAction) -> Self {
        let mut next = self.clone();
        next.apply(action);
        next
    }

    /// Query string for this state; defaults are omitted.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        let f = &self.filters;
        let selections = [
            ("category", f.category.slug()),
            ("brand", f.brand.slug()),
            ("style", f.style.slug()),
            ("material", f.material.slug()),
            ("design", f.frame_design.slug()),
        ];
        for (key, slug) in selections {
            if let Some(slug) = slug {
                out.append_pair(key, &slug);
            }
        }
        if f.price_max < self.ceiling {
            out.append_pair("price_max", &f.price_max.amount().to_string());
        }
        if f.on_sale_only {
            out.append_pair("sale", "1");
        }
        if f.new_only {
            out.append_pair("new", "1");
        }
        if f.sort != SortKey::default() {
            out.append_pair("sort", f.sort.slug());
        }
        if self.visible != PAGE_SIZE {
            out.append_pair("show", &self.visible.to_string());
        }
        out.finish()
    }

    /// Listing URL for this state.
    #[must_use]
    pub fn href(&self) -> String {
        let query = self.to_query();
        if query.is_empty() {
            LISTING_PATH.to_string()
        } else {
            format!("{LISTING_PATH}?{query}")
        }
    }

    /// Link to the state reached by `action`.
    #[must_use]
    pub fn link(&self, action: BrowseAction) -> String {
        self.with(action).href()
    }

    /// Derive everything one render needs from `products`.
    #[must_use]
    pub fn view<'a>(&self, products: &'a [Product]) -> CatalogView<'a> {
        let filtered = engine::apply_filters(products, &self.filters);
        let sorted = engine::sort_products(&filtered, self.filters.sort);
        let total = sorted.len();
        let items = engine::paginate(&sorted, self.visible).to_vec();
        let shown = items.len();
        let summary = FilterSummary::project(&self.filters, self.ceiling);

        let chips = summary
            .chips
            .iter()
            .map(|chip| ChipLink {
                label: format!("{}: {}", chip.field.label(), chip.value),
                href: self.link(chip.clear.clone()),
            })
            .collect();

        CatalogView {
            items,
            total,
            shown,
            has_more: shown < total,
            load_more_href: (shown < total).then(|| self.link(BrowseAction::LoadMore { total })),
            clear_all_href: self.link(BrowseAction::ClearAll),
            chips,
            summary,
        }
    }

    /// Facet groups with one link per option.
    #[must_use]
    pub fn facets(&self, brands: &[String]) -> Vec<Facet> {
        let f = &self.filters;
        let mut facets = vec![
            self.facet(
                "Danh mục",
                &f.category,
                Category::ALL.iter().map(|c| (*c, c.label().to_string())),
                BrowseAction::SetCategory,
            ),
            self.facet_by(
                "Thương hiệu",
                &f.brand,
                brands.iter().map(|b| (b.clone(), b.clone())),
                BrowseAction::SetBrand,
                |current, option| engine::same_brand(current, option),
            ),
            self.facet(
                "Kiểu dáng",
                &f.style,
                Shape::ALL.iter().map(|s| (*s, s.label().to_string())),
                BrowseAction::SetStyle,
            ),
            self.facet(
                "Chất liệu",
                &f.material,
                Material::ALL.iter().map(|m| (*m, m.label().to_string())),
                BrowseAction::SetMaterial,
            ),
            self.facet(
                "Thiết kế gọng",
                &f.frame_design,
                FrameDesign::ALL.iter().map(|d| (*d, d.label().to_string())),
                BrowseAction::SetFrameDesign,
            ),
        ];

        let mut prices = vec![FacetOption {
            label: "Tất cả".to_string(),
            href: self.link(BrowseAction::SetPriceMax(self.ceiling)),
            active: f.price_max >= self.ceiling,
        }];
        prices.extend(
            PRICE_STEPS
                .iter()
                .map(|step| Price::new(*step))
                .filter(|step| *step < self.ceiling)
                .map(|step| FacetOption {
                    label: format!("Dưới {step}"),
                    href: self.link(BrowseAction::SetPriceMax(step)),
                    active: f.price_max == step,
                }),
        );
        facets.push(Facet {
            title: "Khoảng giá",
            options: prices,
        });

        facets.push(Facet {
            title: "Ưu đãi",
            options: vec![
                FacetOption {
                    label: "Đang giảm giá".to_string(),
                    href: self.link(BrowseAction::SetOnSaleOnly(!f.on_sale_only)),
                    active: f.on_sale_only,
                },
                FacetOption {
                    label: "Mới về".to_string(),
                    href: self.link(BrowseAction::SetNewOnly(!f.new_only)),
                    active: f.new_only,
                },
            ],
        });
        facets
    }

    /// One link per sort order.
    #[must_use]
    pub fn sort_options(&self) -> Vec<FacetOption> {
        SortKey::ALL
            .iter()
            .map(|key| FacetOption {
                label: key.label().to_string(),
                href: self.link(BrowseAction::SetSort(*key)),
                active: self.filters.sort == *key,
            })
            .collect()
    }

    fn facet<T: PartialEq>(
        &self,
        title: &'static str,
        current: &Selection<T>,
        values: impl Iterator<Item = (T, String)>,
        action: impl Fn(Selection<T>) -> BrowseAction,
    ) -> Facet {
        self.facet_by(title, current, values, action, T::eq)
    }

    /// Like [`Self::facet`], with `same` deciding which option is active.
    fn facet_by<T>(
        &self,
        title: &'static str,
        current: &Selection<T>,
        values: impl Iterator<Item = (T, String)>,
        action: impl Fn(Selection<T>) -> BrowseAction,
        same: impl Fn(&T, &T) -> bool,
    ) -> Facet {
        let mut options = vec![FacetOption {
            label: "Tất cả".to_string(),
            href: self.link(action(Selection::All)),
            active: !current.is_active(),
        }];
        for (value, label) in values {
            let active = current.value().is_some_and(|selected| same(selected, &value));
            options.push(FacetOption {
                label,
                href: self.link(action(Selection::Only(value))),
                active,
            });
        }
        Facet { title, options }
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "true" | "on" | "yes")
}

/// Link that removes one active filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChipLink {
    pub label: String,
    pub href: String,
}

/// A titled group of filter options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    pub title: &'static str,
    pub options: Vec<FacetOption>,
}

/// One selectable option of a facet or the sort menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetOption {
    pub label: String,
    pub href: String,
    pub active: bool,
}

/// The derived result of one render.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogView<'a> {
    /// Items to show, already filtered, sorted and paginated.
    pub items: Vec<&'a Product>,
    /// Result length before pagination.
    pub total: usize,
    /// Number of items in `items`.
    pub shown: usize,
    pub has_more: bool,
    pub load_more_href: Option<String>,
    pub clear_all_href: String,
    pub chips: Vec<ChipLink>,
    pub summary: FilterSummary,
}

impl CatalogView<'_> {
    /// Whether the "no results" state should be shown.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }
}
