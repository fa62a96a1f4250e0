//! Pure filter, sort and pagination functions over an in-memory product list.
//!
//! None of these functions mutate their input or fail: an empty result is a
//! valid outcome, and an unrecognized filter value simply matches nothing.

use std::collections::BTreeSet;

use optica_core::{FilterState, Price, Product, SortKey};

/// Items shown before the first "load more".
pub const PAGE_SIZE: usize = 12;

/// Items added by each "load more".
pub const PAGE_INCREMENT: usize = 12;

/// Brand names compare without regard to case.
#[must_use]
pub fn same_brand(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Whether `product` satisfies every active field of `filters`.
#[must_use]
pub fn matches(product: &Product, filters: &FilterState) -> bool {
    filters.category.matches(Some(product.category))
        && filters
            .brand
            .matches_by(Some(product.brand.as_str()), |wanted, brand| {
                same_brand(wanted, brand)
            })
        && filters.style.matches(product.shape)
        && filters.material.matches(product.material)
        && filters.frame_design.matches(product.frame_design)
        && product.price <= filters.price_max
        && (!filters.on_sale_only || product.is_on_sale)
        && (!filters.new_only || product.is_new)
}

/// Retain the products matching `filters`, preserving input order.
#[must_use]
pub fn apply_filters<'a>(products: &'a [Product], filters: &FilterState) -> Vec<&'a Product> {
    products.iter().filter(|p| matches(p, filters)).collect()
}

/// Return a new ordering of `filtered` by `key`.
///
/// Uses a stable sort, so equal keys keep their incoming order.
#[must_use]
pub fn sort_products<'a>(filtered: &[&'a Product], key: SortKey) -> Vec<&'a Product> {
    let mut sorted = filtered.to_vec();
    match key {
        SortKey::PriceAsc => sorted.sort_by_key(|p| p.price),
        SortKey::PriceDesc => sorted.sort_by(|a, b| b.price.cmp(&a.price)),
        SortKey::RatingDesc | SortKey::Popular => {
            sorted.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        }
        SortKey::NewestFirst => sorted.sort_by_key(|p| !p.is_new),
    }
    sorted
}

/// The first `visible` items of `sorted` (all of them if fewer).
#[must_use]
pub fn paginate<T>(sorted: &[T], visible: usize) -> &[T] {
    sorted.get(..visible.min(sorted.len())).unwrap_or(sorted)
}

/// Next visible count after a "load more", clamped to the result length.
#[must_use]
pub fn next_visible(current: usize, total: usize) -> usize {
    current.saturating_add(PAGE_INCREMENT).min(total)
}

/// Highest price in the catalog; the default price-slider ceiling.
#[must_use]
pub fn price_ceiling(products: &[Product]) -> Price {
    products
        .iter()
        .map(|p| p.price)
        .max()
        .unwrap_or(Price::ZERO)
}

/// Distinct brand names, alphabetically.
#[must_use]
pub fn brands(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .map(|p| p.brand.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashSet;

    use optica_core::{Category, ProductId, Selection, Shape};

    use super::*;
    use crate::catalog::seed;

    fn frame(id: i32, price: u64, shape: Shape) -> Product {
        Product {
            id: ProductId::new(id),
            slug: format!("frame-{id}"),
            name: format!("Frame {id}"),
            brand: "Optica".to_string(),
            category: Category::Frame,
            price: Price::new(price),
            original_price: None,
            rating: 4.0,
            review_count: 0,
            shape: Some(shape),
            material: None,
            frame_design: None,
            is_on_sale: false,
            is_new: false,
            is_hot_deal: false,
            features: Vec::new(),
            colors: Vec::new(),
            description: None,
        }
    }

    fn ids(products: &[&Product]) -> Vec<i32> {
        products.iter().map(|p| p.id.as_i32()).collect()
    }

    fn all_filter_states(catalog: &[Product]) -> Vec<FilterState> {
        let ceiling = price_ceiling(catalog);
        let mut states = vec![FilterState::initial(ceiling)];
        for shape in Shape::ALL {
            let mut f = FilterState::initial(ceiling);
            f.style = Selection::Only(*shape);
            states.push(f);
        }
        for brand in brands(catalog) {
            let mut f = FilterState::initial(ceiling);
            f.brand = Selection::Only(brand.to_uppercase());
            f.price_max = Price::new(2_000_000);
            states.push(f);
        }
        let mut f = FilterState::initial(ceiling);
        f.on_sale_only = true;
        f.new_only = true;
        states.push(f);
        let mut f = FilterState::initial(ceiling);
        f.style = Selection::Unrecognized("hexagon".to_string());
        states.push(f);
        states
    }

    #[test]
    fn test_round_frames_under_ceiling() {
        let catalog = vec![
            frame(1, 1_800_000, Shape::Round),
            frame(2, 2_500_000, Shape::Round),
            frame(3, 900_000, Shape::Square),
        ];
        let mut filters = FilterState::initial(price_ceiling(&catalog));
        filters.style = Selection::Only(Shape::Round);
        filters.price_max = Price::new(2_000_000);

        let result = apply_filters(&catalog, &filters);
        assert_eq!(ids(&result), vec![1]);
    }

    #[test]
    fn test_price_asc_order() {
        let catalog = vec![
            frame(1, 2_500_000, Shape::Round),
            frame(2, 800_000, Shape::Round),
            frame(3, 1_600_000, Shape::Round),
        ];
        let all: Vec<&Product> = catalog.iter().collect();
        let sorted = sort_products(&all, SortKey::PriceAsc);
        let prices: Vec<u64> = sorted.iter().map(|p| p.price.amount()).collect();
        assert_eq!(prices, vec![800_000, 1_600_000, 2_500_000]);

        let sorted = sort_products(&all, SortKey::PriceDesc);
        assert_eq!(ids(&sorted), vec![1, 3, 2]);
    }

    #[test]
    fn test_brand_match_is_case_insensitive() {
        let mut catalog = vec![frame(1, 1_000_000, Shape::Oval)];
        catalog[0].brand = "Gentle Monster".to_string();
        let mut filters = FilterState::initial(price_ceiling(&catalog));
        filters.brand = Selection::Only("gentle monster".to_string());
        assert_eq!(apply_filters(&catalog, &filters).len(), 1);
        filters.brand = Selection::Only("Gentle".to_string());
        assert!(apply_filters(&catalog, &filters).is_empty());
    }

    #[test]
    fn test_unrecognized_filter_yields_empty_not_error() {
        let catalog = seed::products();
        let mut filters = FilterState::initial(price_ceiling(&catalog));
        filters.material = Selection::Unrecognized("wood".to_string());
        assert!(apply_filters(&catalog, &filters).is_empty());
    }

    #[test]
    fn test_lens_without_shape_never_matches_shape_filter() {
        let catalog = seed::products();
        let mut filters = FilterState::initial(price_ceiling(&catalog));
        filters.style = Selection::Only(Shape::Round);
        assert!(
            apply_filters(&catalog, &filters)
                .iter()
                .all(|p| p.category != Category::Lens)
        );
    }

    #[test]
    fn test_filter_is_an_order_preserving_subset() {
        let catalog = seed::products();
        for filters in all_filter_states(&catalog) {
            let result = apply_filters(&catalog, &filters);
            let mut last_index = None;
            let mut seen = HashSet::new();
            for product in &result {
                let index = catalog.iter().position(|p| p.id == product.id).unwrap();
                assert!(last_index.is_none_or(|last| index > last));
                assert!(seen.insert(product.id));
                last_index = Some(index);
            }
        }
    }

    #[test]
    fn test_filter_is_idempotent() {
        let catalog = seed::products();
        for filters in all_filter_states(&catalog) {
            let once = ids(&apply_filters(&catalog, &filters));
            let twice = ids(&apply_filters(&catalog, &filters));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_sort_is_a_permutation() {
        let catalog = seed::products();
        let all: Vec<&Product> = catalog.iter().collect();
        for key in SortKey::ALL {
            let sorted = sort_products(&all, *key);
            let mut before = ids(&all);
            let mut after = ids(&sorted);
            before.sort_unstable();
            after.sort_unstable();
            assert_eq!(before, after, "{key:?}");
        }
    }

    #[test]
    fn test_rating_ties_keep_catalog_order() {
        let catalog: Vec<Product> = (1..=8)
            .map(|id| {
                let mut p = frame(id, 1_000_000, Shape::Round);
                p.rating = if id % 2 == 0 { 4.8 } else { 4.5 };
                p
            })
            .collect();
        let all: Vec<&Product> = catalog.iter().collect();
        let sorted = sort_products(&all, SortKey::RatingDesc);
        assert_eq!(ids(&sorted), vec![2, 4, 6, 8, 1, 3, 5, 7]);
    }

    #[test]
    fn test_popular_ties_keep_catalog_order() {
        let mut a = frame(1, 1_000_000, Shape::Round);
        let mut b = frame(2, 1_000_000, Shape::Round);
        let mut c = frame(3, 1_000_000, Shape::Round);
        a.rating = 4.7;
        b.rating = 4.7;
        c.rating = 4.7;
        a.review_count = 10;
        b.review_count = 50;
        c.review_count = 10;
        let catalog = vec![a, b, c];
        let all: Vec<&Product> = catalog.iter().collect();
        assert_eq!(ids(&sort_products(&all, SortKey::Popular)), vec![1, 2, 3]);
    }

    #[test]
    fn test_newest_first_partitions_stably() {
        let catalog: Vec<Product> = (1..=5)
            .map(|id| {
                let mut p = frame(id, 1_000_000, Shape::Round);
                p.is_new = id == 2 || id == 5;
                p
            })
            .collect();
        let all: Vec<&Product> = catalog.iter().collect();
        assert_eq!(
            ids(&sort_products(&all, SortKey::NewestFirst)),
            vec![2, 5, 1, 3, 4]
        );
    }

    #[test]
    fn test_sort_does_not_mutate_input() {
        let catalog = vec![
            frame(1, 3_000_000, Shape::Round),
            frame(2, 1_000_000, Shape::Round),
        ];
        let all: Vec<&Product> = catalog.iter().collect();
        let _ = sort_products(&all, SortKey::PriceAsc);
        assert_eq!(ids(&all), vec![1, 2]);
    }

    #[test]
    fn test_paginate_length_and_prefix() {
        let items: Vec<u32> = (0..30).collect();
        for n in 0..40 {
            let page = paginate(&items, n);
            assert_eq!(page.len(), n.min(items.len()));
            let longer = paginate(&items, n + PAGE_INCREMENT);
            assert_eq!(&longer[..page.len()], page);
        }
    }

    #[test]
    fn test_next_visible_clamps() {
        assert_eq!(next_visible(PAGE_SIZE, 30), 24);
        assert_eq!(next_visible(24, 30), 30);
        assert_eq!(next_visible(30, 30), 30);
        assert_eq!(next_visible(PAGE_SIZE, 5), 5);
    }

    #[test]
    fn test_brands_are_unique_and_sorted() {
        let catalog = seed::products();
        let brands = brands(&catalog);
        let mut sorted = brands.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(brands, sorted);
    }
}
