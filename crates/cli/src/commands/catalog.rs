//! Catalog inspection.
//!
//! Runs the storefront's filter and sort engine over the built-in seed
//! catalog, so a filter combination can be checked without a browser.

use optica_storefront::catalog::{
    BrowseQuery, CatalogBrowser, CatalogError, CatalogSource, StaticCatalog, engine,
};

/// Filters accepted by `catalog list`.
pub struct ListFilter {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub style: Option<String>,
    pub sort: String,
    pub limit: usize,
}

/// Print the products matching `filter`.
///
/// # Errors
///
/// Returns `CatalogError` if the seed catalog is inconsistent.
pub async fn list(filter: &ListFilter) -> Result<(), CatalogError> {
    let catalog = StaticCatalog::seeded()?;
    let products = catalog.products().await?;

    let query = BrowseQuery {
        category: filter.category.clone(),
        brand: filter.brand.clone(),
        style: filter.style.clone(),
        sort: Some(filter.sort.clone()),
        show: Some(filter.limit.to_string()),
        ..BrowseQuery::default()
    };
    let browser = CatalogBrowser::from_query(&query, engine::price_ceiling(&products));
    let view = browser.view(&products);

    #[allow(clippy::print_stdout)]
    {
        for product in view.items.iter().take(filter.limit) {
            println!(
                "{:>4}  {:<32} {:<14} {:>14}  {:.1}★",
                product.id,
                product.slug,
                product.brand,
                product.price.to_string(),
                product.rating
            );
        }
        println!(
            "{} of {} products",
            view.shown.min(filter.limit),
            view.total
        );
        for chip in &view.summary.chips {
            println!("  {}: {}", chip.field.label(), chip.value);
        }
    }
    Ok(())
}
