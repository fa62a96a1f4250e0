//! Product catalog.
//!
//! - [`CatalogSource`] supplies the full product list, either the built-in
//!   seed ([`StaticCatalog`]) or the GraphQL backend ([`GraphqlCatalog`])
//! - [`engine`] holds the pure filter / sort / paginate functions
//! - [`CatalogBrowser`] is the per-request browsing state derived from the
//!   query string

pub mod browser;
pub mod engine;
mod graphql;
pub mod seed;
pub mod summary;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use optica_core::{Product, ProductError, ProductId};
use thiserror::Error;

use crate::backend::BackendError;

pub use browser::{
    BrowseAction, BrowseQuery, CatalogBrowser, CatalogView, ChipLink, Facet, FacetOption,
};
pub use graphql::GraphqlCatalog;
pub use summary::{FilterChip, FilterField, FilterSummary};

/// Errors loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The backend could not be reached or answered with an error.
    #[error("catalog backend error: {0}")]
    Backend(#[from] BackendError),

    /// A record violates a product invariant.
    #[error("invalid product: {0}")]
    Invalid(#[from] ProductError),

    /// A record could not be mapped onto the product shape.
    #[error("malformed product '{slug}': {reason}")]
    Malformed {
        /// Slug of the offending record.
        slug: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Two records share a slug.
    #[error("duplicate product slug '{0}'")]
    DuplicateSlug(String),
}

/// Where the product list comes from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// The full catalog, in display order.
    async fn products(&self) -> Result<Arc<Vec<Product>>, CatalogError>;
}

/// A fixed, validated product list.
pub struct StaticCatalog {
    products: Arc<Vec<Product>>,
}

impl StaticCatalog {
    /// Validate `products` and wrap them.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` for a record that breaks a product
    /// invariant and `CatalogError::DuplicateSlug` for a repeated slug.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut slugs = HashSet::new();
        for product in &products {
            product.validate()?;
            if !slugs.insert(product.slug.as_str()) {
                return Err(CatalogError::DuplicateSlug(product.slug.clone()));
            }
        }
        Ok(Self {
            products: Arc::new(products),
        })
    }

    /// The built-in seed catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the seed data is inconsistent.
    pub fn seeded() -> Result<Self, CatalogError> {
        Self::new(seed::products())
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn products(&self) -> Result<Arc<Vec<Product>>, CatalogError> {
        Ok(Arc::clone(&self.products))
    }
}

/// Look up a product by URL slug.
#[must_use]
pub fn find_by_slug<'a>(products: &'a [Product], slug: &str) -> Option<&'a Product> {
    products.iter().find(|p| p.slug == slug)
}

/// Look up a product by id.
#[must_use]
pub fn find_by_id(products: &[Product], id: ProductId) -> Option<&Product> {
    products.iter().find(|p| p.id == id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use optica_core::Price;

    use super::*;

    #[tokio::test]
    async fn test_seeded_catalog_loads() {
        let catalog = StaticCatalog::seeded().unwrap();
        let products = catalog.products().await.unwrap();
        assert_eq!(products.len(), seed::products().len());
        assert!(find_by_slug(&products, "hoya-bluecontrol-160").is_some());
        assert!(find_by_id(&products, ProductId::new(1)).is_some());
        assert!(find_by_slug(&products, "missing").is_none());
    }

    #[test]
    fn test_rejects_invalid_record() {
        let mut products = seed::products();
        if let Some(first) = products.first_mut() {
            first.original_price = Some(Price::new(1));
        }
        assert!(matches!(
            StaticCatalog::new(products),
            Err(CatalogError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_slug() {
        let mut products = seed::products();
        let copy = products.first().cloned().unwrap();
        products.push(copy);
        assert!(matches!(
            StaticCatalog::new(products),
            Err(CatalogError::DuplicateSlug(_))
        ));
    }
}
