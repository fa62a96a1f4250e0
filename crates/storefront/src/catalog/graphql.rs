//! Catalog loaded from the GraphQL backend.
//!
//! The whole list is fetched in one operation and cached for five minutes.
//! Records that cannot be mapped are logged and skipped so one bad product
//! does not empty the shop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use optica_core::{Category, FrameDesign, Material, Price, Product, ProductId, Shape};
use tracing::instrument;

use super::{CatalogError, CatalogSource};
use crate::backend::GraphqlClient;
use crate::backend::queries::{NoVariables, PRODUCTS, PRODUCTS_OPERATION, ProductNode, ProductsData};

const CACHE_TTL: Duration = Duration::from_secs(300);
const CACHE_KEY: &str = "products";

/// Backend-backed catalog with an in-memory cache.
#[derive(Clone)]
pub struct GraphqlCatalog {
    client: GraphqlClient,
    cache: Cache<&'static str, Arc<Vec<Product>>>,
}

impl GraphqlCatalog {
    #[must_use]
    pub fn new(client: GraphqlClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(CACHE_TTL)
            .build();
        Self { client, cache }
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Vec<Product>, CatalogError> {
        let data: ProductsData = self
            .client
            .execute(PRODUCTS_OPERATION, PRODUCTS, NoVariables {})
            .await?;

        let mut products = Vec::with_capacity(data.products.len());
        for node in data.products {
            match convert_product(node) {
                Ok(product) => products.push(product),
                Err(e) => tracing::warn!(error = %e, "Skipping catalog record"),
            }
        }
        tracing::debug!(count = products.len(), "Catalog fetched");
        Ok(products)
    }
}

#[async_trait]
impl CatalogSource for GraphqlCatalog {
    async fn products(&self) -> Result<Arc<Vec<Product>>, CatalogError> {
        if let Some(products) = self.cache.get(&CACHE_KEY).await {
            return Ok(products);
        }
        let products = Arc::new(self.fetch().await?);
        self.cache.insert(CACHE_KEY, Arc::clone(&products)).await;
        Ok(products)
    }
}

/// Map a backend record onto [`Product`] and check its invariants.
fn convert_product(node: ProductNode) -> Result<Product, CatalogError> {
    let slug = node.slug;
    let malformed = |reason: String| CatalogError::Malformed {
        slug: slug.clone(),
        reason,
    };

    let category = node
        .category
        .parse::<Category>()
        .map_err(|e| malformed(e.to_string()))?;
    let shape = parse_tag::<Shape>(node.shape.as_deref()).map_err(|e| malformed(e.to_string()))?;
    let material =
        parse_tag::<Material>(node.material.as_deref()).map_err(|e| malformed(e.to_string()))?;
    let frame_design = parse_tag::<FrameDesign>(node.frame_design.as_deref())
        .map_err(|e| malformed(e.to_string()))?;

    let product = Product {
        id: ProductId::new(node.id),
        slug,
        name: node.name,
        brand: node.brand,
        category,
        price: Price::new(node.price),
        original_price: node.original_price.map(Price::new),
        rating: node.rating,
        review_count: node.review_count,
        shape,
        material,
        frame_design,
        is_on_sale: node.is_on_sale,
        is_new: node.is_new,
        is_hot_deal: node.is_hot_deal,
        features: node.features,
        colors: node.colors,
        description: node.description.filter(|d| !d.trim().is_empty()),
    };
    product.validate()?;
    Ok(product)
}

/// Parse an optional tag; empty strings count as absent.
fn parse_tag<T: std::str::FromStr>(raw: Option<&str>) -> Result<Option<T>, T::Err> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(slug) => slug.parse().map(Some),
    }
}
