//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::backend::GraphqlClient;
use crate::catalog::{CatalogError, CatalogSource, GraphqlCatalog, StaticCatalog};
use crate::config::{CatalogSourceKind, GatewayKind, StorefrontConfig};
use crate::db::PgVoucherStore;
use crate::gateway::{AuthGateway, FakeGateway, GraphqlGateway};
use crate::services::auth::AuthFlow;
use crate::services::signals::AuthSignals;
use crate::trade_in::TradeInStore;
use crate::vouchers::{InMemoryVoucherStore, VoucherService, VoucherStore};

/// Error assembling application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("{0} is configured for GraphQL but GRAPHQL_ENDPOINT is not set")]
    MissingGraphql(&'static str),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the catalog, the auth flow, voucher claims and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    catalog: Arc<dyn CatalogSource>,
    auth: AuthFlow,
    signals: AuthSignals,
    vouchers: VoucherService,
    trade_ins: TradeInStore,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// Voucher claims go to `PostgreSQL` when `pool` is given and stay in
    /// memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if a GraphQL component lacks its endpoint or the
    /// static catalog is inconsistent.
    pub fn new(config: StorefrontConfig, pool: Option<PgPool>) -> Result<Self, StateError> {
        let client = config.graphql.as_ref().map(GraphqlClient::new);

        let catalog: Arc<dyn CatalogSource> = match config.catalog_source {
            CatalogSourceKind::Static => Arc::new(StaticCatalog::seeded()?),
            CatalogSourceKind::Graphql => Arc::new(GraphqlCatalog::new(
                client.clone().ok_or(StateError::MissingGraphql("CATALOG_SOURCE"))?,
            )),
        };

        let gateway: Arc<dyn AuthGateway> = match config.auth_gateway {
            GatewayKind::Fake => Arc::new(FakeGateway::new(config.otp_fake_delay)),
            GatewayKind::Graphql => Arc::new(GraphqlGateway::new(
                client.ok_or(StateError::MissingGraphql("AUTH_GATEWAY"))?,
            )),
        };

        let vouchers: Arc<dyn VoucherStore> = match &pool {
            Some(pool) => Arc::new(PgVoucherStore::new(pool.clone())),
            None => {
                tracing::warn!("No database configured; voucher claims are kept in memory");
                Arc::new(InMemoryVoucherStore::new())
            }
        };

        Ok(Self::from_parts(config, pool, catalog, gateway, vouchers))
    }

    /// Assemble state from explicit components.
    #[must_use]
    pub fn from_parts(
        config: StorefrontConfig,
        pool: Option<PgPool>,
        catalog: Arc<dyn CatalogSource>,
        gateway: Arc<dyn AuthGateway>,
        vouchers: Arc<dyn VoucherStore>,
    ) -> Self {
        let signals = AuthSignals::new();
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                auth: AuthFlow::new(gateway, signals.clone()),
                signals,
                vouchers: VoucherService::new(vouchers),
                trade_ins: TradeInStore::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the database pool, if one is configured.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn CatalogSource {
        self.inner.catalog.as_ref()
    }

    /// Get the phone-OTP auth flow.
    #[must_use]
    pub fn auth(&self) -> &AuthFlow {
        &self.inner.auth
    }

    /// Get the auth signal channel.
    #[must_use]
    pub fn signals(&self) -> &AuthSignals {
        &self.inner.signals
    }

    #[must_use]
    pub fn vouchers(&self) -> &VoucherService {
        &self.inner.vouchers
    }

    #[must_use]
    pub fn trade_ins(&self) -> &TradeInStore {
        &self.inner.trade_ins
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_local_state_uses_in_memory_components() {
        let state = AppState::new(StorefrontConfig::local(), None).unwrap();
        assert!(state.pool().is_none());
        assert_eq!(state.config().port, 3000);
    }

    #[test]
    fn test_graphql_without_endpoint_is_rejected() {
        let mut config = StorefrontConfig::local();
        config.auth_gateway = GatewayKind::Graphql;
        let err = AppState::new(config, None).err().unwrap();
        assert!(matches!(err, StateError::MissingGraphql("AUTH_GATEWAY")));
    }
}
