//! HTTP transport for backend GraphQL operations.

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{QueryBody, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::{BackendError, GraphQLError};
use crate::config::GraphqlConfig;

/// Request timeout for every backend call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How much of an error body is kept for logs and error values.
const BODY_PREVIEW_CHARS: usize = 200;

/// Client for the commerce GraphQL endpoint.
#[derive(Clone)]
pub struct GraphqlClient {
    inner: Arc<GraphqlClientInner>,
}

struct GraphqlClientInner {
    client: reqwest::Client,
    endpoint: String,
    token: SecretString,
}

impl GraphqlClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &GraphqlConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            inner: Arc::new(GraphqlClientInner {
                client,
                endpoint: config.endpoint.clone(),
                token: config.token.clone(),
            }),
        }
    }

    /// Execute one operation and return its `data`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` for transport failures, non-success statuses,
    /// HTTP 429, unparseable bodies, GraphQL errors and empty responses.
    #[instrument(skip_all, fields(operation = operation_name))]
    pub async fn execute<V, D>(
        &self,
        operation_name: &'static str,
        query: &'static str,
        variables: V,
    ) -> Result<D, BackendError>
    where
        V: Serialize + Send,
        D: DeserializeOwned,
    {
        let request_body = QueryBody {
            variables,
            query,
            operation_name,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .bearer_auth(self.inner.token.expose_secret())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        // Read as text first so failures can be logged with the body
        let response_text = response.text().await?;

        if !status.is_success() {
            let body: String = response_text.chars().take(BODY_PREVIEW_CHARS).collect();
            tracing::error!(
                status = %status,
                body = %body,
                "Backend returned non-success status"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response: Response<D> = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(BODY_PREVIEW_CHARS).collect::<String>(),
                "Failed to parse GraphQL response"
            );
            BackendError::Parse(e)
        })?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, "GraphQL errors in response");
            return Err(BackendError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        response
            .data
            .ok_or(BackendError::EmptyResponse(operation_name))
    }
}
