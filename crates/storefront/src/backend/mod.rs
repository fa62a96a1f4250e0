//! GraphQL commerce backend client.
//!
//! # Architecture
//!
//! - `graphql_client` supplies the request/response envelopes; HTTP goes
//!   through `reqwest` 0.13 directly
//! - Operations are plain query strings in [`queries`] with hand-written
//!   serde data types, so no schema file is needed at build time
//! - Callers (catalog source, auth gateway) own their own caching
//!
//! # Example
//!
//! ```rust,ignore
//! use optica_storefront::backend::{GraphqlClient, queries};
//!
//! let client = GraphqlClient::new(&config);
//! let data: queries::ProductsData = client
//!     .execute(queries::PRODUCTS_OPERATION, queries::PRODUCTS, queries::NoVariables {})
//!     .await?;
//! ```

mod client;
pub mod queries;

pub use client::GraphqlClient;

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("HTTP status {status}: {body}")]
    Status {
        /// Status code returned.
        status: u16,
        /// Start of the response body.
        body: String,
    },

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response carried neither data nor errors.
    #[error("empty response for {0}")]
    EmptyResponse(&'static str),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// A mutation reported a user-facing failure.
    #[error("User error: {0}")]
    UserError(String),
}

/// A GraphQL error returned by the backend.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(error: graphql_client::Error) -> Self {
        Self {
            message: error.message,
            locations: error.locations.map_or_else(Vec::new, |locs| {
                locs.into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: i64::from(l.line),
                        column: i64::from(l.column),
                    })
                    .collect()
            }),
            path: error.path.map_or_else(Vec::new, |p| {
                p.into_iter()
                    .map(|fragment| match fragment {
                        graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                        graphql_client::PathFragment::Index(i) => {
                            serde_json::Value::Number(i.into())
                        }
                    })
                    .collect()
            }),
        }
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
