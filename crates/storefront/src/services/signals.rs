//! Auth publish/subscribe channel.
//!
//! Any page that needs a login publishes [`AuthSignal::OpenAuth`] instead of
//! opening the dialog itself; the auth flow publishes `LoggedIn` and
//! `LoggedOut`. One background listener records every signal in the logs and
//! as Sentry breadcrumbs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use optica_core::CustomerId;
use tokio::sync::broadcast;

/// Buffered signals per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSignal {
    /// A page asked for the login dialog.
    OpenAuth {
        redirect: Option<String>,
        prompt: Option<String>,
    },
    /// A customer finished the gate.
    LoggedIn {
        customer: CustomerId,
        redirect: Option<String>,
    },
    LoggedOut {
        customer: CustomerId,
    },
}

impl AuthSignal {
    const fn kind(&self) -> &'static str {
        match self {
            Self::OpenAuth { .. } => "open_auth",
            Self::LoggedIn { .. } => "logged_in",
            Self::LoggedOut { .. } => "logged_out",
        }
    }
}

/// Broadcast channel shared through `AppState`.
#[derive(Clone)]
pub struct AuthSignals {
    sender: broadcast::Sender<AuthSignal>,
    listening: Arc<AtomicBool>,
}

impl Default for AuthSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSignals {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Publish `signal` to every subscriber. Having none is not an error.
    pub fn publish(&self, signal: AuthSignal) {
        tracing::debug!(signal = signal.kind(), "Publishing auth signal");
        let _ = self.sender.send(signal);
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthSignal> {
        self.sender.subscribe()
    }

    /// Spawn the logging listener.
    ///
    /// Only the first call spawns; later calls return `false`. Must be called
    /// from within a Tokio runtime.
    pub fn spawn_listener(&self) -> bool {
        if self.listening.swap(true, Ordering::AcqRel) {
            return false;
        }

        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(signal) => record(&signal),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth signal listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        true
    }
}

fn record(signal: &AuthSignal) {
    match signal {
        AuthSignal::OpenAuth { redirect, prompt } => {
            tracing::info!(redirect = ?redirect, prompt = ?prompt, "Auth gate requested");
        }
        AuthSignal::LoggedIn { customer, redirect } => {
            tracing::info!(customer_id = %customer, redirect = ?redirect, "Customer logged in");
        }
        AuthSignal::LoggedOut { customer } => {
            tracing::info!(customer_id = %customer, "Customer logged out");
        }
    }
    crate::error::add_breadcrumb("auth", signal.kind(), None);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_published_signals() {
        let signals = AuthSignals::new();
        let mut rx = signals.subscribe();
        signals.publish(AuthSignal::OpenAuth {
            redirect: Some("/cart".to_string()),
            prompt: None,
        });
        assert_eq!(
            rx.recv().await.unwrap(),
            AuthSignal::OpenAuth {
                redirect: Some("/cart".to_string()),
                prompt: None,
            }
        );
    }

    #[tokio::test]
    async fn test_listener_spawns_once() {
        let signals = AuthSignals::new();
        let clone = signals.clone();
        assert!(signals.spawn_listener());
        assert!(!signals.spawn_listener());
        assert!(!clone.spawn_listener());
    }

    #[test]
    fn test_publish_without_subscribers() {
        AuthSignals::new().publish(AuthSignal::LoggedOut {
            customer: CustomerId::new(1),
        });
    }
}
