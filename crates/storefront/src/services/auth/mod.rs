//! Phone-OTP authentication.
//!
//! [`AuthGate`] is the pure state machine kept in the session; [`AuthFlow`]
//! drives it against an [`AuthGateway`].
//!
//! # Concurrency
//!
//! - One request per phone number may be outstanding at a time. A second
//!   submission while the first is in flight fails with
//!   [`AuthGateError::InFlight`] and changes nothing.
//! - The [`GateRegistry`] remembers the live generation of every open gate.
//!   Closing or reopening a gate retires its entry, so a response that
//!   arrives afterwards settles as [`Settled::Stale`] and the caller must not
//!   write it back to the session.

mod cooldown;
mod error;
mod gate;

pub use cooldown::{RESEND_COOLDOWN_SECS, ResendCooldown};
pub use error::{AuthGateError, RegistrationErrors};
pub use gate::{
    AuthGate, CompleteTicket, GateRef, GateStep, SendTicket, VerifyTicket, sanitize_redirect,
};

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;
use optica_core::{CustomerId, Email, PhoneNumber};
use uuid::Uuid;

use crate::gateway::{AuthGateway, CustomerProfile, GatewayError, NewCustomer, OtpDispatch, OtpVerdict};
use crate::services::signals::{AuthSignal, AuthSignals};

/// How long an untouched gate stays live.
const GATE_TTL: Duration = Duration::from_secs(15 * 60);

const MAX_OPEN_GATES: u64 = 100_000;

const FULL_NAME_MAX_CHARS: usize = 100;

/// Whether a settled request still belongs to the live gate.
#[derive(Debug)]
pub enum Settled<T> {
    /// Apply the result and save the gate.
    Current(T),
    /// The gate was closed or reopened meanwhile; drop the result.
    Stale,
}

/// What the caller should show next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Still inside the dialog.
    Pending,
    /// Phone verified but unknown; show the registration form.
    Register,
    /// The gate closed with a logged-in customer.
    LoggedIn {
        customer: CustomerProfile,
        redirect: Option<String>,
    },
}

/// Raw registration form fields.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationInput<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
}

impl RegistrationInput<'_> {
    /// Validate the form for the verified `phone`.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn validate(&self, phone: PhoneNumber) -> Result<NewCustomer, RegistrationErrors> {
        let mut errors = RegistrationErrors::default();

        let full_name = self.full_name.split_whitespace().collect::<Vec<_>>().join(" ");
        if full_name.is_empty() {
            errors.full_name = Some("Vui lòng nhập họ tên");
        } else if full_name.chars().count() > FULL_NAME_MAX_CHARS {
            errors.full_name = Some("Họ tên quá dài");
        }

        let email = match self.email.trim() {
            "" => None,
            raw => Email::parse(raw)
                .map_err(|_| errors.email = Some("Email không hợp lệ"))
                .ok(),
        };

        if errors.is_empty() {
            Ok(NewCustomer {
                phone,
                full_name,
                email,
            })
        } else {
            Err(errors)
        }
    }
}

/// Live generation of every open gate, keyed by gate id.
#[derive(Clone)]
pub struct GateRegistry {
    generations: Cache<Uuid, u64>,
}

impl Default for GateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GateRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            generations: Cache::builder()
                .max_capacity(MAX_OPEN_GATES)
                .time_to_live(GATE_TTL)
                .build(),
        }
    }

    /// Start tracking a newly opened gate.
    pub fn register(&self, gate: GateRef) {
        self.generations.insert(gate.id, gate.generation);
    }

    /// Extend the lifetime of `gate` if it is still live.
    ///
    /// Never revives a retired gate.
    pub fn touch(&self, gate: GateRef) -> bool {
        if self.is_current(gate) {
            self.generations.insert(gate.id, gate.generation);
            true
        } else {
            false
        }
    }

    pub fn retire(&self, id: Uuid) {
        self.generations.invalidate(&id);
    }

    #[must_use]
    pub fn is_current(&self, gate: GateRef) -> bool {
        self.generations.get(&gate.id) == Some(gate.generation)
    }
}

/// Phone numbers with a request outstanding.
#[derive(Clone, Default)]
struct InFlight {
    phones: Arc<Mutex<HashSet<PhoneNumber>>>,
}

impl InFlight {
    fn acquire(&self, phone: &PhoneNumber) -> Result<InFlightGuard, AuthGateError> {
        let mut phones = self.phones.lock().unwrap_or_else(PoisonError::into_inner);
        if !phones.insert(phone.clone()) {
            return Err(AuthGateError::InFlight);
        }
        Ok(InFlightGuard {
            phones: Arc::clone(&self.phones),
            phone: phone.clone(),
        })
    }
}

/// Releases the phone number when the request settles.
struct InFlightGuard {
    phones: Arc<Mutex<HashSet<PhoneNumber>>>,
    phone: PhoneNumber,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.phones
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.phone);
    }
}

/// Drives [`AuthGate`]s against the gateway.
#[derive(Clone)]
pub struct AuthFlow {
    gateway: Arc<dyn AuthGateway>,
    gates: GateRegistry,
    in_flight: InFlight,
    signals: AuthSignals,
}

impl AuthFlow {
    #[must_use]
    pub fn new(gateway: Arc<dyn AuthGateway>, signals: AuthSignals) -> Self {
        Self {
            gateway,
            gates: GateRegistry::new(),
            in_flight: InFlight::default(),
            signals,
        }
    }

    /// Open a new gate, retiring `previous` if there was one.
    pub fn open(
        &self,
        previous: Option<&AuthGate>,
        redirect: Option<&str>,
        prompt: Option<&str>,
        now: DateTime<Utc>,
    ) -> AuthGate {
        if let Some(previous) = previous {
            self.gates.retire(previous.id());
        }
        let gate = AuthGate::open(redirect, prompt, now);
        self.gates.register(gate.gate_ref());
        self.signals.publish(AuthSignal::OpenAuth {
            redirect: gate.redirect().map(str::to_string),
            prompt: gate.prompt().map(str::to_string),
        });
        gate
    }

    /// Whether `gate` is open and still the live generation.
    #[must_use]
    pub fn is_current(&self, gate: &AuthGate) -> bool {
        gate.is_open() && self.gates.is_current(gate.gate_ref())
    }

    /// Phone step: validate, check existence and send the first code.
    ///
    /// # Errors
    ///
    /// See [`AuthGateError`]. Gateway failures are recorded on the gate and
    /// settle as `Current(Pending)`.
    #[tracing::instrument(skip_all, fields(gate = %gate.id()))]
    pub async fn submit_phone(
        &self,
        gate: &mut AuthGate,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<Settled<GateOutcome>, AuthGateError> {
        let ticket = gate.submit_phone(raw)?;
        self.send(gate, &ticket, now).await
    }

    /// Ask for a fresh code once the cooldown has run out.
    ///
    /// # Errors
    ///
    /// See [`AuthGateError`].
    #[tracing::instrument(skip_all, fields(gate = %gate.id()))]
    pub async fn resend(
        &self,
        gate: &mut AuthGate,
        now: DateTime<Utc>,
    ) -> Result<Settled<GateOutcome>, AuthGateError> {
        let ticket = gate.request_resend(now)?;
        self.send(gate, &ticket, now).await
    }

    async fn send(
        &self,
        gate: &mut AuthGate,
        ticket: &SendTicket,
        now: DateTime<Utc>,
    ) -> Result<Settled<GateOutcome>, AuthGateError> {
        if !self.gates.touch(ticket.gate) {
            return Ok(Settled::Stale);
        }
        let _guard = self.in_flight.acquire(&ticket.phone)?;

        let result = self.request_code(ticket).await;
        if !self.gates.is_current(ticket.gate) {
            tracing::debug!("Discarding send result for a closed gate");
            return Ok(Settled::Stale);
        }

        match result {
            Ok((known, dispatch)) => gate.otp_sent(ticket, known, dispatch.dev_code, now)?,
            Err(e) => {
                log_gateway_failure(&e, "send OTP");
                gate.send_failed(ticket, e.user_message())?;
            }
        }
        Ok(Settled::Current(GateOutcome::Pending))
    }

    async fn request_code(&self, ticket: &SendTicket) -> Result<(bool, OtpDispatch), GatewayError> {
        let known = match ticket.known {
            Some(known) => known,
            None => self.gateway.check_phone_exists(&ticket.phone).await?,
        };
        let dispatch = self.gateway.send_otp(&ticket.phone).await?;
        Ok((known, dispatch))
    }

    /// Code step: verify, then log in a known customer or ask to register.
    ///
    /// # Errors
    ///
    /// See [`AuthGateError`]. A rejected code or gateway failure is recorded
    /// on the gate and settles as `Current(Pending)`.
    #[tracing::instrument(skip_all, fields(gate = %gate.id()))]
    pub async fn submit_otp(
        &self,
        gate: &mut AuthGate,
        raw: &str,
    ) -> Result<Settled<GateOutcome>, AuthGateError> {
        let ticket = gate.submit_otp(raw)?;
        if !self.gates.touch(ticket.gate) {
            return Ok(Settled::Stale);
        }
        let _guard = self.in_flight.acquire(&ticket.phone)?;

        let result = self.gateway.verify_otp(&ticket.phone, &ticket.code).await;
        if !self.gates.is_current(ticket.gate) {
            tracing::debug!("Discarding verify result for a closed gate");
            return Ok(Settled::Stale);
        }

        match result {
            Ok(OtpVerdict::Verified) => gate.otp_verified(&ticket)?,
            Ok(OtpVerdict::Rejected { message }) => {
                gate.otp_rejected(&ticket, message)?;
                return Ok(Settled::Current(GateOutcome::Pending));
            }
            Err(e) => {
                log_gateway_failure(&e, "verify OTP");
                gate.otp_rejected(&ticket, e.user_message())?;
                return Ok(Settled::Current(GateOutcome::Pending));
            }
        }

        if !ticket.known {
            return Ok(Settled::Current(GateOutcome::Register));
        }

        let login = gate.login_ticket()?;
        let result = self.gateway.login_customer(&login.phone).await;
        if !self.gates.is_current(login.gate) {
            return Ok(Settled::Stale);
        }
        match result {
            Ok(customer) => Ok(Settled::Current(self.finish(gate, customer))),
            Err(e) => {
                log_gateway_failure(&e, "log in customer");
                gate.login_failed(&login, e.user_message())?;
                Ok(Settled::Current(GateOutcome::Pending))
            }
        }
    }

    /// Registration step for a verified, unknown phone number.
    ///
    /// # Errors
    ///
    /// `WrongStep` unless the gate is in `NewRegistration`;
    /// `InvalidRegistration` with the field errors of a bad form.
    #[tracing::instrument(skip_all, fields(gate = %gate.id()))]
    pub async fn register(
        &self,
        gate: &mut AuthGate,
        input: RegistrationInput<'_>,
    ) -> Result<Settled<GateOutcome>, AuthGateError> {
        let ticket = gate.registration_ticket()?;
        let customer = input
            .validate(ticket.phone.clone())
            .map_err(AuthGateError::InvalidRegistration)?;
        if !self.gates.touch(ticket.gate) {
            return Ok(Settled::Stale);
        }
        let _guard = self.in_flight.acquire(&ticket.phone)?;

        let result = self.gateway.register_customer(customer).await;
        if !self.gates.is_current(ticket.gate) {
            return Ok(Settled::Stale);
        }
        match result {
            Ok(customer) => Ok(Settled::Current(self.finish(gate, customer))),
            Err(e) => {
                log_gateway_failure(&e, "register customer");
                gate.registration_failed(&ticket, e.user_message())?;
                Ok(Settled::Current(GateOutcome::Pending))
            }
        }
    }

    /// Close the gate. Anything still in flight for it settles as stale.
    pub fn cancel(&self, gate: &mut AuthGate) -> Option<String> {
        self.gates.retire(gate.id());
        gate.close()
    }

    /// Announce that `customer` logged out.
    pub fn logout(&self, customer: CustomerId) {
        self.signals.publish(AuthSignal::LoggedOut { customer });
    }

    fn finish(&self, gate: &mut AuthGate, customer: CustomerProfile) -> GateOutcome {
        self.gates.retire(gate.id());
        let redirect = gate.close();
        self.signals.publish(AuthSignal::LoggedIn {
            customer: customer.id,
            redirect: redirect.clone(),
        });
        GateOutcome::LoggedIn { customer, redirect }
    }
}

fn log_gateway_failure(error: &GatewayError, action: &'static str) {
    if error.is_server_error() {
        tracing::error!(error = %error, action, "Auth gateway failure");
    } else {
        tracing::warn!(error = %error, action, "Auth gateway refused request");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use optica_core::OtpCode;

    use super::*;
    use crate::gateway::{DEMO_CUSTOMER_PHONE, FakeGateway, INCORRECT_OTP_MESSAGE};

    fn flow_with(gateway: FakeGateway) -> (AuthFlow, AuthSignals) {
        let signals = AuthSignals::new();
        (AuthFlow::new(Arc::new(gateway), signals.clone()), signals)
    }

    fn fixed() -> FakeGateway {
        FakeGateway::with_fixed_code(OtpCode::parse("1234").unwrap())
    }

    fn current<T>(settled: Settled<T>) -> T {
        match settled {
            Settled::Current(value) => value,
            Settled::Stale => panic!("expected a current result"),
        }
    }

    #[tokio::test]
    async fn test_known_phone_logs_in_after_wrong_then_right_code() {
        let (flow, signals) = flow_with(fixed());
        let mut rx = signals.subscribe();
        let now = Utc::now();
        let mut gate = flow.open(None, Some("/cart"), None, now);

        let outcome = current(
            flow.submit_phone(&mut gate, DEMO_CUSTOMER_PHONE, now)
                .await
                .unwrap(),
        );
        assert_eq!(outcome, GateOutcome::Pending);
        assert_eq!(gate.step().name(), "awaiting_otp");
        assert_eq!(gate.demo_code().unwrap().as_str(), "1234");

        let outcome = current(flow.submit_otp(&mut gate, "9999").await.unwrap());
        assert_eq!(outcome, GateOutcome::Pending);
        assert_eq!(gate.step().name(), "awaiting_otp");
        assert_eq!(gate.error(), Some(INCORRECT_OTP_MESSAGE));

        let outcome = current(flow.submit_otp(&mut gate, "1234").await.unwrap());
        let GateOutcome::LoggedIn { customer, redirect } = outcome else {
            panic!("expected login, got {outcome:?}");
        };
        assert_eq!(customer.id, CustomerId::new(1));
        assert_eq!(redirect.as_deref(), Some("/cart"));
        assert!(!gate.is_open());
        assert!(!flow.is_current(&gate));

        assert!(matches!(rx.recv().await.unwrap(), AuthSignal::OpenAuth { .. }));
        assert_eq!(
            rx.recv().await.unwrap(),
            AuthSignal::LoggedIn {
                customer: CustomerId::new(1),
                redirect: Some("/cart".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_phone_registers() {
        let (flow, _) = flow_with(fixed());
        let now = Utc::now();
        let mut gate = flow.open(None, None, None, now);
        current(flow.submit_phone(&mut gate, "0387654321", now).await.unwrap());

        let outcome = current(flow.submit_otp(&mut gate, "1234").await.unwrap());
        assert_eq!(outcome, GateOutcome::Register);
        assert_eq!(gate.step().name(), "new_registration");

        let err = flow
            .register(
                &mut gate,
                RegistrationInput {
                    full_name: "  ",
                    email: "nope",
                },
            )
            .await
            .unwrap_err();
        let AuthGateError::InvalidRegistration(errors) = err else {
            panic!("expected field errors");
        };
        assert!(errors.full_name.is_some());
        assert!(errors.email.is_some());

        let outcome = current(
            flow.register(
                &mut gate,
                RegistrationInput {
                    full_name: " Phạm   Thu  Hà ",
                    email: "",
                },
            )
            .await
            .unwrap(),
        );
        let GateOutcome::LoggedIn { customer, .. } = outcome else {
            panic!("expected login");
        };
        assert_eq!(customer.full_name, "Phạm Thu Hà");
        assert_eq!(customer.phone.as_str(), "0387654321");
    }

    #[tokio::test]
    async fn test_register_requires_verified_phone() {
        let (flow, _) = flow_with(fixed());
        let mut gate = flow.open(None, None, None, Utc::now());
        let err = flow
            .register(
                &mut gate,
                RegistrationInput {
                    full_name: "Người Lạ",
                    email: "",
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthGateError::WrongStep { .. }));
    }

    #[tokio::test]
    async fn test_late_response_after_cancel_is_stale() {
        let (flow, _) = flow_with(FakeGateway::new(Duration::from_millis(200)));
        let now = Utc::now();
        let mut gate = flow.open(None, None, None, now);

        let mut in_flight_copy = gate.clone();
        let background = flow.clone();
        let handle = tokio::spawn(async move {
            let settled = background
                .submit_phone(&mut in_flight_copy, DEMO_CUSTOMER_PHONE, now)
                .await;
            (settled, in_flight_copy)
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        flow.cancel(&mut gate);

        let (settled, _) = handle.await.unwrap();
        assert!(matches!(settled, Ok(Settled::Stale)));
        assert!(!gate.is_open());
    }

    #[tokio::test]
    async fn test_duplicate_submission_is_rejected_while_in_flight() {
        let (flow, _) = flow_with(FakeGateway::new(Duration::from_millis(200)));
        let now = Utc::now();
        let mut first = flow.open(None, None, None, now);
        let mut second = flow.open(None, None, None, now);

        let background = flow.clone();
        let handle = tokio::spawn(async move {
            background
                .submit_phone(&mut first, DEMO_CUSTOMER_PHONE, now)
                .await
                .map(|settled| matches!(settled, Settled::Current(GateOutcome::Pending)))
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        let err = flow
            .submit_phone(&mut second, DEMO_CUSTOMER_PHONE, now)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthGateError::InFlight));
        assert!(!err.is_recorded());

        assert!(handle.await.unwrap().unwrap());

        // Released once the first request settled
        let mut third = flow.open(None, None, None, now);
        assert!(
            flow.submit_phone(&mut third, DEMO_CUSTOMER_PHONE, now)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_reopen_retires_previous_gate() {
        let (flow, _) = flow_with(fixed());
        let now = Utc::now();
        let old = flow.open(None, None, None, now);
        let new = flow.open(Some(&old), None, None, now);
        assert!(!flow.is_current(&old));
        assert!(flow.is_current(&new));

        let mut stale = old;
        let settled = flow
            .submit_phone(&mut stale, DEMO_CUSTOMER_PHONE, now)
            .await
            .unwrap();
        assert!(matches!(settled, Settled::Stale));
    }

    #[tokio::test]
    async fn test_resend_waits_for_cooldown() {
        let gateway = FakeGateway::new(Duration::ZERO);
        let (flow, _) = flow_with(gateway.clone());
        let now = Utc::now();
        let mut gate = flow.open(None, None, None, now);
        current(flow.submit_phone(&mut gate, DEMO_CUSTOMER_PHONE, now).await.unwrap());

        let err = flow
            .resend(&mut gate, now + chrono::TimeDelta::seconds(30))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthGateError::CooldownActive(30)));
        assert_eq!(gateway.sent_count(), 1);

        let later = now + chrono::TimeDelta::seconds(60);
        current(flow.resend(&mut gate, later).await.unwrap());
        assert_eq!(gateway.sent_count(), 2);
        assert_eq!(gate.cooldown().remaining(), RESEND_COOLDOWN_SECS);

        // Only the latest code verifies
        let phone = PhoneNumber::parse(DEMO_CUSTOMER_PHONE).unwrap();
        let latest = gateway.last_code(&phone).unwrap();
        let outcome = current(flow.submit_otp(&mut gate, latest.as_str()).await.unwrap());
        assert!(matches!(outcome, GateOutcome::LoggedIn { .. }));
    }
}
