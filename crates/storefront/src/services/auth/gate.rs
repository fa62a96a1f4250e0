//! Phone-OTP gate state machine.
//!
//! ```text
//! Idle -> CollectingPhone -> SendingOtp -> AwaitingOtp -> VerifyingOtp
//!                                  ^            |               |
//!                                  +--resend----+        +------+------+
//!                                                        v             v
//!                                               ExistingProfile  NewRegistration
//! ```
//!
//! The gate is plain data stored in the session. It never performs I/O:
//! each step that needs the gateway hands out a ticket, and the result is fed
//! back with that ticket. A ticket minted before the gate was closed carries
//! an old generation and is refused.

use chrono::{DateTime, Utc};
use optica_core::{OtpCode, PhoneNumber};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cooldown::ResendCooldown;
use super::error::AuthGateError;

/// Where the gate currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum GateStep {
    Idle,
    CollectingPhone,
    /// `known` is `None` until the existence check has run.
    SendingOtp {
        phone: PhoneNumber,
        known: Option<bool>,
    },
    AwaitingOtp {
        phone: PhoneNumber,
        known: bool,
    },
    VerifyingOtp {
        phone: PhoneNumber,
        known: bool,
    },
    ExistingProfile {
        phone: PhoneNumber,
    },
    NewRegistration {
        phone: PhoneNumber,
    },
}

impl GateStep {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CollectingPhone => "collecting_phone",
            Self::SendingOtp { .. } => "sending_otp",
            Self::AwaitingOtp { .. } => "awaiting_otp",
            Self::VerifyingOtp { .. } => "verifying_otp",
            Self::ExistingProfile { .. } => "existing_profile",
            Self::NewRegistration { .. } => "new_registration",
        }
    }

    #[must_use]
    pub const fn phone(&self) -> Option<&PhoneNumber> {
        match self {
            Self::Idle | Self::CollectingPhone => None,
            Self::SendingOtp { phone, .. }
            | Self::AwaitingOtp { phone, .. }
            | Self::VerifyingOtp { phone, .. }
            | Self::ExistingProfile { phone }
            | Self::NewRegistration { phone } => Some(phone),
        }
    }
}

/// Identity of one gate at one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GateRef {
    pub id: Uuid,
    pub generation: u64,
}

/// Permission to send a code for `phone`.
#[derive(Debug, Clone)]
pub struct SendTicket {
    pub gate: GateRef,
    pub phone: PhoneNumber,
    /// Existence is already known on a resend.
    pub known: Option<bool>,
}

/// Permission to verify `code` for `phone`.
#[derive(Debug, Clone)]
pub struct VerifyTicket {
    pub gate: GateRef,
    pub phone: PhoneNumber,
    pub code: OtpCode,
    pub known: bool,
}

/// Permission to log in or register a verified phone number.
#[derive(Debug, Clone)]
pub struct CompleteTicket {
    pub gate: GateRef,
    pub phone: PhoneNumber,
}

/// One customer's pass through the login dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGate {
    id: Uuid,
    generation: u64,
    step: GateStep,
    cooldown: ResendCooldown,
    redirect: Option<String>,
    prompt: Option<String>,
    error: Option<String>,
    /// Code echoed by a demo gateway, shown on the OTP step.
    demo_code: Option<OtpCode>,
}

impl AuthGate {
    /// Open a fresh gate at the phone step.
    #[must_use]
    pub fn open(redirect: Option<&str>, prompt: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            generation: 0,
            step: GateStep::CollectingPhone,
            cooldown: ResendCooldown::ready(now),
            redirect: redirect.and_then(sanitize_redirect),
            prompt: prompt
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| p.chars().take(120).collect()),
            error: None,
            demo_code: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn gate_ref(&self) -> GateRef {
        GateRef {
            id: self.id,
            generation: self.generation,
        }
    }

    #[must_use]
    pub const fn step(&self) -> &GateStep {
        &self.step
    }

    #[must_use]
    pub const fn cooldown(&self) -> &ResendCooldown {
        &self.cooldown
    }

    #[must_use]
    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub const fn demo_code(&self) -> Option<&OtpCode> {
        self.demo_code.as_ref()
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self.step, GateStep::Idle)
    }

    /// Bring the cooldown up to date with the wall clock.
    pub fn sync_cooldown(&mut self, now: DateTime<Utc>) {
        self.cooldown.sync(now);
    }

    /// Drop the inline error after it has been shown.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    // =========================================================================
    // Phone step
    // =========================================================================

    /// Validate `raw` and move to `SendingOtp`.
    ///
    /// # Errors
    ///
    /// `WrongStep` outside `CollectingPhone`; `InvalidPhone` (recorded on the
    /// gate, step unchanged) for a malformed number.
    pub fn submit_phone(&mut self, raw: &str) -> Result<SendTicket, AuthGateError> {
        self.expect_step("submit a phone number", |s| {
            matches!(s, GateStep::CollectingPhone)
        })?;

        let phone = match PhoneNumber::parse(raw) {
            Ok(phone) => phone,
            Err(e) => {
                self.error = Some(e.user_message().to_string());
                return Err(e.into());
            }
        };

        self.error = None;
        self.step = GateStep::SendingOtp {
            phone: phone.clone(),
            known: None,
        };
        Ok(SendTicket {
            gate: self.gate_ref(),
            phone,
            known: None,
        })
    }

    /// Record a delivered code and start the cooldown.
    ///
    /// # Errors
    ///
    /// `StaleTicket` if the gate is not waiting for this send.
    pub fn otp_sent(
        &mut self,
        ticket: &SendTicket,
        known: bool,
        demo_code: Option<OtpCode>,
        now: DateTime<Utc>,
    ) -> Result<(), AuthGateError> {
        self.expect_sending(ticket)?;
        self.step = GateStep::AwaitingOtp {
            phone: ticket.phone.clone(),
            known,
        };
        self.cooldown = ResendCooldown::start(now);
        self.demo_code = demo_code;
        self.error = None;
        Ok(())
    }

    /// Record a failed send.
    ///
    /// A first send returns to the phone step with nothing retained; a failed
    /// resend returns to the code step so the customer can try again.
    ///
    /// # Errors
    ///
    /// `StaleTicket` if the gate is not waiting for this send.
    pub fn send_failed(&mut self, ticket: &SendTicket, message: String) -> Result<(), AuthGateError> {
        self.expect_sending(ticket)?;
        self.step = match ticket.known {
            None => GateStep::CollectingPhone,
            Some(known) => GateStep::AwaitingOtp {
                phone: ticket.phone.clone(),
                known,
            },
        };
        self.demo_code = None;
        self.error = Some(message);
        Ok(())
    }

    // =========================================================================
    // Code step
    // =========================================================================

    /// Validate `raw` and move to `VerifyingOtp`.
    ///
    /// # Errors
    ///
    /// `WrongStep` outside `AwaitingOtp`; `InvalidOtp` (recorded, step
    /// unchanged) for a code of the wrong shape.
    pub fn submit_otp(&mut self, raw: &str) -> Result<VerifyTicket, AuthGateError> {
        let GateStep::AwaitingOtp { phone, known } = &self.step else {
            return Err(self.wrong_step("submit a code"));
        };
        let (phone, known) = (phone.clone(), *known);

        let code = match OtpCode::parse(raw) {
            Ok(code) => code,
            Err(e) => {
                self.error = Some(e.user_message().to_string());
                return Err(e.into());
            }
        };

        self.error = None;
        self.step = GateStep::VerifyingOtp {
            phone: phone.clone(),
            known,
        };
        Ok(VerifyTicket {
            gate: self.gate_ref(),
            phone,
            code,
            known,
        })
    }

    /// Branch on the existence check once the code is accepted.
    ///
    /// # Errors
    ///
    /// `StaleTicket` if the gate is not verifying this code.
    pub fn otp_verified(&mut self, ticket: &VerifyTicket) -> Result<(), AuthGateError> {
        self.expect_verifying(ticket)?;
        let phone = ticket.phone.clone();
        self.step = if ticket.known {
            GateStep::ExistingProfile { phone }
        } else {
            GateStep::NewRegistration { phone }
        };
        self.demo_code = None;
        self.error = None;
        Ok(())
    }

    /// Return to the code step with `message`. The cooldown keeps running.
    ///
    /// # Errors
    ///
    /// `StaleTicket` if the gate is not verifying this code.
    pub fn otp_rejected(
        &mut self,
        ticket: &VerifyTicket,
        message: String,
    ) -> Result<(), AuthGateError> {
        self.expect_verifying(ticket)?;
        self.step = GateStep::AwaitingOtp {
            phone: ticket.phone.clone(),
            known: ticket.known,
        };
        self.error = Some(message);
        Ok(())
    }

    /// Ask for another code once the cooldown has elapsed.
    ///
    /// # Errors
    ///
    /// `WrongStep` outside `AwaitingOtp`; `CooldownActive` (recorded) while
    /// the countdown is running.
    pub fn request_resend(&mut self, now: DateTime<Utc>) -> Result<SendTicket, AuthGateError> {
        let GateStep::AwaitingOtp { phone, known } = &self.step else {
            return Err(self.wrong_step("resend a code"));
        };
        let (phone, known) = (phone.clone(), *known);

        self.cooldown.sync(now);
        if !self.cooldown.can_resend() {
            let remaining = self.cooldown.remaining();
            self.error = Some(format!("Vui lòng chờ {remaining} giây để gửi lại mã"));
            return Err(AuthGateError::CooldownActive(remaining));
        }

        self.error = None;
        self.step = GateStep::SendingOtp {
            phone: phone.clone(),
            known: Some(known),
        };
        Ok(SendTicket {
            gate: self.gate_ref(),
            phone,
            known: Some(known),
        })
    }

    // =========================================================================
    // Terminal steps
    // =========================================================================

    /// Ticket for logging in an existing customer.
    ///
    /// # Errors
    ///
    /// `WrongStep` outside `ExistingProfile`.
    pub fn login_ticket(&self) -> Result<CompleteTicket, AuthGateError> {
        match &self.step {
            GateStep::ExistingProfile { phone } => Ok(CompleteTicket {
                gate: self.gate_ref(),
                phone: phone.clone(),
            }),
            _ => Err(self.wrong_step("log in")),
        }
    }

    /// Ticket for registering the verified phone number.
    ///
    /// # Errors
    ///
    /// `WrongStep` outside `NewRegistration`.
    pub fn registration_ticket(&self) -> Result<CompleteTicket, AuthGateError> {
        match &self.step {
            GateStep::NewRegistration { phone } => Ok(CompleteTicket {
                gate: self.gate_ref(),
                phone: phone.clone(),
            }),
            _ => Err(self.wrong_step("register")),
        }
    }

    /// Send the customer back to the phone step after a failed login.
    ///
    /// # Errors
    ///
    /// `StaleTicket` if the ticket is not for this gate.
    pub fn login_failed(
        &mut self,
        ticket: &CompleteTicket,
        message: String,
    ) -> Result<(), AuthGateError> {
        self.expect_ref(ticket.gate)?;
        self.step = GateStep::CollectingPhone;
        self.error = Some(message);
        Ok(())
    }

    /// Keep the registration form open with `message`.
    ///
    /// # Errors
    ///
    /// `StaleTicket` if the ticket is not for this gate.
    pub fn registration_failed(
        &mut self,
        ticket: &CompleteTicket,
        message: String,
    ) -> Result<(), AuthGateError> {
        self.expect_ref(ticket.gate)?;
        self.error = Some(message);
        Ok(())
    }

    /// Close the gate, discarding phone and code.
    ///
    /// Bumps the generation so results of requests still in flight are
    /// refused. The pending redirect is returned to the caller.
    pub fn close(&mut self) -> Option<String> {
        self.generation += 1;
        self.step = GateStep::Idle;
        self.error = None;
        self.demo_code = None;
        self.prompt = None;
        self.redirect.take()
    }

    // =========================================================================
    // Guards
    // =========================================================================

    fn wrong_step(&self, action: &'static str) -> AuthGateError {
        AuthGateError::WrongStep {
            action,
            step: self.step.name(),
        }
    }

    fn expect_step(
        &self,
        action: &'static str,
        allowed: impl FnOnce(&GateStep) -> bool,
    ) -> Result<(), AuthGateError> {
        if allowed(&self.step) {
            Ok(())
        } else {
            Err(self.wrong_step(action))
        }
    }

    fn expect_ref(&self, gate: GateRef) -> Result<(), AuthGateError> {
        if gate == self.gate_ref() {
            Ok(())
        } else {
            Err(AuthGateError::StaleTicket)
        }
    }

    fn expect_sending(&self, ticket: &SendTicket) -> Result<(), AuthGateError> {
        self.expect_ref(ticket.gate)?;
        match &self.step {
            GateStep::SendingOtp { phone, known }
                if *phone == ticket.phone && *known == ticket.known =>
            {
                Ok(())
            }
            _ => Err(AuthGateError::StaleTicket),
        }
    }

    fn expect_verifying(&self, ticket: &VerifyTicket) -> Result<(), AuthGateError> {
        self.expect_ref(ticket.gate)?;
        match &self.step {
            GateStep::VerifyingOtp { phone, .. } if *phone == ticket.phone => Ok(()),
            _ => Err(AuthGateError::StaleTicket),
        }
    }
}

/// Accept only same-site absolute paths as post-login targets.
#[must_use]
pub fn sanitize_redirect(target: &str) -> Option<String> {
    let target = target.trim();
    let same_site = target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.chars().any(char::is_control);
    same_site.then(|| target.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0)
            .single()
            .unwrap()
    }

    fn code(s: &str) -> OtpCode {
        OtpCode::parse(s).unwrap()
    }

    /// Drive a gate to `AwaitingOtp` for `0901234567`.
    fn awaiting(known: bool) -> AuthGate {
        let mut gate = AuthGate::open(Some("/cart"), None, now());
        let ticket = gate.submit_phone("0901234567").unwrap();
        gate.otp_sent(&ticket, known, Some(code("1234")), now())
            .unwrap();
        gate
    }

    #[test]
    fn test_invalid_phone_stays_on_phone_step() {
        let mut gate = AuthGate::open(None, None, now());
        let err = gate.submit_phone("12345").unwrap_err();
        assert!(matches!(err, AuthGateError::InvalidPhone(_)));
        assert!(err.is_recorded());
        assert_eq!(gate.step(), &GateStep::CollectingPhone);
        assert_eq!(gate.error(), Some("Số điện thoại không hợp lệ"));
    }

    #[test]
    fn test_send_failure_discards_phone() {
        let mut gate = AuthGate::open(None, None, now());
        let ticket = gate.submit_phone("0901234567").unwrap();
        gate.send_failed(&ticket, "Lỗi".to_string()).unwrap();
        assert_eq!(gate.step(), &GateStep::CollectingPhone);
        assert!(gate.step().phone().is_none());
        assert_eq!(gate.error(), Some("Lỗi"));
    }

    #[test]
    fn test_wrong_code_returns_to_entry_without_resetting_cooldown() {
        let mut gate = awaiting(true);
        gate.sync_cooldown(now() + TimeDelta::seconds(20));
        let ticket = gate.submit_otp("9999").unwrap();
        assert_eq!(gate.step().name(), "verifying_otp");
        gate.otp_rejected(&ticket, "OTP không chính xác".to_string())
            .unwrap();

        assert_eq!(gate.step().name(), "awaiting_otp");
        assert_eq!(gate.error(), Some("OTP không chính xác"));
        assert_eq!(gate.cooldown().remaining(), 40);
    }

    #[test]
    fn test_verified_known_phone_goes_to_existing_profile() {
        let mut gate = awaiting(true);
        let ticket = gate.submit_otp("1234").unwrap();
        gate.otp_verified(&ticket).unwrap();
        assert_eq!(gate.step().name(), "existing_profile");
        assert!(gate.login_ticket().is_ok());
        assert!(gate.registration_ticket().is_err());
        assert!(gate.demo_code().is_none());
    }

    #[test]
    fn test_verified_unknown_phone_goes_to_registration() {
        let mut gate = awaiting(false);
        let ticket = gate.submit_otp("1234").unwrap();
        gate.otp_verified(&ticket).unwrap();
        assert_eq!(
            gate.step(),
            &GateStep::NewRegistration {
                phone: PhoneNumber::parse("0901234567").unwrap()
            }
        );
    }

    #[test]
    fn test_short_code_is_local_error() {
        let mut gate = awaiting(true);
        let err = gate.submit_otp("12").unwrap_err();
        assert!(matches!(err, AuthGateError::InvalidOtp(_)));
        assert_eq!(gate.step().name(), "awaiting_otp");
    }

    #[test]
    fn test_resend_only_after_cooldown() {
        let mut gate = awaiting(true);
        let err = gate
            .request_resend(now() + TimeDelta::seconds(59))
            .unwrap_err();
        assert!(matches!(err, AuthGateError::CooldownActive(1)));
        assert_eq!(gate.step().name(), "awaiting_otp");

        let later = now() + TimeDelta::seconds(60);
        let ticket = gate.request_resend(later).unwrap();
        assert_eq!(ticket.known, Some(true));
        gate.otp_sent(&ticket, true, None, later).unwrap();
        assert_eq!(gate.cooldown().remaining(), 60);
    }

    #[test]
    fn test_failed_resend_keeps_code_step() {
        let mut gate = awaiting(true);
        let ticket = gate
            .request_resend(now() + TimeDelta::seconds(61))
            .unwrap();
        gate.send_failed(&ticket, "Lỗi".to_string()).unwrap();
        assert_eq!(gate.step().name(), "awaiting_otp");
        assert!(gate.cooldown().can_resend());
    }

    #[test]
    fn test_close_makes_tickets_stale() {
        let mut gate = AuthGate::open(Some("/cart"), None, now());
        let ticket = gate.submit_phone("0901234567").unwrap();
        assert_eq!(gate.close(), Some("/cart".to_string()));
        assert!(!gate.is_open());
        assert!(gate.step().phone().is_none());

        let err = gate.otp_sent(&ticket, true, None, now()).unwrap_err();
        assert!(matches!(err, AuthGateError::StaleTicket));
        assert_eq!(gate.step(), &GateStep::Idle);
    }

    #[test]
    fn test_no_terminal_step_without_verification() {
        // Every sequence of code submissions, rejections and resends keeps the
        // gate short of a terminal step.
        let mut gate = awaiting(true);
        let mut t = now();
        for round in 0..20 {
            if let Ok(ticket) = gate.submit_otp("0000") {
                gate.otp_rejected(&ticket, "OTP không chính xác".to_string())
                    .unwrap();
            }
            t += TimeDelta::seconds(if round % 3 == 0 { 61 } else { 5 });
            if let Ok(ticket) = gate.request_resend(t) {
                gate.otp_sent(&ticket, true, None, t).unwrap();
            }
            assert!(gate.login_ticket().is_err());
            assert!(gate.registration_ticket().is_err());
        }
    }

    #[test]
    fn test_idle_gate_refuses_every_step() {
        let mut gate = AuthGate::open(None, None, now());
        gate.close();
        assert!(matches!(
            gate.submit_phone("0901234567"),
            Err(AuthGateError::WrongStep { .. })
        ));
        assert!(gate.submit_otp("1234").is_err());
        assert!(gate.request_resend(now()).is_err());
        assert!(gate.login_ticket().is_err());
    }

    #[test]
    fn test_gate_survives_session_round_trip() {
        let gate = awaiting(false);
        let json = serde_json::to_value(&gate).unwrap();
        assert_eq!(json["step"]["step"], "awaiting_otp");
        let back: AuthGate = serde_json::from_value(json).unwrap();
        assert_eq!(back, gate);
    }

    #[test]
    fn test_sanitize_redirect() {
        assert_eq!(sanitize_redirect("/cart"), Some("/cart".to_string()));
        assert_eq!(
            sanitize_redirect("/products/ray-ban?x=1"),
            Some("/products/ray-ban?x=1".to_string())
        );
        assert_eq!(sanitize_redirect("//evil.example"), None);
        assert_eq!(sanitize_redirect("https://evil.example"), None);
        assert_eq!(sanitize_redirect("/\\evil"), None);
    }
}
