//! In-memory gateway with simulated latency.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache;
use optica_core::{CustomerId, OtpCode, PhoneNumber};
use rand::Rng;
use tokio::sync::RwLock;

use super::{
    AuthGateway, CustomerProfile, GatewayError, INCORRECT_OTP_MESSAGE, NewCustomer, OtpDispatch,
    OtpVerdict,
};

/// Phone number of the seeded demo account.
pub const DEMO_CUSTOMER_PHONE: &str = "0901234567";

/// How long an unverified code stays valid.
const CODE_TTL: Duration = Duration::from_secs(10 * 60);

const MAX_PENDING_CODES: u64 = 100_000;

/// Gateway backed by process memory.
///
/// Every call sleeps for the configured delay before answering. Codes are
/// random unless a fixed code is set, and are always returned to the caller
/// (demo mode).
#[derive(Clone)]
pub struct FakeGateway {
    inner: Arc<FakeGatewayInner>,
}

struct FakeGatewayInner {
    delay: Duration,
    fixed_code: Option<OtpCode>,
    customers: RwLock<HashMap<PhoneNumber, CustomerProfile>>,
    /// Last code sent per phone; a resend overwrites it.
    pending: Cache<PhoneNumber, OtpCode>,
    sent: AtomicU64,
    next_id: AtomicI32,
}

impl FakeGateway {
    /// Create a gateway seeded with the demo customer.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self::build(delay, None)
    }

    /// Create a gateway with no delay that always sends `code`.
    #[must_use]
    pub fn with_fixed_code(code: OtpCode) -> Self {
        Self::build(Duration::ZERO, Some(code))
    }

    fn build(delay: Duration, fixed_code: Option<OtpCode>) -> Self {
        let mut customers = HashMap::new();
        if let Ok(phone) = PhoneNumber::parse(DEMO_CUSTOMER_PHONE) {
            customers.insert(
                phone.clone(),
                CustomerProfile {
                    id: CustomerId::new(1),
                    phone,
                    full_name: "Nguyễn Minh Anh".to_string(),
                    email: None,
                },
            );
        }

        Self {
            inner: Arc::new(FakeGatewayInner {
                delay,
                fixed_code,
                customers: RwLock::new(customers),
                pending: Cache::builder()
                    .max_capacity(MAX_PENDING_CODES)
                    .time_to_live(CODE_TTL)
                    .build(),
                sent: AtomicU64::new(0),
                next_id: AtomicI32::new(2),
            }),
        }
    }

    /// Code awaiting verification for `phone`, if any.
    #[must_use]
    pub fn last_code(&self, phone: &PhoneNumber) -> Option<OtpCode> {
        self.inner.pending.get(phone)
    }

    /// Number of codes sent so far, across all numbers.
    #[must_use]
    pub fn sent_count(&self) -> u64 {
        self.inner.sent.load(Ordering::Relaxed)
    }

    async fn simulate_latency(&self) {
        if !self.inner.delay.is_zero() {
            tokio::time::sleep(self.inner.delay).await;
        }
    }

    fn generate_code(&self) -> OtpCode {
        self.inner.fixed_code.clone().unwrap_or_else(|| {
            let n: u32 = rand::rng().random_range(0..10_000);
            OtpCode::from_number(n)
        })
    }
}

#[async_trait]
impl AuthGateway for FakeGateway {
    async fn check_phone_exists(&self, phone: &PhoneNumber) -> Result<bool, GatewayError> {
        self.simulate_latency().await;
        Ok(self.inner.customers.read().await.contains_key(phone))
    }

    async fn send_otp(&self, phone: &PhoneNumber) -> Result<OtpDispatch, GatewayError> {
        self.simulate_latency().await;
        let code = self.generate_code();
        self.inner.pending.insert(phone.clone(), code.clone());
        self.inner.sent.fetch_add(1, Ordering::Relaxed);
        tracing::info!(phone = %phone.masked(), "Demo OTP issued");
        Ok(OtpDispatch {
            dev_code: Some(code),
        })
    }

    async fn verify_otp(
        &self,
        phone: &PhoneNumber,
        code: &OtpCode,
    ) -> Result<OtpVerdict, GatewayError> {
        self.simulate_latency().await;
        if self.inner.pending.get(phone).as_ref() == Some(code) {
            self.inner.pending.invalidate(phone);
            Ok(OtpVerdict::Verified)
        } else {
            Ok(OtpVerdict::Rejected {
                message: INCORRECT_OTP_MESSAGE.to_string(),
            })
        }
    }

    async fn login_customer(&self, phone: &PhoneNumber) -> Result<CustomerProfile, GatewayError> {
        self.simulate_latency().await;
        self.inner
            .customers
            .read()
            .await
            .get(phone)
            .cloned()
            .ok_or(GatewayError::CustomerNotFound)
    }

    async fn register_customer(
        &self,
        customer: NewCustomer,
    ) -> Result<CustomerProfile, GatewayError> {
        self.simulate_latency().await;
        let mut customers = self.inner.customers.write().await;
        if customers.contains_key(&customer.phone) {
            return Err(GatewayError::AlreadyRegistered);
        }
        let profile = CustomerProfile {
            id: CustomerId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed)),
            phone: customer.phone,
            full_name: customer.full_name,
            email: customer.email,
        };
        customers.insert(profile.phone.clone(), profile.clone());
        Ok(profile)
    }
}
