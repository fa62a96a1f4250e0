//! Gateway backed by the commerce GraphQL API.

use async_trait::async_trait;
use optica_core::{CustomerId, Email, OtpCode, PhoneNumber};
use tracing::instrument;

use super::{
    AuthGateway, CustomerProfile, GatewayError, INCORRECT_OTP_MESSAGE, NewCustomer, OtpDispatch,
    OtpVerdict,
};
use crate::backend::GraphqlClient;
use crate::backend::queries::{
    CHECK_PHONE, CHECK_PHONE_OPERATION, CheckPhoneData, CustomerNode, LOGIN_CUSTOMER,
    LOGIN_CUSTOMER_OPERATION, LoginCustomerData, PhoneVariables, REGISTER_CUSTOMER,
    REGISTER_CUSTOMER_OPERATION, RegisterCustomerData, RegisterCustomerInput,
    RegisterCustomerVariables, SEND_OTP, SEND_OTP_OPERATION, SendOtpData, VERIFY_OTP,
    VERIFY_OTP_OPERATION, VerifyOtpData, VerifyOtpVariables,
};

/// Customer authentication through the backend's GraphQL mutations.
#[derive(Clone)]
pub struct GraphqlGateway {
    client: GraphqlClient,
}

impl GraphqlGateway {
    #[must_use]
    pub const fn new(client: GraphqlClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthGateway for GraphqlGateway {
    #[instrument(skip_all, fields(phone = %phone.masked()))]
    async fn check_phone_exists(&self, phone: &PhoneNumber) -> Result<bool, GatewayError> {
        let data: CheckPhoneData = self
            .client
            .execute(
                CHECK_PHONE_OPERATION,
                CHECK_PHONE,
                PhoneVariables {
                    phone: phone.as_str(),
                },
            )
            .await?;
        Ok(data.customer_exists)
    }

    #[instrument(skip_all, fields(phone = %phone.masked()))]
    async fn send_otp(&self, phone: &PhoneNumber) -> Result<OtpDispatch, GatewayError> {
        let data: SendOtpData = self
            .client
            .execute(
                SEND_OTP_OPERATION,
                SEND_OTP,
                PhoneVariables {
                    phone: phone.as_str(),
                },
            )
            .await?;

        let payload = data.send_otp;
        if !payload.success {
            return Err(GatewayError::SendFailed(payload.message.unwrap_or_default()));
        }

        // Only demo backends echo the code; a malformed one is ignored.
        let dev_code = payload.code.and_then(|raw| match OtpCode::parse(&raw) {
            Ok(code) => Some(code),
            Err(e) => {
                tracing::warn!(error = %e, "Backend returned an unusable demo code");
                None
            }
        });
        Ok(OtpDispatch { dev_code })
    }

    #[instrument(skip_all, fields(phone = %phone.masked()))]
    async fn verify_otp(
        &self,
        phone: &PhoneNumber,
        code: &OtpCode,
    ) -> Result<OtpVerdict, GatewayError> {
        let data: VerifyOtpData = self
            .client
            .execute(
                VERIFY_OTP_OPERATION,
                VERIFY_OTP,
                VerifyOtpVariables {
                    phone: phone.as_str(),
                    code: code.as_str(),
                },
            )
            .await?;

        let payload = data.verify_otp;
        if payload.success {
            Ok(OtpVerdict::Verified)
        } else {
            Ok(OtpVerdict::Rejected {
                message: payload
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| INCORRECT_OTP_MESSAGE.to_string()),
            })
        }
    }

    #[instrument(skip_all, fields(phone = %phone.masked()))]
    async fn login_customer(&self, phone: &PhoneNumber) -> Result<CustomerProfile, GatewayError> {
        let data: LoginCustomerData = self
            .client
            .execute(
                LOGIN_CUSTOMER_OPERATION,
                LOGIN_CUSTOMER,
                PhoneVariables {
                    phone: phone.as_str(),
                },
            )
            .await?;

        data.login_customer
            .customer
            .ok_or(GatewayError::CustomerNotFound)
            .and_then(convert_customer)
    }

    #[instrument(skip_all, fields(phone = %customer.phone.masked()))]
    async fn register_customer(
        &self,
        customer: NewCustomer,
    ) -> Result<CustomerProfile, GatewayError> {
        let data: RegisterCustomerData = self
            .client
            .execute(
                REGISTER_CUSTOMER_OPERATION,
                REGISTER_CUSTOMER,
                RegisterCustomerVariables {
                    input: RegisterCustomerInput {
                        phone: customer.phone.as_str(),
                        full_name: &customer.full_name,
                        email: customer.email.as_ref().map(Email::as_str),
                    },
                },
            )
            .await?;

        let payload = data.register_customer;
        if !payload.success {
            return Err(GatewayError::RegistrationRejected(
                payload.message.unwrap_or_default(),
            ));
        }
        payload
            .customer
            .ok_or_else(|| GatewayError::Malformed("registration returned no customer".to_string()))
            .and_then(convert_customer)
    }
}

fn convert_customer(node: CustomerNode) -> Result<CustomerProfile, GatewayError> {
    let phone = PhoneNumber::parse(&node.phone)
        .map_err(|e| GatewayError::Malformed(format!("customer phone: {e}")))?;

    // A bad stored email should not lock the customer out.
    let email = node
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .and_then(|raw| match Email::parse(raw) {
            Ok(email) => Some(email),
            Err(e) => {
                tracing::warn!(customer_id = node.id, error = %e, "Ignoring invalid customer email");
                None
            }
        });

    Ok(CustomerProfile {
        id: CustomerId::new(node.id),
        phone,
        full_name: node.full_name,
        email,
    })
}
