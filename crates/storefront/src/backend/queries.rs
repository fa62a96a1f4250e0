//! GraphQL operations used by the storefront and their data shapes.
//!
//! Field names follow the backend's camelCase schema.

use serde::{Deserialize, Serialize};

// =============================================================================
// Catalog
// =============================================================================

pub const PRODUCTS_OPERATION: &str = "Products";

pub const PRODUCTS: &str = r"
query Products {
  products {
    id
    slug
    name
    brand
    category
    price
    originalPrice
    rating
    reviewCount
    shape
    material
    frameDesign
    isOnSale
    isNew
    isHotDeal
    features
    colors
    description
  }
}
";

/// Variables for operations that take none.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NoVariables {}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductsData {
    pub products: Vec<ProductNode>,
}

/// A product as the backend reports it; tags are raw slugs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: u64,
    #[serde(default)]
    pub original_price: Option<u64>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub shape: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub frame_design: Option<String>,
    #[serde(default)]
    pub is_on_sale: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_hot_deal: bool,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// Customer authentication
// =============================================================================

pub const CHECK_PHONE_OPERATION: &str = "CheckPhone";

pub const CHECK_PHONE: &str = r"
query CheckPhone($phone: String!) {
  customerExists(phone: $phone)
}
";

pub const SEND_OTP_OPERATION: &str = "SendOtp";

pub const SEND_OTP: &str = r"
mutation SendOtp($phone: String!) {
  sendOtp(phone: $phone) {
    success
    code
    message
  }
}
";

pub const VERIFY_OTP_OPERATION: &str = "VerifyOtp";

pub const VERIFY_OTP: &str = r"
mutation VerifyOtp($phone: String!, $code: String!) {
  verifyOtp(phone: $phone, code: $code) {
    success
    message
  }
}
";

pub const LOGIN_CUSTOMER_OPERATION: &str = "LoginCustomer";

pub const LOGIN_CUSTOMER: &str = r"
mutation LoginCustomer($phone: String!) {
  loginCustomer(phone: $phone) {
    customer {
      id
      phone
      fullName
      email
    }
  }
}
";

pub const REGISTER_CUSTOMER_OPERATION: &str = "RegisterCustomer";

pub const REGISTER_CUSTOMER: &str = r"
mutation RegisterCustomer($input: RegisterCustomerInput!) {
  registerCustomer(input: $input) {
    success
    message
    customer {
      id
      phone
      fullName
      email
    }
  }
}
";

#[derive(Debug, Clone, Serialize)]
pub struct PhoneVariables<'a> {
    pub phone: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpVariables<'a> {
    pub phone: &'a str,
    pub code: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterCustomerVariables<'a> {
    pub input: RegisterCustomerInput<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomerInput<'a> {
    pub phone: &'a str,
    pub full_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPhoneData {
    pub customer_exists: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpData {
    pub send_otp: OtpPayload,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpData {
    pub verify_otp: OtpPayload,
}

/// Result of an OTP mutation.
#[derive(Debug, Clone, Deserialize)]
pub struct OtpPayload {
    pub success: bool,
    /// Only populated by backends running in demo mode.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCustomerData {
    pub login_customer: LoginPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
    pub customer: Option<CustomerNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomerData {
    pub register_customer: RegisterPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPayload {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub customer: Option<CustomerNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerNode {
    pub id: i32,
    pub phone: String,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_product_node_defaults() {
        let data: ProductsData = serde_json::from_value(serde_json::json!({
            "products": [{
                "id": 7,
                "slug": "essilor-crizal",
                "name": "Essilor Crizal",
                "brand": "Essilor",
                "category": "lens",
                "price": 1450000
            }]
        }))
        .unwrap();
        let node = &data.products[0];
        assert_eq!(node.id, 7);
        assert!(node.shape.is_none());
        assert!(node.features.is_empty());
        assert!(!node.is_on_sale);
    }

    #[test]
    fn test_register_input_omits_missing_email() {
        let vars = RegisterCustomerVariables {
            input: RegisterCustomerInput {
                phone: "0901234567",
                full_name: "Nguyễn Văn A",
                email: None,
            },
        };
        let json = serde_json::to_value(&vars).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "input": { "phone": "0901234567", "fullName": "Nguyễn Văn A" } })
        );
    }

    #[test]
    fn test_send_otp_payload() {
        let data: SendOtpData = serde_json::from_value(serde_json::json!({
            "sendOtp": { "success": true, "code": "1234" }
        }))
        .unwrap();
        assert!(data.send_otp.success);
        assert_eq!(data.send_otp.code.as_deref(), Some("1234"));
        assert!(data.send_otp.message.is_none());
    }
}
