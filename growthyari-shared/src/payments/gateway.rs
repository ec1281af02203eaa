/// Payment gateway client
///
/// [`PaymentGateway`] is the seam between route handlers and the gateway's
/// order API. [`RazorpayGateway`] is the production implementation; tests
/// substitute their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://api.razorpay.com/v1";

/// Gateways cap receipt length at 40 characters
const MAX_RECEIPT_LENGTH: usize = 40;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gateway returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid order request: {0}")]
    InvalidRequest(String),
}

/// Order created at the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Amount in paise
    pub amount: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id handed to the checkout widget
    fn key_id(&self) -> &str;

    async fn create_order(
        &self,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

/// Razorpay Orders API client
#[derive(Debug, Clone)]
pub struct RazorpayGateway {
    key_id: String,
    key_secret: String,
    api_base: String,
    http: reqwest::Client,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String, api_base: String) -> Self {
        Self {
            key_id,
            key_secret,
            api_base: api_base.trim_end_matches('/').to_string(),
            http: crate::http::client(crate::http::DEFAULT_TIMEOUT),
        }
    }

    fn orders_url(&self) -> String {
        format!("{}/orders", self.api_base)
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn create_order(
        &self,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        if amount_paise <= 0 {
            return Err(GatewayError::InvalidRequest(format!(
                "amount must be positive, got {}",
                amount_paise
            )));
        }

        let receipt: String = receipt.chars().take(MAX_RECEIPT_LENGTH).collect();
        let response = self
            .http
            .post(self.orders_url())
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderRequest {
                amount: amount_paise,
                currency,
                receipt: &receipt,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Payment gateway rejected order");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let order: GatewayOrder = response.json().await?;
        tracing::info!(order_id = %order.id, amount = order.amount, "Gateway order created");
        Ok(order)
    }
}
