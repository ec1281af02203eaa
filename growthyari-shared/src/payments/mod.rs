/// Payment gateway integration
///
/// # Checkout Flow
///
/// ```text
/// POST /v1/payments/orders   -> gateway order, order_id stored on registration
///   (client completes checkout with the gateway)
/// POST /v1/payments/verify   -> signature check, registration marked completed
/// POST /v1/payments/webhook  -> gateway-initiated confirmation or failure
/// ```

pub mod gateway;
pub mod signature;

pub use gateway::{GatewayError, GatewayOrder, PaymentGateway, RazorpayGateway};
pub use signature::{verify_payment_signature, verify_webhook_signature, SignatureError};
