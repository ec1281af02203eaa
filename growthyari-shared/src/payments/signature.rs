/// Gateway signature verification
///
/// Both checks are HMAC-SHA256, hex encoded:
///
/// - checkout callback: `HMAC(key_secret, "{order_id}|{payment_id}")`
/// - webhook delivery: `HMAC(webhook_secret, raw_body)`
///
/// Comparison goes through [`Mac::verify_slice`], which is constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signature is not valid hex")]
    Malformed,

    #[error("Signature mismatch")]
    Mismatch,
}

/// Hex HMAC-SHA256 of `payload`
pub fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac = mac_for(secret);
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies the signature returned to the client after checkout
///
/// ```
/// use growthyari_shared::payments::signature::{sign, verify_payment_signature};
///
/// let sig = sign(b"order_1|pay_1", "secret");
/// assert!(verify_payment_signature("order_1", "pay_1", &sig, "secret").is_ok());
/// assert!(verify_payment_signature("order_1", "pay_2", &sig, "secret").is_err());
/// ```
pub fn verify_payment_signature(
    order_id: &str,
    payment_id: &str,
    signature: &str,
    secret: &str,
) -> Result<(), SignatureError> {
    let payload = format!("{}|{}", order_id, payment_id);
    verify(payload.as_bytes(), signature, secret)
}

/// Verifies a webhook delivery against its raw request body
pub fn verify_webhook_signature(
    body: &[u8],
    signature: &str,
    secret: &str,
) -> Result<(), SignatureError> {
    verify(body, signature, secret)
}

fn verify(payload: &[u8], signature: &str, secret: &str) -> Result<(), SignatureError> {
    let expected = hex::decode(signature.trim()).map_err(|_| SignatureError::Malformed)?;

    let mut mac = mac_for(secret);
    mac.update(payload);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

fn mac_for(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "rzp_test_secret";

    #[test]
    fn test_valid_payment_signature() {
        let sig = sign(b"order_Abc123|pay_Xyz789", SECRET);
        assert_eq!(
            verify_payment_signature("order_Abc123", "pay_Xyz789", &sig, SECRET),
            Ok(())
        );
    }

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2
        let sig = sign(b"what do ya want for nothing?", "Jefe");
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_swapped_ids_rejected() {
        let sig = sign(b"order_1|pay_1", SECRET);
        assert_eq!(
            verify_payment_signature("pay_1", "order_1", &sig, SECRET),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let sig = sign(b"order_1|pay_1", "other");
        assert_eq!(
            verify_payment_signature("order_1", "pay_1", &sig, SECRET),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_malformed_signature() {
        assert_eq!(
            verify_payment_signature("order_1", "pay_1", "not-hex!", SECRET),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let sig = sign(b"order_1|pay_1", SECRET);
        assert_eq!(
            verify_payment_signature("order_1", "pay_1", &sig[..32], SECRET),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_webhook_signature_over_raw_body() {
        let body = br#"{"event":"payment.captured"}"#;
        let sig = sign(body, "whsec");

        assert!(verify_webhook_signature(body, &sig, "whsec").is_ok());
        assert!(verify_webhook_signature(br#"{"event":"payment.failed"}"#, &sig, "whsec").is_err());
    }
}
