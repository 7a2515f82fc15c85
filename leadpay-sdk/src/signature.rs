//! Callback signature algorithm.
//!
//! The gateway signs the outcome of a checkout with the shared secret:
//!
//! ```text
//! signature = hex(HMAC-SHA256("{order_id}|{payment_id}", secret))
//! ```
//!
//! The digest is rendered as lowercase hexadecimal. Verification accepts
//! exactly the strings a plain equality check against that rendering would
//! accept, but compares the digest bytes in constant time.

/// Header the gateway uses when it pushes a signed payload.
pub const GATEWAY_SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// Length of a hex-rendered HMAC-SHA256 digest.
const HEX_DIGEST_LEN: usize = 64;

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("signature is not a lowercase hex digest")]
    InvalidFormat,
    #[error("invalid signature")]
    SignatureMismatch,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

fn signing_key(secret: &[u8]) -> ring::hmac::Key {
    ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret)
}

fn signed_message(order_id: &str, payment_id: &str) -> String {
    format!("{order_id}|{payment_id}")
}

/// Compute the signature the gateway attaches to a successful checkout.
pub fn sign_callback(order_id: &str, payment_id: &str, secret: &[u8]) -> String {
    let tag = ring::hmac::sign(
        &signing_key(secret),
        signed_message(order_id, payment_id).as_bytes(),
    );
    hex::encode(tag.as_ref())
}

/// Verify a callback signature.
pub fn verify_callback(
    order_id: &str,
    payment_id: &str,
    signature: &str,
    secret: &[u8],
) -> Result<(), SignatureError> {
    // Only the canonical rendering may pass; `hex::decode` alone would also
    // accept uppercase digits.
    if signature.len() != HEX_DIGEST_LEN
        || !signature
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return Err(SignatureError::InvalidFormat);
    }
    let tag = hex::decode(signature).map_err(|_| SignatureError::InvalidFormat)?;
    ring::hmac::verify(
        &signing_key(secret),
        signed_message(order_id, payment_id).as_bytes(),
        &tag,
    )?;
    Ok(())
}

/// Convenience wrapper returning whether the signature is authentic.
pub fn is_authentic(order_id: &str, payment_id: &str, signature: &str, secret: &[u8]) -> bool {
    verify_callback(order_id, payment_id, signature, secret).is_ok()
}
