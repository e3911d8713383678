//! Signature algorithm and verification for the event intake API.
//!
//! The wire format for the header is:
//!
//! ```text
//! Workx-Signature: {unix_timestamp}.{base64_signature}
//! ```
//!
//! The signature is `HMAC-SHA256("{timestamp}.{json_body}", secret)`.

/// Header name for the HMAC signature.
pub const SIGNATURE_HEADER: &str = "Workx-Signature";

/// Maximum allowed age of a signature (in seconds).
pub const MAX_SIGNATURE_AGE: i64 = 5 * 60;

/// Marker trait for types that can participate in body signing via
/// [`SignedObject`].
pub trait Signature: for<'de> serde::Deserialize<'de> + serde::Serialize {}

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid header format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("signature expired")]
    Expired,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

/// A signed request body carrying its typed payload, timestamp, raw JSON, and
/// HMAC-SHA256 signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedObject<T: Signature> {
    pub body: T,
    pub timestamp: i64,
    pub json: String,
    pub signature: Box<[u8]>,
}

impl<T: Signature> SignedObject<T> {
    /// Serialize `body` and sign it with the current time.
    pub fn new(body: T, key: &[u8]) -> Result<Self, serde_json::Error> {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        Self::new_at(body, key, now)
    }

    /// Serialize `body` and sign it as if at `timestamp`.
    pub fn new_at(body: T, key: &[u8], timestamp: i64) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(&body)?;
        let signature = sign_body(timestamp, &json, key);
        Ok(Self {
            body,
            timestamp,
            json,
            signature,
        })
    }

    /// Reconstruct a [`SignedObject`] from a raw `Workx-Signature` header
    /// value and the JSON request body string.
    ///
    /// This parses the header and deserializes the body but does **not**
    /// verify the HMAC; call [`verify`](Self::verify) for that.
    pub fn from_header_and_body(
        header_value: &str,
        body_json: String,
    ) -> Result<Self, SignatureError> {
        let (timestamp, signature) = parse_signature_header(header_value)?;
        let body: T = serde_json::from_str(&body_json)?;
        Ok(Self {
            body,
            timestamp,
            json: body_json,
            signature,
        })
    }

    /// Verify the HMAC signature and timestamp freshness, consuming `self`
    /// and returning the authenticated payload.
    pub fn verify(self, key: &[u8]) -> Result<T, SignatureError> {
        let data = format!("{}.{}", self.timestamp, self.json);
        ring::hmac::verify(
            &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
            data.as_bytes(),
            self.signature.as_ref(),
        )?;
        check_timestamp(self.timestamp)?;
        Ok(self.body)
    }

    /// Format the full `Workx-Signature` header value (`{timestamp}.{b64}`).
    pub fn to_header(&self) -> String {
        format_signature_header(self.timestamp, &self.signature)
    }
}

fn sign_body(timestamp: i64, json: &str, key: &[u8]) -> Box<[u8]> {
    let data = format!("{timestamp}.{json}");
    let signature = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
    );
    signature.as_ref().to_owned().into_boxed_slice()
}

/// Parse a `Workx-Signature` header value (`{timestamp}.{base64}`) into
/// `(timestamp, raw_signature_bytes)`.
pub fn parse_signature_header(value: &str) -> Result<(i64, Box<[u8]>), SignatureError> {
    let (timestamp, signature) = value.split_once('.').ok_or(SignatureError::InvalidFormat)?;
    let timestamp: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let signature_bytes = fast32::base64::RFC4648_NOPAD
        .decode_str(signature)
        .map_err(|_| SignatureError::InvalidBase64)?
        .into_boxed_slice();
    Ok((timestamp, signature_bytes))
}

/// Format a `{timestamp}.{base64}` header value from its parts.
pub fn format_signature_header(timestamp: i64, signature: &[u8]) -> String {
    format!(
        "{}.{}",
        timestamp,
        fast32::base64::RFC4648_NOPAD.encode(signature)
    )
}

/// Check that a signature timestamp is within [`MAX_SIGNATURE_AGE`] of now,
/// in either direction.
pub fn check_timestamp(timestamp: i64) -> Result<(), SignatureError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    if now.saturating_sub(timestamp).saturating_abs() > MAX_SIGNATURE_AGE {
        return Err(SignatureError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::NotificationRequest;

    const KEY: &[u8] = b"intake-secret";

    #[test]
    fn test_header_round_trip_verifies() {
        let signed = SignedObject::new(NotificationRequest::JobApproved { job_id: 9 }, KEY).unwrap();
        let header = signed.to_header();

        let parsed =
            SignedObject::<NotificationRequest>::from_header_and_body(&header, signed.json.clone())
                .unwrap();
        assert_eq!(
            parsed.verify(KEY).unwrap(),
            NotificationRequest::JobApproved { job_id: 9 }
        );
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let signed = SignedObject::new(NotificationRequest::JobApproved { job_id: 9 }, KEY).unwrap();
        let header = signed.to_header();
        let tampered = r#"{"kind":"job_approved","job_id":10}"#.to_string();

        let parsed =
            SignedObject::<NotificationRequest>::from_header_and_body(&header, tampered).unwrap();
        assert!(matches!(
            parsed.verify(KEY),
            Err(SignatureError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let signed = SignedObject::new(NotificationRequest::JobApproved { job_id: 9 }, KEY).unwrap();
        assert!(matches!(
            signed.verify(b"other-secret"),
            Err(SignatureError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_stale_signature_is_rejected() {
        let an_hour_ago = time::OffsetDateTime::now_utc().unix_timestamp() - 3600;
        let signed = SignedObject::new_at(
            NotificationRequest::WorkerApproved { worker_id: 1 },
            KEY,
            an_hour_ago,
        )
        .unwrap();
        assert!(matches!(signed.verify(KEY), Err(SignatureError::Expired)));
    }

    #[test]
    fn test_future_signature_is_rejected() {
        let next_year = time::OffsetDateTime::now_utc().unix_timestamp() + 365 * 24 * 3600;
        let signed = SignedObject::new_at(
            NotificationRequest::WorkerApproved { worker_id: 1 },
            KEY,
            next_year,
        )
        .unwrap();
        assert!(matches!(signed.verify(KEY), Err(SignatureError::Expired)));
        assert!(matches!(check_timestamp(i64::MAX), Err(SignatureError::Expired)));
        assert!(matches!(check_timestamp(i64::MIN), Err(SignatureError::Expired)));
    }

    #[test]
    fn test_small_clock_skew_is_accepted() {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        assert!(check_timestamp(now + 30).is_ok());
        assert!(check_timestamp(now - 30).is_ok());
    }

    #[test]
    fn test_malformed_headers() {
        assert!(matches!(
            parse_signature_header("no-dot-here"),
            Err(SignatureError::InvalidFormat)
        ));
        assert!(matches!(
            parse_signature_header("abc.AAAA"),
            Err(SignatureError::InvalidFormat)
        ));
        assert!(matches!(
            parse_signature_header("123.!!!"),
            Err(SignatureError::InvalidBase64)
        ));
    }
}
