//! Request signature verification.
//!
//! Chat platforms sign each webhook call with a shared secret:
//!
//! ```text
//! basestring = "v0:" + timestamp + ":" + body
//! signature  = "v0=" + hex(hmac_sha256(secret, basestring))
//! ```
//!
//! The signature arrives in `x-slack-signature` and the timestamp in
//! `x-slack-request-timestamp`. A request is accepted when the signature
//! matches and the timestamp is recent enough to rule out replays.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use umbrella_framework::InboundRequest;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "x-slack-signature";
/// Header carrying the request timestamp (seconds since the epoch).
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

const VERSION: &str = "v0";

/// Errors from verifying a request signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// A required header is absent.
    #[error("missing header: {0}")]
    MissingHeader(&'static str),

    /// The timestamp header is not a number.
    #[error("malformed request timestamp: {0}")]
    MalformedTimestamp(String),

    /// The signing key was rejected.
    #[error("invalid signing key")]
    InvalidKey,

    /// The timestamp is outside the accepted window.
    #[error("request timestamp {timestamp} is too far from now ({now})")]
    Stale {
        /// Request timestamp.
        timestamp: u64,
        /// Local time.
        now: u64,
    },

    /// The signature does not match the request.
    #[error("signature mismatch")]
    SignatureMismatch,
}

impl AuthError {
    /// Returns `true` when the request was well-formed but not authentic.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Stale { .. } | Self::SignatureMismatch)
    }
}

/// Result type for signature verification.
pub type AuthResult<T> = Result<T, AuthError>;

/// Verifies request signatures with a shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
    max_skew: Duration,
}

impl SignatureVerifier {
    /// Creates a verifier accepting timestamps up to `max_skew` away from now.
    pub fn new(secret: impl AsRef<[u8]>, max_skew: Duration) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            max_skew,
        }
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> AuthResult<HmacSha256> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::InvalidKey)?;
        mac.update(VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);
        Ok(mac)
    }

    /// Computes the signature header value for `timestamp` and `body`.
    pub fn sign(&self, timestamp: &str, body: impl AsRef<[u8]>) -> AuthResult<String> {
        let digest = self.mac(timestamp, body.as_ref())?.finalize().into_bytes();
        Ok(format!("{VERSION}={}", hex::encode(digest)))
    }

    /// Verifies `request` against the current time.
    pub fn verify(&self, request: &InboundRequest) -> AuthResult<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.verify_at(request, now)
    }

    /// Verifies `request` as if the current time were `now` (seconds since
    /// the epoch).
    pub fn verify_at(&self, request: &InboundRequest, now: u64) -> AuthResult<()> {
        let signature = request
            .header(SIGNATURE_HEADER)
            .ok_or(AuthError::MissingHeader(SIGNATURE_HEADER))?;
        let raw_timestamp = request
            .header(TIMESTAMP_HEADER)
            .ok_or(AuthError::MissingHeader(TIMESTAMP_HEADER))?;
        let timestamp: u64 = raw_timestamp
            .trim()
            .parse()
            .map_err(|_| AuthError::MalformedTimestamp(raw_timestamp.to_string()))?;

        if now.abs_diff(timestamp) > self.max_skew.as_secs() {
            return Err(AuthError::Stale { timestamp, now });
        }

        let expected = signature
            .strip_prefix(VERSION)
            .and_then(|s| s.strip_prefix('='))
            .and_then(|hex_digest| hex::decode(hex_digest).ok())
            .ok_or(AuthError::SignatureMismatch)?;

        // verify_slice compares in constant time
        self.mac(raw_timestamp, request.raw_body())?
            .verify_slice(&expected)
            .map_err(|_| AuthError::SignatureMismatch)
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("max_skew", &self.max_skew)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Example request from Slack's "Verifying requests" documentation.
    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const TIMESTAMP: &str = "1531420618";
    const NOW: u64 = 1531420618;
    const BODY: &str = "token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebhook-collect&text=&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmibIGlgcZRskXaIFfN&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";
    const SIGNATURE: &str = "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503";

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(SECRET, Duration::from_secs(300))
    }

    fn request(signature: &str, timestamp: &str) -> InboundRequest {
        InboundRequest::new(BODY)
            .with_header(SIGNATURE_HEADER, signature)
            .with_header(TIMESTAMP_HEADER, timestamp)
    }

    #[test]
    fn test_sign_matches_reference() {
        assert_eq!(verifier().sign(TIMESTAMP, BODY).unwrap(), SIGNATURE);
    }

    #[test]
    fn test_verify_valid_request() {
        assert_eq!(
            verifier().verify_at(&request(SIGNATURE, TIMESTAMP), NOW + 10),
            Ok(())
        );
    }

    #[test]
    fn test_verify_wrong_signature_is_forbidden() {
        let mut tampered = request(SIGNATURE, TIMESTAMP);
        tampered.body.push_str("&extra=1");
        let err = verifier().verify_at(&tampered, NOW).unwrap_err();
        assert_eq!(err, AuthError::SignatureMismatch);
        assert!(err.is_forbidden());

        let err = verifier()
            .verify_at(&request("v1=abcd", TIMESTAMP), NOW)
            .unwrap_err();
        assert_eq!(err, AuthError::SignatureMismatch);
    }

    #[test]
    fn test_verify_non_utf8_body() {
        let body = b"command=%2Fumbrella&text=caf\xe9".to_vec();
        let signature = verifier().sign(TIMESTAMP, &body).unwrap();
        let request = InboundRequest::from_bytes(body)
            .with_header(SIGNATURE_HEADER, signature.as_str())
            .with_header(TIMESTAMP_HEADER, TIMESTAMP);

        assert!(request.body.ends_with('\u{FFFD}'));
        assert_eq!(verifier().verify_at(&request, NOW), Ok(()));
    }

    #[test]
    fn test_verify_stale_timestamp_is_forbidden() {
        let err = verifier()
            .verify_at(&request(SIGNATURE, TIMESTAMP), NOW + 301)
            .unwrap_err();
        assert!(matches!(err, AuthError::Stale { .. }));
        assert!(err.is_forbidden());
    }

    #[test]
    fn test_verify_missing_headers() {
        let err = verifier()
            .verify_at(&InboundRequest::new(BODY), NOW)
            .unwrap_err();
        assert_eq!(err, AuthError::MissingHeader(SIGNATURE_HEADER));
        assert!(!err.is_forbidden());

        let only_signature = InboundRequest::new(BODY).with_header(SIGNATURE_HEADER, SIGNATURE);
        assert_eq!(
            verifier().verify_at(&only_signature, NOW).unwrap_err(),
            AuthError::MissingHeader(TIMESTAMP_HEADER)
        );
    }

    #[test]
    fn test_verify_malformed_timestamp() {
        let err = verifier()
            .verify_at(&request(SIGNATURE, "yesterday"), NOW)
            .unwrap_err();
        assert_eq!(err, AuthError::MalformedTimestamp("yesterday".into()));
        assert!(!err.is_forbidden());
    }
}
