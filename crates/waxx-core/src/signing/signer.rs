//! HMAC-SHA256 request signer.

use crate::{Error, Result};
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use tracing::debug;

use super::canonical::RequestParams;
use super::clock::{Clock, SystemClock};
use super::credential::AppCredential;
use super::nonce::{NonceSource, RandomNonce};

pub const HEADER_TIMESTAMP: &str = "X-Timestamp";
pub const HEADER_NONCE: &str = "X-Nonce";
pub const HEADER_APP_KEY: &str = "X-App-Key";
pub const HEADER_SIGNATURE: &str = "X-Signature";
const HEADER_CONTENT_TYPE: &str = "Content-Type";

/// Authentication headers for exactly one outgoing request.
///
/// Consumed when attached so a value cannot be sent twice.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedRequestHeaders {
    pub timestamp: String,
    pub nonce: String,
    pub app_key: String,
    pub signature: String,
}

impl std::fmt::Debug for SignedRequestHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedRequestHeaders")
            .field("timestamp", &self.timestamp)
            .field("nonce", &self.nonce)
            .field("app_key", &"[REDACTED]")
            .field("signature", &self.signature)
            .finish()
    }
}

impl SignedRequestHeaders {
    /// Header name/value pairs in the order they are sent, including the
    /// fixed JSON content type.
    pub fn into_pairs(self) -> [(&'static str, String); 5] {
        [
            (HEADER_CONTENT_TYPE, "application/json".to_string()),
            (HEADER_TIMESTAMP, self.timestamp),
            (HEADER_NONCE, self.nonce),
            (HEADER_APP_KEY, self.app_key),
            (HEADER_SIGNATURE, self.signature),
        ]
    }

    /// Attach the headers to a request.
    pub fn apply(self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        self.into_pairs()
            .into_iter()
            .fold(request, |request, (name, value)| request.header(name, value))
    }
}

/// Build the message covered by the signature:
/// `timestamp \n nonce \n canonical_query`.
///
/// The second newline is present even when the query is empty.
pub fn message_to_sign(timestamp: &str, nonce: &str, canonical_query: &str) -> String {
    format!("{}\n{}\n{}", timestamp, nonce, canonical_query)
}

/// HMAC-SHA256 of `message` keyed by `secret`, as lowercase hex.
#[allow(clippy::result_large_err)]
pub fn compute_signature(secret: &str, message: &str) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|e| Error::Signing {
        message: format!("Failed to create HMAC: {}", e),
    })?;

    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Signs outgoing API requests.
///
/// Holds no mutable state; share it freely between concurrent requests.
pub struct RequestSigner<C = SystemClock, N = RandomNonce> {
    credential: AppCredential,
    clock: C,
    nonces: N,
}

impl RequestSigner {
    /// Create a signer using wall-clock time and random nonces.
    pub fn new(credential: AppCredential) -> Self {
        Self::with_sources(credential, SystemClock, RandomNonce)
    }
}

impl<C: Clock, N: NonceSource> RequestSigner<C, N> {
    /// Create a signer with explicit time and nonce sources.
    pub fn with_sources(credential: AppCredential, clock: C, nonces: N) -> Self {
        Self {
            credential,
            clock,
            nonces,
        }
    }

    pub fn credential(&self) -> &AppCredential {
        &self.credential
    }

    /// Sign one request with a fresh timestamp and nonce.
    #[allow(clippy::result_large_err)]
    pub fn sign(&self, params: &RequestParams) -> Result<SignedRequestHeaders> {
        let timestamp = self.clock.now_millis().to_string();
        let nonce = self.nonces.nonce();
        self.sign_with(timestamp, nonce, params)
    }

    /// Sign with caller-supplied timestamp and nonce.
    #[allow(clippy::result_large_err)]
    pub fn sign_with(
        &self,
        timestamp: String,
        nonce: String,
        params: &RequestParams,
    ) -> Result<SignedRequestHeaders> {
        let query = params.to_query_string();
        let message = message_to_sign(&timestamp, &nonce, &query);
        let signature = compute_signature(self.credential.secret(), &message)?;

        debug!(
            timestamp = %timestamp,
            nonce = %nonce,
            params = params.len(),
            "Signed request"
        );

        Ok(SignedRequestHeaders {
            timestamp,
            nonce,
            app_key: self.credential.app_key().to_string(),
            signature,
        })
    }
}

impl<C, N> std::fmt::Debug for RequestSigner<C, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::clock::MockClock;
    use crate::signing::nonce::{MockNonceSource, NONCE_ALPHABET, NONCE_LEN};
    use std::sync::Arc;

    const SECRET: &str = "c2add694bf942dc77b376592d9c862c";
    const TIMESTAMP: &str = "1700000000000";
    const NONCE: &str = "AAAAAAAAAAAAAAAA";

    /// HMAC-SHA256("1700000000000\nAAAAAAAAAAAAAAAA\n") keyed by SECRET.
    const EMPTY_PARAMS_SIGNATURE: &str =
        "f72fb5e4c414e9b7ea1ef4d0e89dbe263609294f9f70b4dd0f7847692abc369f";

    fn fixed_signer() -> RequestSigner<MockClock, MockNonceSource> {
        let mut clock = MockClock::new();
        clock.expect_now_millis().return_const(1_700_000_000_000i64);
        let mut nonces = MockNonceSource::new();
        nonces.expect_nonce().returning(|| NONCE.to_string());
        RequestSigner::with_sources(AppCredential::shared(SECRET), clock, nonces)
    }

    #[test]
    fn test_message_for_empty_params_keeps_trailing_newline() {
        let message = message_to_sign(TIMESTAMP, NONCE, "");
        assert_eq!(message, "1700000000000\nAAAAAAAAAAAAAAAA\n");
    }

    #[test]
    fn test_empty_params_signature_fixture() {
        let signer = fixed_signer();
        let headers = signer.sign(&RequestParams::new()).unwrap();

        assert_eq!(headers.timestamp, TIMESTAMP);
        assert_eq!(headers.nonce, NONCE);
        assert_eq!(headers.app_key, SECRET);
        assert_eq!(headers.signature, EMPTY_PARAMS_SIGNATURE);
    }

    #[test]
    fn test_device_info_signature_fixture() {
        let signer = RequestSigner::new(AppCredential::shared(SECRET));
        let params = RequestParams::new().with("deviceMac", "04A1B2C3D4E5F607");

        let headers = signer
            .sign_with(TIMESTAMP.to_string(), NONCE.to_string(), &params)
            .unwrap();

        assert_eq!(
            headers.signature,
            "2293e477c4f35c4dee5821c99cc2b1652adb319dfe9388a6d795709e47461e56"
        );
    }

    #[test]
    fn test_encoded_params_signature_fixture() {
        let signature = compute_signature(
            SECRET,
            &message_to_sign(
                TIMESTAMP,
                NONCE,
                &RequestParams::new().with("q", "a & b=c").to_query_string(),
            ),
        )
        .unwrap();

        assert_eq!(
            signature,
            "af1e026bf34add67ea0a212516e951b752b1b5a4b6a5e7ce98d235ba5f3d5d48"
        );
    }

    #[test]
    fn test_insertion_order_does_not_change_signature() {
        let signer = fixed_signer();
        let forward = RequestParams::new().with("a", "1").with("b", "2");
        let reverse = RequestParams::new().with("b", "2").with("a", "1");

        let first = signer.sign(&forward).unwrap();
        let second = signer.sign(&reverse).unwrap();

        assert_eq!(first.signature, second.signature);
        assert_eq!(
            first.signature,
            "d4607c920f1b707a7146766b55e0358f5859b262766e4a52650c5c995547cb48"
        );
    }

    #[test]
    fn test_signing_is_deterministic_for_fixed_inputs() {
        let signer = RequestSigner::new(AppCredential::shared(SECRET));
        let params = RequestParams::new().with("deviceMac", "ABC");

        let a = signer
            .sign_with(TIMESTAMP.to_string(), NONCE.to_string(), &params)
            .unwrap();
        let b = signer
            .sign_with(TIMESTAMP.to_string(), NONCE.to_string(), &params)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_is_lowercase_hex() {
        let signer = RequestSigner::new(AppCredential::shared(SECRET));
        let headers = signer.sign(&RequestParams::new()).unwrap();

        assert_eq!(headers.signature.len(), 64);
        assert!(headers
            .signature
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_live_sign_uses_fresh_timestamp_and_nonce() {
        let signer = RequestSigner::new(AppCredential::shared(SECRET));
        let headers = signer.sign(&RequestParams::new()).unwrap();

        let millis: i64 = headers.timestamp.parse().unwrap();
        assert!(millis > 1_700_000_000_000);
        assert_eq!(headers.nonce.len(), NONCE_LEN);
        assert!(headers.nonce.bytes().all(|b| NONCE_ALPHABET.contains(&b)));

        // Recomputing from the emitted values reproduces the signature
        let expected = compute_signature(
            SECRET,
            &message_to_sign(&headers.timestamp, &headers.nonce, ""),
        )
        .unwrap();
        assert_eq!(headers.signature, expected);
    }

    #[test]
    fn test_separate_app_key_is_sent() {
        let signer = RequestSigner::new(AppCredential::new(SECRET, "public-id"));
        let headers = signer
            .sign_with(TIMESTAMP.to_string(), NONCE.to_string(), &RequestParams::new())
            .unwrap();

        assert_eq!(headers.app_key, "public-id");
        // Key material is the secret, not the app key
        assert_eq!(headers.signature, EMPTY_PARAMS_SIGNATURE);
    }

    #[test]
    fn test_header_pairs() {
        let headers = fixed_signer().sign(&RequestParams::new()).unwrap();
        let pairs = headers.into_pairs();

        assert_eq!(pairs[0], ("Content-Type", "application/json".to_string()));
        assert_eq!(pairs[1], (HEADER_TIMESTAMP, TIMESTAMP.to_string()));
        assert_eq!(pairs[2], (HEADER_NONCE, NONCE.to_string()));
        assert_eq!(pairs[3], (HEADER_APP_KEY, SECRET.to_string()));
        assert_eq!(pairs[4], (HEADER_SIGNATURE, EMPTY_PARAMS_SIGNATURE.to_string()));
    }

    #[test]
    fn test_apply_sets_headers_on_request() {
        let headers = fixed_signer().sign(&RequestParams::new()).unwrap();
        let request = headers
            .apply(reqwest::Client::new().get("https://example.com/getAllBrand"))
            .build()
            .unwrap();

        let h = request.headers();
        assert_eq!(h["content-type"], "application/json");
        assert_eq!(h["x-timestamp"], TIMESTAMP);
        assert_eq!(h["x-nonce"], NONCE);
        assert_eq!(h["x-app-key"], SECRET);
        assert_eq!(h["x-signature"], EMPTY_PARAMS_SIGNATURE);
    }

    #[test]
    fn test_debug_does_not_expose_app_key() {
        let headers = fixed_signer().sign(&RequestParams::new()).unwrap();
        assert!(!format!("{:?}", headers).contains(SECRET));
        assert!(!format!("{:?}", fixed_signer()).contains(SECRET));
    }

    #[test]
    fn test_concurrent_signing_yields_distinct_nonces() {
        let signer = Arc::new(RequestSigner::new(AppCredential::shared(SECRET)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let signer = Arc::clone(&signer);
                std::thread::spawn(move || signer.sign(&RequestParams::new()).unwrap().nonce)
            })
            .collect();

        let mut nonces: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        nonces.sort();
        nonces.dedup();
        assert_eq!(nonces.len(), 8);
    }
}
