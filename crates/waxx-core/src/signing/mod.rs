//! Request signing for the Waxx API.
//!
//! Every call to the external API carries four authentication headers:
//! a millisecond timestamp, a 16-character nonce, the public app key, and an
//! HMAC-SHA256 signature over the timestamp, nonce and canonical query string.
//!
//! # Architecture
//!
//! ```text
//! RequestParams ── canonicalize ──► "a=1&b=2"
//!                                        │
//! Clock ──► timestamp ─┐                 │
//!                      ▼                 ▼
//! NonceSource ──► RequestSigner ── HMAC-SHA256(secret) ──► SignedRequestHeaders
//!                      ▲                                          │
//!                 AppCredential                                   ▼
//!                                                            WaxxClient
//! ```
//!
//! # Example
//!
//! ```ignore
//! use waxx_core::signing::{AppCredential, RequestParams, RequestSigner};
//!
//! let signer = RequestSigner::new(AppCredential::shared("secret"));
//! let params = RequestParams::new().with("deviceMac", "04A1B2C3D4E5F607");
//! let headers = signer.sign(&params)?;
//! ```

pub mod canonical;
pub mod clock;
pub mod credential;
pub mod nonce;
pub mod signer;

pub use canonical::{encode_component, RequestParams};
pub use clock::{Clock, SystemClock};
pub use credential::AppCredential;
pub use nonce::{NonceSource, RandomNonce, NONCE_ALPHABET, NONCE_LEN};
pub use signer::{
    compute_signature, message_to_sign, RequestSigner, SignedRequestHeaders, HEADER_APP_KEY,
    HEADER_NONCE, HEADER_SIGNATURE, HEADER_TIMESTAMP,
};
