//! Nonce generation for signed requests.

use rand::Rng;

/// Symbols a nonce is drawn from.
pub const NONCE_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of every nonce, in characters.
pub const NONCE_LEN: usize = 16;

/// Supplies a fresh nonce for each signed request.
#[cfg_attr(test, mockall::automock)]
pub trait NonceSource: Send + Sync {
    fn nonce(&self) -> String;
}

/// Nonces sampled uniformly, with replacement, from [`NONCE_ALPHABET`].
///
/// Uses the calling thread's RNG, so concurrent callers never share state.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonce;

impl RandomNonce {
    /// Generate a nonce from the given RNG.
    pub fn generate<R: Rng>(rng: &mut R) -> String {
        (0..NONCE_LEN)
            .map(|_| NONCE_ALPHABET[rng.gen_range(0..NONCE_ALPHABET.len())] as char)
            .collect()
    }
}

impl NonceSource for RandomNonce {
    fn nonce(&self) -> String {
        Self::generate(&mut rand::thread_rng())
    }
}

impl<N: NonceSource + ?Sized> NonceSource for &N {
    fn nonce(&self) -> String {
        (**self).nonce()
    }
}
