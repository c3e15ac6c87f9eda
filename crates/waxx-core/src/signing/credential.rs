//! Pre-shared application credential.

/// Static secret / app key pair issued for this client.
///
/// The secret keys the HMAC. The app key is sent in cleartext as
/// `X-App-Key`; the deployed verifier expects it to equal the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AppCredential {
    secret: String,
    app_key: String,
}

impl std::fmt::Debug for AppCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredential")
            .field("secret", &"[REDACTED]")
            .field("app_key", &"[REDACTED]")
            .finish()
    }
}

impl AppCredential {
    /// Create a credential with a distinct app key.
    pub fn new(secret: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            app_key: app_key.into(),
        }
    }

    /// Create a credential whose app key is the secret itself.
    pub fn shared(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        Self {
            app_key: secret.clone(),
            secret,
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }
}
