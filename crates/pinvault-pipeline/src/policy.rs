//! Password acceptance rules applied before any key derivation

use pinvault_core::config::CryptoConfig;
use pinvault_crypto::Password;
use secrecy::ExposeSecret;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Minimum length in characters (default: 1, i.e. non-empty)
    pub min_len: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_len: 1 }
    }
}

impl From<&CryptoConfig> for PasswordPolicy {
    fn from(cfg: &CryptoConfig) -> Self {
        Self {
            min_len: cfg.min_password_len,
        }
    }
}

impl PasswordPolicy {
    /// Returns a human-readable reason when the password is refused.
    pub fn check(&self, password: &Password) -> Result<(), String> {
        let len = password.expose_secret().chars().count();
        if len == 0 && self.min_len > 0 {
            return Err("password is empty".into());
        }
        if len < self.min_len {
            return Err(format!(
                "password must be at least {} characters",
                self.min_len
            ));
        }
        Ok(())
    }
}
