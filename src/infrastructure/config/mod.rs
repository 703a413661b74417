mod settings;

pub use settings::{ImportConfig, ServerConfig, Settings};

use keyring::Entry;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::api_client::AuthToken;

const KEYRING_SERVICE: &str = "RosterImport";
const TOKEN_KEY: &str = "api_token";

/// Backend token kept in the OS keychain, so the service can submit
/// batches when the caller does not forward its own bearer token.
pub struct ConfigService {
    token_entry: Entry,
}

impl ConfigService {
    /// Use the platform credential store
    pub fn new() -> Result<Self> {
        let token_entry = Entry::new(KEYRING_SERVICE, TOKEN_KEY)
            .map_err(|e| AppError::SecurityError(format!("Failed to create entry: {}", e)))?;
        Ok(Self { token_entry })
    }

    pub fn with_entry(token_entry: Entry) -> Self {
        Self { token_entry }
    }

    pub fn save_api_token(&self, token: &AuthToken) -> Result<()> {
        self.token_entry
            .set_password(token.as_str())
            .map_err(|e| AppError::SecurityError(format!("Failed to store token: {}", e)))
    }

    /// Stored token, `None` when nothing usable is saved
    pub fn get_api_token(&self) -> Option<AuthToken> {
        match self.token_entry.get_password() {
            Ok(secret) => AuthToken::new(secret),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored API token");
                None
            }
        }
    }

    pub fn delete_api_token(&self) -> Result<()> {
        match self.token_entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AppError::SecurityError(format!(
                "Failed to delete token: {}",
                e
            ))),
        }
    }
}

#[cfg(test)]
pub(crate) fn in_memory_config_service() -> ConfigService {
    use keyring::mock::MockCredential;
    ConfigService::with_entry(Entry::new_with_credential(Box::new(MockCredential::default())))
}
