//! Connection secret for the device socket.

use crate::error::config::ConfigError;
use crate::settings::SettingsState;

use common::RedactedSecret;

use std::sync::Arc;

use log::info;
use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::sync::OnceCell;

pub const SECRET_LENGTH: usize = 32;

/// Issues the single valid socket secret and reports the auth override.
///
/// The secret is generated on first use and persisted through
/// [`SettingsState`]; later runs reuse it. It is never rotated.
#[derive(Clone)]
pub struct CredentialStore {
    settings: SettingsState,
    secret: Arc<OnceCell<RedactedSecret>>,
}

impl CredentialStore {
    pub fn new(settings: SettingsState) -> Self {
        Self {
            settings,
            secret: Arc::new(OnceCell::new()),
        }
    }

    pub async fn get_secret(&self) -> Result<&RedactedSecret, ConfigError> {
        self.secret
            .get_or_try_init(|| async {
                if let Some(existing) = self.settings.snapshot().await.socket_password
                    && !existing.is_empty()
                {
                    return Ok::<_, ConfigError>(RedactedSecret::new(existing));
                }

                let generated = generate_secret();
                self.settings
                    .set_socket_password(generated.clone())
                    .await?;
                info!("Generated new socket secret");
                Ok(RedactedSecret::new(generated))
            })
            .await
    }

    pub async fn is_auth_disabled(&self) -> bool {
        self.settings.disable_socket_auth().await
    }

    /// Constant-time comparison against the current secret.
    pub async fn verify(&self, candidate: &str) -> Result<bool, ConfigError> {
        Ok(self.get_secret().await?.matches(candidate))
    }
}

pub(crate) fn generate_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LENGTH)
        .map(char::from)
        .collect()
}
