//! Credential providers

use async_trait::async_trait;
use eightkit_core::{Credentials, Result};

/// Supplies host URL and API key; asked again before every attempt.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credentials(&self) -> Result<Credentials>;
}

#[async_trait]
impl CredentialProvider for Credentials {
    async fn credentials(&self) -> Result<Credentials> {
        Ok(self.clone())
    }
}
