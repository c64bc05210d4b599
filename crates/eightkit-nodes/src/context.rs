//! Node execution context
//!
//! Everything a node needs from its host: the transport used to reach the
//! API, where credentials come from, and the default client tuning.

use std::sync::Arc;

use eightkit_client::{ApiClient, CredentialProvider, HttpTransport};
use eightkit_core::ClientConfig;

/// Per-run execution context
#[derive(Clone)]
pub struct NodeContext {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialProvider>,
    config: ClientConfig,
    /// Execution ID (unique per run)
    execution_id: String,
}

impl NodeContext {
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            transport,
            credentials,
            config: ClientConfig::default(),
            execution_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Replace the default client tuning
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub fn config(&self) -> ClientConfig {
        self.config
    }

    /// Client with the default tuning
    pub fn client(&self) -> ApiClient {
        self.client_with(self.config)
    }

    /// Client with per-item tuning
    pub fn client_with(&self, config: ClientConfig) -> ApiClient {
        ApiClient::new(self.transport.clone(), self.credentials.clone(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eightkit_client::testing::MockTransport;
    use eightkit_core::Credentials;

    #[test]
    fn test_execution_ids_are_unique() {
        let transport = Arc::new(MockTransport::new());
        let credentials = Arc::new(Credentials::new("http://localhost:3000", "key"));
        let a = NodeContext::new(transport.clone(), credentials.clone());
        let b = NodeContext::new(transport, credentials);
        assert_ne!(a.execution_id(), b.execution_id());
        assert!(uuid::Uuid::parse_str(a.execution_id()).is_ok());
    }

    #[test]
    fn test_client_uses_context_config() {
        let ctx = NodeContext::new(
            Arc::new(MockTransport::new()),
            Arc::new(Credentials::new("http://localhost:3000", "key")),
        )
        .with_config(ClientConfig::default().with_max_retries(0));

        assert_eq!(ctx.client().config().max_retries, 0);
        let tuned = ClientConfig::default().with_timeout_ms(5);
        assert_eq!(ctx.client_with(tuned).config().timeout_ms, 5);
    }
}
