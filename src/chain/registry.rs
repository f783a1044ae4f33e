use std::collections::HashMap;
use std::sync::Arc;

use super::{ChainError, ChainResourceProvider};
use crate::types::NetworkId;

/// Providers keyed by network identifier
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<NetworkId, Arc<dyn ChainResourceProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under the network it reports; replaces any previous one
    pub fn register(&mut self, provider: Arc<dyn ChainResourceProvider>) {
        let network = provider.network();
        if self.providers.insert(network, provider).is_some() {
            tracing::debug!(network = %network, "Replaced chain provider");
        }
    }

    pub fn get(&self, network: NetworkId) -> Result<Arc<dyn ChainResourceProvider>, ChainError> {
        self.providers
            .get(&network)
            .cloned()
            .ok_or_else(|| ChainError::Unsupported(network.to_string()))
    }

    pub fn networks(&self) -> Vec<NetworkId> {
        let mut ids: Vec<NetworkId> = self.providers.keys().copied().collect();
        ids.sort_by_key(|id| id.as_str());
        ids
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("networks", &self.networks())
            .finish()
    }
}
