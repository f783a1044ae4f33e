//! ProviderRegistry lookups

use std::sync::Arc;

use super::test_helpers::MockChain;
use crate::chain::{ChainError, ProviderRegistry};
use crate::types::{AdapterKind, NetworkId, NETWORKS};

#[test]
fn test_registered_provider_is_found_by_network() {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(MockChain::new()));

    let provider = registry.get(NetworkId::Tron).unwrap();
    assert_eq!(provider.network(), NetworkId::Tron);
    assert_eq!(registry.networks(), vec![NetworkId::Tron]);
}

#[test]
fn test_unregistered_network_is_unsupported() {
    let registry = ProviderRegistry::new();

    match registry.get(NetworkId::Ethereum) {
        Err(ChainError::Unsupported(name)) => assert_eq!(name, "ethereum"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("no provider was registered"),
    }
}

#[test]
fn test_registering_twice_replaces() {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(MockChain::new()));
    registry.register(Arc::new(MockChain::new()));

    assert_eq!(registry.networks().len(), 1);
    assert!(format!("{registry:?}").contains("Tron"));
}

#[test]
fn test_only_tron_uses_the_tron_adapter() {
    let tron: Vec<NetworkId> = NETWORKS
        .iter()
        .filter(|n| n.adapter == AdapterKind::Tron)
        .map(|n| n.id)
        .collect();
    assert_eq!(tron, vec![NetworkId::Tron]);
    assert_eq!(NetworkId::Tron.network().coin_id, Some(195));
}
