//! Turns "which wallet?" into credentials and a connected client.

use crate::client::Connect;
use crate::error::{LnbotError, Result};
use crate::registry::{Registry, WalletRecord};

/// A resolved wallet: its registry name and stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub name: String,
    pub record: WalletRecord,
}

/// Picks the wallet named `explicit`, or the active one.
///
/// `None` for the registry means it was never initialized.
pub fn resolve(registry: Option<&Registry>, explicit: Option<&str>) -> Result<Credential> {
    let registry = registry.ok_or(LnbotError::ConfigMissing)?;
    let (name, record) = registry.resolve(explicit)?;
    log::debug!("using wallet {} ({})", name, record.id);
    Ok(Credential {
        name: name.to_string(),
        record: record.clone(),
    })
}

/// Resolves a wallet and builds a client authenticated with its primary key.
pub fn connect<C: Connect>(
    connector: &C,
    registry: Option<&Registry>,
    explicit: Option<&str>,
) -> Result<(C::Client, Credential)> {
    let credential = resolve(registry, explicit)?;
    let client = connector.connect(Some(&credential.record.primary_key))?;
    Ok((client, credential))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockConnector;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.insert("main", WalletRecord::new("wal_main", "key_main"));
        registry.insert("other", WalletRecord::new("wal_other", "key_other"));
        registry
    }

    #[test]
    fn missing_registry_is_config_missing() {
        assert!(matches!(resolve(None, None), Err(LnbotError::ConfigMissing)));
        assert!(matches!(
            resolve(None, Some("main")),
            Err(LnbotError::ConfigMissing)
        ));
    }

    #[test]
    fn active_and_explicit_resolve_the_same() {
        let registry = registry();
        let implicit = resolve(Some(&registry), None).unwrap();
        let explicit = resolve(Some(&registry), Some(&registry.active)).unwrap();
        assert_eq!(implicit, explicit);
        assert_eq!(implicit.name, "main");
    }

    #[test]
    fn explicit_unknown_name() {
        let err = resolve(Some(&registry()), Some("ghost")).unwrap_err();
        assert!(matches!(err, LnbotError::NotFound(name) if name == "ghost"));
    }

    #[test]
    fn connect_uses_primary_key() {
        let connector = MockConnector::new();
        let (_client, credential) = connect(&connector, Some(&registry()), Some("other")).unwrap();
        assert_eq!(credential.record.id, "wal_other");
        assert_eq!(connector.connected_keys(), vec![Some("key_other".to_string())]);
    }

    #[test]
    fn connect_does_not_build_client_on_resolution_failure() {
        let connector = MockConnector::new();
        let mut registry = registry();
        registry.active.clear();
        assert!(matches!(
            connect(&connector, Some(&registry), None),
            Err(LnbotError::NoActiveWallet)
        ));
        assert!(connector.connected_keys().is_empty());
    }
}
