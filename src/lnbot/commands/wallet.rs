use crate::client::{Connect, WalletApi};
use crate::commands::{CmdMessage, CmdResult, Output, WalletSummary};
use crate::error::{LnbotError, Result};
use crate::model::{CreateWalletParams, UpdateWalletParams};
use crate::registry::{Registry, WalletRecord};
use crate::resolver;
use crate::store::RegistryStore;

/// Creates a wallet on the service and records its credentials locally.
/// Initializes the registry on first use. An explicit name already in the
/// registry is rejected before anything is sent; a clashing name picked by
/// the service gets a numeric suffix.
pub fn create<S: RegistryStore, C: Connect>(
    store: &S,
    connector: &C,
    name: Option<&str>,
) -> Result<CmdResult> {
    let mut registry = store.load()?.unwrap_or_default();
    let name = name.filter(|n| !n.is_empty());
    if let Some(name) = name {
        if registry.get(name).is_some() {
            return Err(LnbotError::Conflict(name.to_string()));
        }
    }

    let anonymous = connector.connect(None)?;
    let created = anonymous
        .create_wallet(&CreateWalletParams {
            name: name.map(str::to_string),
        })
        .map_err(|e| e.context("creating wallet"))?;

    let local_name = match name {
        Some(name) => name.to_string(),
        None => registry.unique_name(&created.name),
    };
    registry.insert(
        local_name.clone(),
        WalletRecord::new(&created.wallet_id, &created.primary_key)
            .with_secondary_key(&created.secondary_key)
            .with_address(&created.address),
    );
    store.save(&registry)?;
    log::debug!("stored wallet {} as {}", created.wallet_id, local_name);

    Ok(CmdResult::new(Output::CreatedWallet(created))
        .with_message(CmdMessage::success("Wallet created")))
}

pub fn list<S: RegistryStore>(store: &S) -> Result<CmdResult> {
    let registry = store.load()?.ok_or(LnbotError::ConfigMissing)?;
    let wallets: Vec<WalletSummary> = registry
        .names()
        .into_iter()
        .filter_map(|name| {
            registry.get(name).map(|record| WalletSummary {
                name: name.to_string(),
                id: record.id.clone(),
                active: registry.active == name,
            })
        })
        .collect();

    let mut result = CmdResult::default();
    if wallets.is_empty() {
        result.add_message(CmdMessage::info(
            "No wallets yet. Run 'lnbot wallet create' to create one.",
        ));
    }
    result.output = Output::Wallets(wallets);
    Ok(result)
}

pub fn use_wallet<S: RegistryStore>(store: &S, name_or_id: &str) -> Result<CmdResult> {
    let mut registry = store.load()?.ok_or(LnbotError::ConfigMissing)?;
    let name = registry.set_active(name_or_id)?;
    store.save(&registry)?;
    Ok(CmdResult::default().with_message(CmdMessage::success(format!("Switched to {}", name))))
}

/// Forgets a wallet locally. The wallet itself keeps existing on the
/// service.
pub fn delete<S: RegistryStore>(store: &S, name: Option<&str>) -> Result<CmdResult> {
    let mut registry = store.load()?.ok_or(LnbotError::ConfigMissing)?;
    let name = registry.resolve(name)?.0.to_string();
    registry.remove(&name)?;
    store.save(&registry)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success("Wallet removed from config"));
    if !registry.active.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "Active wallet is now {}",
            registry.active
        )));
    }
    Ok(result)
}

/// Renames a wallet on the service and in the registry. A local name clash
/// is rejected before anything is sent.
pub fn rename<S: RegistryStore, C: Connect>(
    store: &S,
    connector: &C,
    wallet: Option<&str>,
    new_name: &str,
) -> Result<CmdResult> {
    let registry = store.load()?;
    let (client, credential) = resolver::connect(connector, registry.as_ref(), wallet)?;
    let mut registry: Registry = registry.unwrap_or_default();
    if credential.name != new_name && registry.get(new_name).is_some() {
        return Err(LnbotError::Conflict(new_name.to_string()));
    }

    client
        .update_wallet(&UpdateWalletParams {
            name: new_name.to_string(),
        })
        .map_err(|e| e.context("renaming wallet"))?;

    registry.rename(&credential.name, new_name)?;
    store.save(&registry)?;
    Ok(CmdResult::default().with_message(CmdMessage::success(format!("Renamed to {}", new_name))))
}
