//! Recovery passphrases: generating one for an existing wallet and
//! restoring access from one.
//!
//! Restoring rotates every API key of the wallet on the service, so the
//! registry is loaded before the call; a broken config file is reported
//! before any key is invalidated.

use crate::client::{Connect, WalletApi};
use crate::commands::account::first_address;
use crate::commands::{CmdMessage, CmdResult, Output, RestoreReport};
use crate::error::{LnbotError, Result};
use crate::model::RestoreParams;
use crate::registry::WalletRecord;
use crate::store::RegistryStore;

const PASSKEY_HINT: &str = "use the web terminal at https://ln.bot";

pub fn backup<C: WalletApi>(client: &C) -> Result<CmdResult> {
    let backup = client
        .backup_recovery()
        .map_err(|e| e.context("generating recovery passphrase"))?;
    Ok(CmdResult::new(Output::Recovery(backup)))
}

/// Passkeys need WebAuthn in a browser.
pub fn passkey() -> Result<CmdResult> {
    Err(LnbotError::Unsupported(PASSKEY_HINT.to_string()))
}

pub fn restore<S: RegistryStore, C: Connect>(
    store: &S,
    connector: &C,
    passphrase: &str,
) -> Result<CmdResult> {
    let passphrase = passphrase.trim();
    if passphrase.is_empty() {
        return Err(LnbotError::Invalid("--passphrase is required".into()));
    }
    let mut registry = store.load()?.unwrap_or_default();

    let anonymous = connector.connect(None)?;
    let restored = anonymous
        .restore_recovery(&RestoreParams {
            passphrase: passphrase.to_string(),
        })
        .map_err(|e| e.context("restoring wallet"))?;

    let name = match registry.name_for_id(&restored.wallet_id) {
        Some(existing) => existing.to_string(),
        None => {
            let base = if restored.name.is_empty() {
                "restored"
            } else {
                restored.name.as_str()
            };
            registry.unique_name(base)
        }
    };
    registry.insert(
        name.clone(),
        WalletRecord::new(&restored.wallet_id, &restored.primary_key)
            .with_secondary_key(&restored.secondary_key),
    );
    registry.set_active(&name)?;
    store.save(&registry)?;
    log::debug!("restored {} as {}", restored.wallet_id, name);

    let address = connector
        .connect(Some(&restored.primary_key))
        .ok()
        .and_then(|client| first_address(&client));

    Ok(CmdResult::new(Output::Restored(RestoreReport {
        restored,
        name,
        address,
    }))
    .with_message(CmdMessage::success("Wallet restored")))
}
