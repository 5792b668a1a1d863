use crate::client::{Connect, WalletApi};
use crate::commands::{CmdMessage, CmdResult, Output};
use crate::error::{LnbotError, Result};
use crate::model::KeySlot;
use crate::resolver::{self, Credential};
use crate::store::RegistryStore;

pub fn parse_slot(input: &str) -> Result<KeySlot> {
    KeySlot::parse(input)
        .ok_or_else(|| LnbotError::Invalid("slot must be 0 (primary) or 1 (secondary)".into()))
}

/// Shows the locally stored keys in full.
pub fn show(credential: &Credential) -> CmdResult {
    CmdResult::new(Output::Keys {
        primary: credential.record.primary_key.clone(),
        secondary: credential.record.secondary_key.clone(),
    })
}

/// Rotates one key on the service and stores the replacement. The old
/// key stops working as soon as the call succeeds.
pub fn rotate<S: RegistryStore, C: Connect>(
    store: &S,
    connector: &C,
    wallet: Option<&str>,
    slot: KeySlot,
) -> Result<CmdResult> {
    let registry = store.load()?;
    let (client, credential) = resolver::connect(connector, registry.as_ref(), wallet)?;
    let mut registry = registry.ok_or(LnbotError::ConfigMissing)?;

    let rotated = client
        .rotate_key(slot)
        .map_err(|e| e.context("rotating key"))?;

    let record = registry.record_mut(&credential.name)?;
    match slot {
        KeySlot::Primary => record.primary_key = rotated.key.clone(),
        KeySlot::Secondary => record.secondary_key = Some(rotated.key.clone()),
    }
    // The old key no longer works from here on.
    store
        .save(&registry)
        .map_err(|e| LnbotError::RotatedKeyNotSaved {
            key: rotated.key.clone(),
            source: Box::new(e),
        })?;
    log::debug!("rotated {} key of {}", slot.label(), credential.name);

    Ok(CmdResult::new(Output::RotatedKey {
        slot,
        key: rotated.key,
    })
    .with_message(CmdMessage::success(match slot {
        KeySlot::Primary => "Primary key rotated",
        KeySlot::Secondary => "Secondary key rotated",
    })))
}
