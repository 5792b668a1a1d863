use crate::client::WalletApi;
use crate::commands::{CmdMessage, CmdResult, Output};
use crate::error::{LnbotError, Result};
use crate::format::sats;
use crate::model::{CreateAddressParams, TransferAddressParams};
use crate::registry::Registry;
use crate::resolver;

pub fn list<C: WalletApi>(client: &C) -> Result<CmdResult> {
    let addresses = client
        .list_addresses()
        .map_err(|e| e.context("listing addresses"))?;
    let mut result = CmdResult::default();
    if addresses.is_empty() {
        result.add_message(CmdMessage::info("No addresses yet."));
    }
    result.output = Output::Addresses(addresses);
    Ok(result)
}

/// Claims `name@ln.bot`. Any cost is taken from the wallet balance.
pub fn buy<C: WalletApi>(client: &C, name: &str) -> Result<CmdResult> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LnbotError::Invalid("address name must not be empty".into()));
    }
    let address = client
        .create_address(&CreateAddressParams {
            address: Some(name.to_string()),
        })
        .map_err(|e| e.context("claiming address"))?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Address claimed: {}",
        address.address
    )));
    if address.cost > 0 {
        result.add_message(CmdMessage::info(format!("cost: {}", sats(address.cost))));
    }
    result.output = Output::Address(address);
    Ok(result)
}

pub fn buy_prompt(name: &str) -> String {
    format!("Claim {}@ln.bot?", name.trim())
}

/// Where an address is moved to: a wallet from the registry, or any
/// wallet whose API key is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferTarget {
    Wallet(String),
    Key(String),
}

impl TransferTarget {
    /// An explicit key wins over a wallet name.
    pub fn from_flags(to: Option<&str>, target_key: Option<&str>) -> Result<Self> {
        let to = to.filter(|s| !s.is_empty());
        let target_key = target_key.filter(|s| !s.is_empty());
        match (to, target_key) {
            (_, Some(key)) => Ok(TransferTarget::Key(key.to_string())),
            (Some(name), None) => Ok(TransferTarget::Wallet(name.to_string())),
            (None, None) => Err(LnbotError::Invalid(
                "specify --to <wallet-name> or --target-key <api-key>".into(),
            )),
        }
    }

    /// The receiving wallet's API key.
    pub fn key(&self, registry: Option<&Registry>) -> Result<String> {
        match self {
            TransferTarget::Key(key) => Ok(key.clone()),
            TransferTarget::Wallet(name) => {
                Ok(resolver::resolve(registry, Some(name))?.record.primary_key)
            }
        }
    }

    pub fn prompt(&self, address: &str) -> String {
        match self {
            TransferTarget::Wallet(name) => format!("Transfer {} to '{}'?", address, name),
            TransferTarget::Key(_) => format!("Transfer {} to another wallet?", address),
        }
    }
}

pub fn transfer<C: WalletApi>(client: &C, address: &str, target_key: &str) -> Result<CmdResult> {
    let transfer = client
        .transfer_address(
            address,
            &TransferAddressParams {
                target_wallet_key: target_key.to_string(),
            },
        )
        .map_err(|e| e.context("transferring address"))?;
    let message = CmdMessage::success(format!(
        "Transferred {} to wallet {}",
        transfer.address, transfer.transferred_to
    ));
    Ok(CmdResult::new(Output::Transfer(transfer)).with_message(message))
}

pub fn delete<C: WalletApi>(client: &C, address: &str) -> Result<CmdResult> {
    client
        .delete_address(address)
        .map_err(|e| e.context("deleting address"))?;
    Ok(CmdResult::default().with_message(CmdMessage::success("Address deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::WalletRecord;
    use crate::test_utils::MockClient;

    #[test]
    fn buy_reports_claimed_address() {
        let client = MockClient::new();
        let result = buy(&client, "alice").unwrap();
        assert_eq!(result.messages[0].content, "Address claimed: alice@ln.bot");
        assert_eq!(result.messages.len(), 1);
        assert_eq!(buy_prompt("alice"), "Claim alice@ln.bot?");
    }

    #[test]
    fn transfer_target_needs_a_flag() {
        let err = TransferTarget::from_flags(None, Some("")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "specify --to <wallet-name> or --target-key <api-key>"
        );
    }

    #[test]
    fn transfer_target_by_wallet_name() {
        let mut registry = Registry::new();
        registry.insert("main", WalletRecord::new("wal_main", "key_main"));
        registry.insert("agent02", WalletRecord::new("wal_agent", "key_agent"));

        let target = TransferTarget::from_flags(Some("agent02"), None).unwrap();
        assert_eq!(target.key(Some(&registry)).unwrap(), "key_agent");
        assert_eq!(target.prompt("alice"), "Transfer alice to 'agent02'?");

        let missing = TransferTarget::Wallet("ghost".into());
        assert!(matches!(
            missing.key(Some(&registry)),
            Err(LnbotError::NotFound(_))
        ));
    }

    #[test]
    fn explicit_key_wins() {
        let target = TransferTarget::from_flags(Some("agent02"), Some("key_x")).unwrap();
        assert_eq!(target, TransferTarget::Key("key_x".into()));
        assert_eq!(target.key(None).unwrap(), "key_x");
        assert_eq!(target.prompt("alice"), "Transfer alice to another wallet?");
    }

    #[test]
    fn transfer_sends_target_key() {
        let client = MockClient::new();
        let result = transfer(&client, "alice@ln.bot", "key_agent").unwrap();
        let (address, params) = client.state().last_transfer.clone().unwrap();
        assert_eq!(address, "alice@ln.bot");
        assert_eq!(params.target_wallet_key, "key_agent");
        assert_eq!(
            result.messages[0].content,
            "Transferred alice@ln.bot to wallet wal_target"
        );
    }

    #[test]
    fn delete_failure_carries_action() {
        let client = MockClient::new();
        client.fail("delete_address", 404, "address not found");
        let err = delete(&client, "bob").unwrap_err();
        assert_eq!(err.to_string(), "deleting address: address not found");
    }
}
