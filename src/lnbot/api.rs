//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer. It serves as the
//! single entry point for every lnbot operation, regardless of the UI being
//! used.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Dispatches** to the appropriate command function
//! - **Resolves wallets**: `--wallet` names (or the active wallet) become a
//!   connected client through the [`Connect`] seam
//! - **Validates early**: amounts and slots are checked before any
//!   connection is made
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: That belongs in `commands/*.rs`
//! - **I/O operations**: No stdout, stderr, prompts or signal handling
//! - **Presentation concerns**: Returns data structures, not strings
//!
//! ## Generic Over Store and Connector
//!
//! `LnbotApi<S: RegistryStore, C: Connect>`:
//! - Production: `LnbotApi<FileStore, HttpConnector>`
//! - Testing: `LnbotApi<InMemoryStore, MockConnector>`
//!
//! Every method that talks to the service loads the registry afresh, so
//! calls are independent of each other.

use crate::client::Connect;
use crate::commands::{self, CmdResult};
use crate::error::Result;
use crate::model::{Invoice, KeySlot};
use crate::resolver::{self, Credential};
use crate::store::RegistryStore;
use crate::watch::CancelSignal;

pub use crate::commands::address::TransferTarget;
pub use crate::commands::pay::PaymentRequest;
pub use crate::commands::{CmdMessage, MessageLevel, Output};

pub struct LnbotApi<S: RegistryStore, C: Connect> {
    store: S,
    connector: C,
    api_url: String,
}

impl<S: RegistryStore, C: Connect> LnbotApi<S, C> {
    pub fn new(store: S, connector: C, api_url: impl Into<String>) -> Self {
        Self {
            store,
            connector,
            api_url: api_url.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The wallet `--wallet` names, or the active one.
    pub fn resolve(&self, wallet: Option<&str>) -> Result<Credential> {
        let registry = self.store.load()?;
        resolver::resolve(registry.as_ref(), wallet)
    }

    fn connect(&self, wallet: Option<&str>) -> Result<(C::Client, Credential)> {
        let registry = self.store.load()?;
        resolver::connect(&self.connector, registry.as_ref(), wallet)
    }

    // --- Registry ---

    pub fn init(&self) -> Result<CmdResult> {
        commands::init::run(&self.store)
    }

    pub fn wallet_create(&self, name: Option<&str>) -> Result<CmdResult> {
        commands::wallet::create(&self.store, &self.connector, name)
    }

    pub fn wallet_list(&self) -> Result<CmdResult> {
        commands::wallet::list(&self.store)
    }

    pub fn wallet_use(&self, name_or_id: &str) -> Result<CmdResult> {
        commands::wallet::use_wallet(&self.store, name_or_id)
    }

    pub fn wallet_delete(&self, name: Option<&str>) -> Result<CmdResult> {
        commands::wallet::delete(&self.store, name)
    }

    pub fn wallet_rename(&self, wallet: Option<&str>, new_name: &str) -> Result<CmdResult> {
        commands::wallet::rename(&self.store, &self.connector, wallet, new_name)
    }

    // --- Account ---

    pub fn balance(&self, wallet: Option<&str>) -> Result<CmdResult> {
        let (client, _) = self.connect(wallet)?;
        commands::account::balance(&client)
    }

    pub fn status(&self, wallet: Option<&str>) -> Result<CmdResult> {
        let (client, credential) = self.connect(wallet)?;
        commands::account::status(&client, &credential)
    }

    pub fn whoami(&self, wallet: Option<&str>, lookup_address: bool) -> Result<CmdResult> {
        let (client, credential) = self.connect(wallet)?;
        commands::account::whoami(&client, &credential, lookup_address)
    }

    // --- Invoices and payments ---

    pub fn invoice_create(
        &self,
        wallet: Option<&str>,
        amount: i64,
        memo: Option<&str>,
    ) -> Result<CmdResult> {
        commands::invoice::validate_amount(amount)?;
        let (client, _) = self.connect(wallet)?;
        commands::invoice::create(&client, amount, memo)
    }

    /// Blocks until `invoice` settles, expires, fails or `cancel` fires.
    pub fn invoice_wait(
        &self,
        wallet: Option<&str>,
        invoice: Invoice,
        cancel: &CancelSignal,
    ) -> Result<CmdResult> {
        let (client, _) = self.connect(wallet)?;
        commands::invoice::wait(&client, invoice, cancel)
    }

    pub fn invoice_list(&self, wallet: Option<&str>, limit: u32) -> Result<CmdResult> {
        let (client, _) = self.connect(wallet)?;
        commands::invoice::list(&client, limit)
    }

    pub fn pay(
        &self,
        wallet: Option<&str>,
        request: &PaymentRequest,
        cancel: &CancelSignal,
    ) -> Result<CmdResult> {
        let (client, _) = self.connect(wallet)?;
        commands::pay::run(&client, request, cancel)
    }

    pub fn payment_list(
        &self,
        wallet: Option<&str>,
        limit: u32,
        after: Option<u64>,
    ) -> Result<CmdResult> {
        let (client, _) = self.connect(wallet)?;
        commands::ledger::payments(&client, limit, after)
    }

    pub fn transactions(&self, wallet: Option<&str>, limit: u32) -> Result<CmdResult> {
        let (client, _) = self.connect(wallet)?;
        commands::ledger::transactions(&client, limit)
    }

    // --- Keys and recovery ---

    pub fn key_show(&self, wallet: Option<&str>) -> Result<CmdResult> {
        Ok(commands::keys::show(&self.resolve(wallet)?))
    }

    pub fn key_rotate(&self, wallet: Option<&str>, slot: KeySlot) -> Result<CmdResult> {
        commands::keys::rotate(&self.store, &self.connector, wallet, slot)
    }

    pub fn backup_recovery(&self, wallet: Option<&str>) -> Result<CmdResult> {
        let (client, _) = self.connect(wallet)?;
        commands::recovery::backup(&client)
    }

    pub fn backup_passkey(&self) -> Result<CmdResult> {
        commands::recovery::passkey()
    }

    pub fn restore_recovery(&self, passphrase: &str) -> Result<CmdResult> {
        commands::recovery::restore(&self.store, &self.connector, passphrase)
    }

    pub fn restore_passkey(&self) -> Result<CmdResult> {
        commands::recovery::passkey()
    }

    // --- Addresses ---

    pub fn address_list(&self, wallet: Option<&str>) -> Result<CmdResult> {
        let (client, _) = self.connect(wallet)?;
        commands::address::list(&client)
    }

    pub fn address_buy(&self, wallet: Option<&str>, name: &str) -> Result<CmdResult> {
        let (client, _) = self.connect(wallet)?;
        commands::address::buy(&client, name)
    }

    /// The API key `target` stands for; fails for unknown wallet names.
    pub fn transfer_key(&self, target: &TransferTarget) -> Result<String> {
        let registry = self.store.load()?;
        target.key(registry.as_ref())
    }

    pub fn address_transfer(
        &self,
        wallet: Option<&str>,
        address: &str,
        target_key: &str,
    ) -> Result<CmdResult> {
        let (client, _) = self.connect(wallet)?;
        commands::address::transfer(&client, address, target_key)
    }

    pub fn address_delete(&self, wallet: Option<&str>, address: &str) -> Result<CmdResult> {
        let (client, _) = self.connect(wallet)?;
        commands::address::delete(&client, address)
    }

    // --- Webhooks ---

    pub fn webhook_create(&self, wallet: Option<&str>, url: &str) -> Result<CmdResult> {
        let (client, _) = self.connect(wallet)?;
        commands::webhook::create(&client, url)
    }

    pub fn webhook_list(&self, wallet: Option<&str>) -> Result<CmdResult> {
        let (client, _) = self.connect(wallet)?;
        commands::webhook::list(&client)
    }

    pub fn webhook_delete(&self, wallet: Option<&str>, id: &str) -> Result<CmdResult> {
        let (client, _) = self.connect(wallet)?;
        commands::webhook::delete(&client, id)
    }

    // --- MCP ---

    pub fn mcp_config(&self, wallet: Option<&str>, remote: bool) -> Result<CmdResult> {
        if !remote {
            return Ok(commands::mcp::local_config());
        }
        let credential = self.resolve(wallet)?;
        Ok(commands::mcp::remote_config(&self.api_url, &credential))
    }

    pub fn mcp_serve(&self) -> CmdResult {
        commands::mcp::serve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LnbotError;
    use crate::model::{ListParams, ResourceStatus, Wallet};
    use crate::registry::{Registry, WalletRecord};
    use crate::store::memory::InMemoryStore;
    use crate::test_utils::MockConnector;

    fn api() -> LnbotApi<InMemoryStore, MockConnector> {
        let mut registry = Registry::new();
        registry.insert("main", WalletRecord::new("wal_main", "key_main"));
        registry.insert("agent02", WalletRecord::new("wal_agent", "key_agent"));
        LnbotApi::new(
            InMemoryStore::with_registry(registry),
            MockConnector::new(),
            "https://api.ln.bot",
        )
    }

    #[test]
    fn wallet_flag_selects_the_key() {
        let api = api();
        api.connector.client().state().wallet = Wallet {
            balance: 42,
            ..Wallet::default()
        };
        api.balance(Some("agent02")).unwrap();
        api.balance(None).unwrap();
        assert_eq!(
            api.connector.connected_keys(),
            vec![
                Some("key_agent".to_string()),
                Some("key_main".to_string())
            ]
        );
    }

    #[test]
    fn unknown_wallet_never_connects() {
        let api = api();
        assert!(matches!(
            api.balance(Some("ghost")),
            Err(LnbotError::NotFound(_))
        ));
        assert!(api.connector.connected_keys().is_empty());
    }

    #[test]
    fn uninitialized_registry_is_config_missing() {
        let api = LnbotApi::new(InMemoryStore::new(), MockConnector::new(), "http://x");
        assert!(matches!(api.status(None), Err(LnbotError::ConfigMissing)));
        assert!(matches!(api.key_show(None), Err(LnbotError::ConfigMissing)));
    }

    #[test]
    fn invoice_amount_checked_before_connecting() {
        let api = api();
        assert!(matches!(
            api.invoice_create(None, 0, None),
            Err(LnbotError::Invalid(_))
        ));
        assert!(api.connector.connected_keys().is_empty());
    }

    #[test]
    fn invoice_wait_dispatches_to_watcher() {
        let api = api();
        let invoice = Invoice {
            number: 3,
            status: ResourceStatus::Settled,
            ..Invoice::default()
        };
        let result = api
            .invoice_wait(None, invoice, &CancelSignal::never())
            .unwrap();
        assert!(matches!(result.output, Output::Watch(_)));
        assert_eq!(api.connector.client().subscribe_count(), 0);
    }

    #[test]
    fn payment_list_forwards_cursor() {
        let api = api();
        api.payment_list(None, 5, Some(9)).unwrap();
        assert_eq!(
            api.connector.client().state().last_list,
            Some(ListParams {
                limit: Some(5),
                after: Some(9)
            })
        );
    }

    #[test]
    fn transfer_key_from_registry() {
        let api = api();
        let key = api
            .transfer_key(&TransferTarget::Wallet("agent02".into()))
            .unwrap();
        assert_eq!(key, "key_agent");
    }

    #[test]
    fn mcp_config_uses_api_url() {
        let api = api();
        let result = api.mcp_config(Some("agent02"), true).unwrap();
        let Output::McpConfig(config) = result.output else {
            panic!("expected config");
        };
        assert_eq!(config["mcpServers"]["lnbot"]["url"], "https://api.ln.bot/mcp");
        assert_eq!(
            config["mcpServers"]["lnbot"]["headers"]["Authorization"],
            "Bearer key_agent"
        );
        assert!(matches!(api.mcp_config(None, false).unwrap().output, Output::None));
    }

    #[test]
    fn passkeys_are_unsupported() {
        let api = api();
        assert!(matches!(
            api.backup_passkey(),
            Err(LnbotError::Unsupported(_))
        ));
        assert!(matches!(
            api.restore_passkey(),
            Err(LnbotError::Unsupported(_))
        ));
    }
}
