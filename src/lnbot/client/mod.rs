//! # API Client Facade
//!
//! Boundary between the CLI core and the hosted wallet service. The core
//! only ever talks to these traits:
//!
//! - [`WalletApi`]: authenticated request/response calls returning typed
//!   resources or a structured [`LnbotError::Remote`].
//! - [`EventSource`]: opens one server-sent event [`Subscription`] for an
//!   invoice or payment.
//! - [`Connect`]: turns an API key (or none, for anonymous calls) into a
//!   client handle.
//!
//! [`http`] is the production implementation. Tests use the scripted
//! client in `crate::test_utils`.
//!
//! [`LnbotError::Remote`]: crate::error::LnbotError::Remote

use crate::error::{LnbotError, Result};
use crate::model::*;
use crossbeam_channel::Receiver;
use std::fmt;

pub mod events;
pub mod http;
pub mod sse;

pub use events::StreamEvent;

/// The resource a subscription follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchTarget {
    Invoice(u64),
    Payment(u64),
}

impl WatchTarget {
    pub fn number(self) -> u64 {
        match self {
            WatchTarget::Invoice(n) | WatchTarget::Payment(n) => n,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            WatchTarget::Invoice(_) => "invoice",
            WatchTarget::Payment(_) => "payment",
        }
    }

    pub fn of(snapshot: &Snapshot) -> Self {
        match snapshot {
            Snapshot::Invoice(invoice) => WatchTarget::Invoice(invoice.number),
            Snapshot::Payment(payment) => WatchTarget::Payment(payment.number),
        }
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind(), self.number())
    }
}

/// A live event stream for one resource.
///
/// Events and transport errors arrive on separate channels. Both channels
/// disconnect when the server ends the stream. `close` tears the
/// underlying connection down; it is called exactly once by its owner.
pub trait Subscription {
    fn events(&self) -> &Receiver<StreamEvent>;

    fn errors(&self) -> &Receiver<LnbotError>;

    fn close(&mut self);
}

pub trait EventSource {
    fn subscribe(&self, target: WatchTarget) -> Result<Box<dyn Subscription>>;
}

pub trait WalletApi: EventSource {
    fn create_wallet(&self, params: &CreateWalletParams) -> Result<CreatedWallet>;

    fn current_wallet(&self) -> Result<Wallet>;

    fn update_wallet(&self, params: &UpdateWalletParams) -> Result<Wallet>;

    fn create_invoice(&self, params: &CreateInvoiceParams) -> Result<Invoice>;

    fn list_invoices(&self, params: ListParams) -> Result<Vec<Invoice>>;

    fn create_payment(&self, params: &CreatePaymentParams) -> Result<Payment>;

    fn list_payments(&self, params: ListParams) -> Result<Vec<Payment>>;

    fn list_transactions(&self, params: ListParams) -> Result<Vec<Transaction>>;

    fn list_addresses(&self) -> Result<Vec<Address>>;

    fn create_address(&self, params: &CreateAddressParams) -> Result<Address>;

    fn transfer_address(
        &self,
        address: &str,
        params: &TransferAddressParams,
    ) -> Result<AddressTransfer>;

    fn delete_address(&self, address: &str) -> Result<()>;

    fn rotate_key(&self, slot: KeySlot) -> Result<RotatedKey>;

    fn backup_recovery(&self) -> Result<RecoveryBackup>;

    fn restore_recovery(&self, params: &RestoreParams) -> Result<RestoredWallet>;

    fn create_webhook(&self, params: &CreateWebhookParams) -> Result<Webhook>;

    fn list_webhooks(&self) -> Result<Vec<Webhook>>;

    fn delete_webhook(&self, id: &str) -> Result<()>;
}

/// Builds client handles. `None` yields an anonymous client, used for
/// creating and restoring wallets.
pub trait Connect {
    type Client: WalletApi;

    fn connect(&self, api_key: Option<&str>) -> Result<Self::Client>;
}
