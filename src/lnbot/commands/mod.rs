//! # Command Layer
//!
//! Business logic for every lnbot operation. Commands load and save the
//! registry through a [`RegistryStore`](crate::store::RegistryStore), talk to
//! the wallet service through a [`WalletApi`](crate::client::WalletApi)
//! handle, and return a [`CmdResult`]: typed [`Output`] plus user-facing
//! messages. They never print; presentation belongs to the CLI.
//!
//! Remote failures are tagged with the action that was attempted
//! (`"creating invoice: insufficient balance"`).

use crate::model::*;
use crate::watch::WatchOutcome;
use serde::Serialize;

pub mod account;
pub mod address;
pub mod init;
pub mod invoice;
pub mod keys;
pub mod ledger;
pub mod mcp;
pub mod pay;
pub mod recovery;
pub mod wallet;
pub mod webhook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// One row of `wallet list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletSummary {
    pub name: String,
    pub id: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub wallet: String,
    pub wallet_id: String,
    pub balance: i64,
    pub available: i64,
    pub on_hold: i64,
    pub address: String,
    pub latency_ms: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub wallet_id: String,
    pub name: String,
    pub api_key: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReport {
    pub payment: Payment,
    pub elapsed_ms: u128,
    /// Available balance after a settled payment, when it could be fetched.
    pub balance: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: RestoredWallet,
    pub name: String,
    pub address: Option<String>,
}

/// What a command produced, before any presentation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Output {
    #[default]
    None,
    Wallets(Vec<WalletSummary>),
    CreatedWallet(CreatedWallet),
    Balance(Wallet),
    Status(StatusReport),
    Identity(Identity),
    Invoice(Invoice),
    Invoices {
        items: Vec<Invoice>,
        limit: u32,
    },
    Watch(WatchOutcome),
    Payment(PaymentReport),
    Payments {
        items: Vec<Payment>,
        limit: u32,
    },
    Transactions {
        items: Vec<Transaction>,
        limit: u32,
    },
    Keys {
        primary: String,
        secondary: Option<String>,
    },
    RotatedKey {
        slot: KeySlot,
        key: String,
    },
    Recovery(RecoveryBackup),
    Restored(RestoreReport),
    Addresses(Vec<Address>),
    Address(Address),
    Transfer(AddressTransfer),
    Webhook(Webhook),
    Webhooks(Vec<Webhook>),
    McpConfig(serde_json::Value),
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub output: Output,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn new(output: Output) -> Self {
        Self {
            output,
            messages: Vec::new(),
        }
    }

    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_message(mut self, message: CmdMessage) -> Self {
        self.messages.push(message);
        self
    }
}
