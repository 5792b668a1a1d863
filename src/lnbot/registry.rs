//! # Wallet Registry
//!
//! Local map of human-readable wallet names to the credentials issued by the
//! wallet service, plus the name of the one wallet commands use by default.
//!
//! The registry is pure data: it never touches the filesystem. Loading and
//! saving go through [`crate::store::RegistryStore`], and every mutation is
//! followed by a whole-file rewrite at the command layer.
//!
//! ## On-disk shape
//!
//! ```text
//! {
//!   "active": "agent01",
//!   "wallets": {
//!     "agent01": { "id": "wal_..", "primary_key": "key_..", "secondary_key": "", "address": "" }
//!   }
//! }
//! ```
//!
//! Optional values are written as empty strings and empty strings read back
//! as absent, which keeps files written by earlier releases loadable.
//!
//! ## Active wallet
//!
//! `active` is either empty or the name of an existing record. Resolving
//! without a name never guesses: an empty `active` is an error even when a
//! single wallet exists.

use crate::error::{LnbotError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub id: String,
    pub primary_key: String,
    #[serde(default, with = "blank")]
    pub secondary_key: Option<String>,
    #[serde(default, with = "blank")]
    pub address: Option<String>,
}

impl WalletRecord {
    pub fn new(id: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            primary_key: primary_key.into(),
            secondary_key: None,
            address: None,
        }
    }

    pub fn with_secondary_key(mut self, key: impl Into<String>) -> Self {
        self.secondary_key = non_blank(key.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = non_blank(address.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub active: String,
    #[serde(default)]
    pub wallets: HashMap<String, WalletRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&WalletRecord> {
        self.wallets.get(name)
    }

    pub fn record_mut(&mut self, name: &str) -> Result<&mut WalletRecord> {
        self.wallets
            .get_mut(name)
            .ok_or_else(|| LnbotError::NotFound(name.to_string()))
    }

    /// Looks up `name`, or the active wallet when no name is given.
    pub fn resolve(&self, name: Option<&str>) -> Result<(&str, &WalletRecord)> {
        match name.filter(|n| !n.is_empty()) {
            Some(name) => self
                .wallets
                .get_key_value(name)
                .map(|(k, v)| (k.as_str(), v))
                .ok_or_else(|| LnbotError::NotFound(name.to_string())),
            None => {
                if self.active.is_empty() {
                    return Err(if self.wallets.is_empty() {
                        LnbotError::NoWallets
                    } else {
                        LnbotError::NoActiveWallet
                    });
                }
                self.wallets
                    .get_key_value(self.active.as_str())
                    .map(|(k, v)| (k.as_str(), v))
                    .ok_or_else(|| LnbotError::ActiveWalletMissing(self.active.clone()))
            }
        }
    }

    /// Adds or replaces `name`. The first wallet, or any wallet added while
    /// nothing is active, becomes active.
    pub fn insert(&mut self, name: impl Into<String>, record: WalletRecord) {
        let name = name.into();
        if self.active.is_empty() || !self.wallets.contains_key(&self.active) {
            self.active = name.clone();
        }
        self.wallets.insert(name, record);
    }

    /// Selects the active wallet by registry name, falling back to the
    /// provider-issued id. Returns the selected name.
    pub fn set_active(&mut self, name_or_id: &str) -> Result<String> {
        let name = if self.wallets.contains_key(name_or_id) {
            name_or_id.to_string()
        } else {
            self.name_for_id(name_or_id)
                .map(str::to_string)
                .ok_or_else(|| LnbotError::NotFound(name_or_id.to_string()))?
        };
        self.active = name.clone();
        Ok(name)
    }

    pub fn name_for_id(&self, id: &str) -> Option<&str> {
        self.wallets
            .iter()
            .find(|(_, record)| record.id == id)
            .map(|(name, _)| name.as_str())
    }

    /// Removes `name`. When it was active, some remaining wallet becomes
    /// active; which one is unspecified and callers must not rely on it.
    pub fn remove(&mut self, name: &str) -> Result<WalletRecord> {
        let record = self
            .wallets
            .remove(name)
            .ok_or_else(|| LnbotError::NotFound(name.to_string()))?;
        if self.active == name {
            self.active = self.wallets.keys().next().cloned().unwrap_or_default();
        }
        Ok(record)
    }

    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if !self.wallets.contains_key(old_name) {
            return Err(LnbotError::NotFound(old_name.to_string()));
        }
        if old_name == new_name {
            return Ok(());
        }
        if self.wallets.contains_key(new_name) {
            return Err(LnbotError::Conflict(new_name.to_string()));
        }
        if let Some(record) = self.wallets.remove(old_name) {
            self.wallets.insert(new_name.to_string(), record);
        }
        if self.active == old_name {
            self.active = new_name.to_string();
        }
        Ok(())
    }

    /// `base` if free, otherwise the first free `base-N`.
    pub fn unique_name(&self, base: &str) -> String {
        if !self.wallets.contains_key(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !self.wallets.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Wallet names in a stable (sorted) order for display.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.wallets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

mod blank {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(d)?;
        Ok(value.filter(|v| !v.is_empty()))
    }
}
