//! # Storage Layer
//!
//! The [`RegistryStore`] trait decouples the wallet registry from where it is
//! persisted.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: the JSON file under `~/.config/lnbot/` (or
//!   `$LNBOT_CONFIG`). Writes go to a temp file in the same directory and
//!   are renamed into place, so readers see either the old or the new file.
//! - [`memory::InMemoryStore`]: no persistence, for tests.
//!
//! ## Missing vs empty
//!
//! `load` returns `Ok(None)` when nothing was ever saved. That is how the
//! command layer tells "run `lnbot init` first" apart from "initialized, but
//! no wallets yet".

use crate::error::Result;
use crate::registry::Registry;

pub mod fs;
pub mod memory;

pub trait RegistryStore {
    /// Reads the persisted registry, `None` if it was never created.
    fn load(&self) -> Result<Option<Registry>>;

    /// Persists the whole registry, replacing what was there.
    fn save(&self, registry: &Registry) -> Result<()>;

    /// Human-readable location, used in messages.
    fn location(&self) -> String;
}
