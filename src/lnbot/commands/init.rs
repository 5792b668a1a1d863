use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::registry::Registry;
use crate::store::RegistryStore;

pub fn run<S: RegistryStore>(store: &S) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if store.load()?.is_some() {
        result.add_message(CmdMessage::info(format!(
            "Config already exists at {}",
            store.location()
        )));
        return Ok(result);
    }

    store.save(&Registry::new())?;
    result.add_message(CmdMessage::success(format!(
        "Config created at {}",
        store.location()
    )));
    result.add_message(CmdMessage::info("Next: lnbot wallet create --name <name>"));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::registry::WalletRecord;
    use crate::store::memory::InMemoryStore;

    #[test]
    fn creates_empty_registry() {
        let store = InMemoryStore::new();
        let result = run(&store).unwrap();
        assert_eq!(store.snapshot(), Some(Registry::new()));
        assert_eq!(result.messages[0].level, MessageLevel::Success);
    }

    #[test]
    fn existing_registry_is_left_alone() {
        let mut registry = Registry::new();
        registry.insert("main", WalletRecord::new("wal_1", "key_1"));
        let store = InMemoryStore::with_registry(registry.clone());

        let result = run(&store).unwrap();
        assert_eq!(store.save_count(), 0);
        assert_eq!(store.snapshot(), Some(registry));
        assert!(result.messages[0].content.contains("already exists"));
    }
}
