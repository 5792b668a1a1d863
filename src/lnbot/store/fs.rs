use super::RegistryStore;
use crate::error::{LnbotError, Result};
use crate::registry::Registry;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegistryStore for FileStore {
    fn load(&self) -> Result<Option<Registry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no registry at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(LnbotError::Io(e)),
        };
        let registry: Registry = serde_json::from_str(&content)?;
        log::debug!(
            "loaded {} wallet(s) from {}",
            registry.wallets.len(),
            self.path.display()
        );
        Ok(Some(registry))
    }

    fn save(&self, registry: &Registry) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        write_private(&dir, &self.path, registry)?;
        log::debug!(
            "saved {} wallet(s) to {}",
            registry.wallets.len(),
            self.path.display()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Serializes `value` as pretty JSON into `path` through a temp file in
/// `dir`. The directory is created owner-only and the file is owner
/// read/write.
pub(crate) fn write_private<T: serde::Serialize>(dir: &Path, path: &Path, value: &T) -> Result<()> {
    ensure_private_dir(dir)?;

    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');

    // NamedTempFile is created 0600 on unix.
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| LnbotError::Io(e.error))?;
    Ok(())
}

fn ensure_private_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        return Ok(());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(dir)?;
    }
    #[cfg(not(unix))]
    fs::create_dir_all(dir)?;
    Ok(())
}
