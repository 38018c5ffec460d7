use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Load/save the serialized register blob between runs.
pub trait RegisterStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, blob: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileRegisterStore {
    path: PathBuf,
}

impl FileRegisterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl RegisterStore for FileRegisterStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            debug!(target: "registers", path = %self.path.display(), "no_register_file");
            return Ok(None);
        }
        let blob = fs::read_to_string(&self.path)
            .with_context(|| format!("reading registers from {}", self.path.display()))?;
        Ok(Some(blob))
    }

    fn save(&self, blob: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&self.path, blob)
            .with_context(|| format!("writing registers to {}", self.path.display()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRegisterStore {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemoryRegisterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.blob.lock().ok().and_then(|b| b.clone())
    }
}

impl RegisterStore for MemoryRegisterStore {
    fn load(&self) -> Result<Option<String>> {
        let guard = self
            .blob
            .lock()
            .map_err(|e| anyhow::anyhow!("register store poisoned: {e}"))?;
        Ok(guard.clone())
    }

    fn save(&self, blob: &str) -> Result<()> {
        let mut guard = self
            .blob
            .lock()
            .map_err(|e| anyhow::anyhow!("register store poisoned: {e}"))?;
        *guard = Some(blob.to_string());
        Ok(())
    }
}
