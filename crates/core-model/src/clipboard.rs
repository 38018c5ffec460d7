use crate::EditError;
use std::sync::{Arc, Mutex};

/// System clipboard surface used by the `*` and `+` registers.
pub trait Clipboard: Send {
    fn get(&self) -> Result<String, EditError>;
    fn set(&mut self, text: &str) -> Result<(), EditError>;
}

/// Shared in-process clipboard. Clones observe the same contents, so a test
/// can keep a handle and change the "system" clipboard behind the engine's
/// back.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            contents: Arc::new(Mutex::new(text.to_string())),
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn get(&self) -> Result<String, EditError> {
        self.contents
            .lock()
            .map(|c| c.clone())
            .map_err(|e| EditError::Clipboard(e.to_string()))
    }

    fn set(&mut self, text: &str) -> Result<(), EditError> {
        let mut guard = self
            .contents
            .lock()
            .map_err(|e| EditError::Clipboard(e.to_string()))?;
        guard.clear();
        guard.push_str(text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_contents() {
        let mut a = MemoryClipboard::new();
        let b = a.clone();
        a.set("hello").unwrap();
        assert_eq!(b.get().unwrap(), "hello");
    }
}
