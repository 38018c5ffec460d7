//! Key tokens, Vim key notation, and the async event channel that feeds
//! keystrokes to the engine loop.

use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

pub mod notation;

pub use notation::{NotationError, format_keys, parse_keys};

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// A bounded mpsc channel sized by `EVENT_CHANNEL_CAP`. Producers await `send` so a burst of scripted
// keys parks the producer instead of dropping keystrokes: the engine must see every key in order.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 8192;

/// Top-level event enum consumed by the central event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Input(InputEvent),
    /// A producer finished; the loop stops once every source has reported.
    SourceFinished(&'static str),
    Shutdown,
}

/// Normalized input events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyToken),
    /// Committed text (paste / IME); the loop feeds it one character at a time.
    Text(String),
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ModMask: u16 { const CTRL=1; const ALT=2; const SHIFT=4; const META=8; const SUPER=16; }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Enter,
    Esc,
    Backspace,
    Tab,
    F(u8),
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
}

/// Logical key identity: a printable character, a named special key, or a
/// modifier chord such as `<C-r>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyToken {
    Char(char),
    Named(NamedKey),
    Chord { base: Box<KeyToken>, mods: ModMask },
}

impl KeyToken {
    pub fn ctrl(c: char) -> Self {
        Self::Chord {
            base: Box::new(Self::Char(c.to_ascii_lowercase())),
            mods: ModMask::CTRL,
        }
    }

    pub fn esc() -> Self {
        Self::Named(NamedKey::Esc)
    }

    pub fn enter() -> Self {
        Self::Named(NamedKey::Enter)
    }

    pub fn backspace() -> Self {
        Self::Named(NamedKey::Backspace)
    }

    /// The printable character carried by a plain (unmodified) key.
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_ctrl(&self, c: char) -> bool {
        matches!(self, Self::Chord { base, mods } if *mods == ModMask::CTRL && **base == Self::Char(c))
    }

    /// A plain printable key: anything that would insert itself as text.
    pub fn is_printable(&self) -> bool {
        matches!(self, Self::Char(c) if !c.is_control())
    }

    /// Text the key stands for when typed literally (`<Tab>` and `<CR>`
    /// included).
    pub fn literal_text(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            Self::Named(NamedKey::Tab) => Some('\t'),
            Self::Named(NamedKey::Enter) => Some('\n'),
            _ => None,
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Async Event Sources
// -------------------------------------------------------------------------------------------------

/// Trait implemented by any async event producer. Implementors hold their configuration and spawn
/// one background task that pushes `Event`s into the shared channel. They must stop when
/// `tx.send(..).await` returns Err (channel closed) or on their own stop condition.
pub trait AsyncEventSource: Send + 'static {
    /// Human-readable stable identifier (used for logging / diagnostics).
    fn name(&self) -> &'static str;
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Registry of event sources spawned together at startup.
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl Default for EventSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Spawn all registered sources, returning their JoinHandles. Each source receives its own
    /// clone of `tx`; the registry keeps no sender once this returns, so dropping the caller's
    /// sender lets sources observe the closed channel.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Replays a fixed key script, then reports `SourceFinished`.
pub struct ScriptedKeySource {
    keys: Vec<KeyToken>,
}

impl ScriptedKeySource {
    pub fn new(keys: Vec<KeyToken>) -> Self {
        Self { keys }
    }

    pub fn from_notation(script: &str) -> Result<Self, NotationError> {
        Ok(Self::new(parse_keys(script)?))
    }
}

impl AsyncEventSource for ScriptedKeySource {
    fn name(&self) -> &'static str {
        "script"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let total = self.keys.len();
            for key in self.keys {
                if tx.send(Event::Input(InputEvent::Key(key))).await.is_err() {
                    tracing::debug!(target: "runtime.events", "script source stopped: channel closed");
                    return;
                }
            }
            tracing::debug!(target: "runtime.events", keys = total, "script source drained");
            let _ = tx.send(Event::SourceFinished("script")).await;
        })
    }
}

#[cfg(test)]
mod tests_async_sources {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn scripted_source_emits_keys_in_order_then_finishes() {
        let (tx, mut rx) = mpsc::channel::<Event>(4);
        let mut reg = EventSourceRegistry::new();
        reg.register(ScriptedKeySource::from_notation("dw<Esc>").expect("valid script"));
        let handles = reg.spawn_all(&tx);
        drop(tx);

        let mut seen = Vec::new();
        while let Some(ev) = rx.recv().await {
            match ev {
                Event::Input(InputEvent::Key(k)) => seen.push(k),
                Event::SourceFinished(name) => {
                    assert_eq!(name, "script");
                    break;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(
            seen,
            vec![KeyToken::Char('d'), KeyToken::Char('w'), KeyToken::esc()]
        );
        for handle in handles {
            handle.await.expect("script task joins");
        }
    }

    struct MockCloseSource {
        flag: Arc<AtomicBool>,
    }

    impl AsyncEventSource for MockCloseSource {
        fn name(&self) -> &'static str {
            "mock_close"
        }

        fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
            let flag = self.flag;
            tokio::spawn(async move {
                tx.closed().await;
                flag.store(true, Ordering::SeqCst);
            })
        }
    }

    #[tokio::test]
    async fn registry_sources_exit_on_channel_drop() {
        let (tx, rx) = mpsc::channel::<Event>(8);
        let mut reg = EventSourceRegistry::new();
        let flag = Arc::new(AtomicBool::new(false));
        reg.register(MockCloseSource { flag: flag.clone() });
        assert_eq!(reg.len(), 1);
        let handles = reg.spawn_all(&tx);
        assert!(reg.is_empty());

        drop(tx);
        drop(rx);

        for handle in handles {
            match tokio::time::timeout(Duration::from_millis(50), handle).await {
                Ok(join_res) => join_res.expect("source task should exit cleanly"),
                Err(_) => panic!("source task did not observe channel closure"),
            }
        }

        assert!(flag.load(Ordering::SeqCst));
    }
}
