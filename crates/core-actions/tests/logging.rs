//! Structured log events emitted while dispatching keys.

mod common;

use common::Harness;
use core_config::Config;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::Level;
use tracing::subscriber::with_default;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone)]
struct BufferWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

struct LockedWriter<'a> {
    guard: MutexGuard<'a, Vec<u8>>,
}

impl Write for LockedWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = LockedWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LockedWriter {
            guard: self.inner.lock().expect("log buffer poisoned"),
        }
    }
}

fn captured<F: FnOnce()>(level: Level, f: F) -> String {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(BufferWriter { inner: buf.clone() })
        .finish();
    with_default(subscriber, f);
    let bytes = buf.lock().expect("log buffer poisoned").clone();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[test]
fn runaway_replay_warns_when_lenient() {
    let logs = captured(Level::WARN, || {
        let mut h = Harness::with_config(&["abc"], Config::default());
        h.keys("qa@aq@a");
        assert_eq!(h.doc.replaying, 0);
    });
    assert!(logs.contains("replay_depth_exceeded"), "logs: {logs}");
    assert!(logs.contains("engine.macro"), "logs: {logs}");
}

#[test]
fn recording_logs_start_and_stop() {
    let logs = captured(Level::DEBUG, || {
        let mut h = Harness::new(&["abc"]);
        h.keys("qbxq");
    });
    assert!(logs.contains("recording_started"), "logs: {logs}");
    assert!(logs.contains("recording_stopped"), "logs: {logs}");
}

#[test]
fn search_wrap_is_logged() {
    let logs = captured(Level::DEBUG, || {
        let mut h = Harness::new(&["foo", "bar"]);
        h.keys("/foo<CR>");
    });
    assert!(logs.contains("search_wrapped"), "logs: {logs}");
}
