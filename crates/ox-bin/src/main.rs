//! `oxvim`: applies Vim keystrokes to a text file.
//!
//! Keys come from `--keys` (Vim notation) or, without it, from stdin one
//! line at a time. The edited text is printed to stdout, or written back
//! with `--write`. Status messages go to stderr.
use anyhow::Result;
use clap::Parser;
use core_config::load_from;
use core_events::{EVENT_CHANNEL_CAP, Event, EventSourceRegistry, ScriptedKeySource};
use core_model::FileRegisterStore;
use core_state::Registers;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod runtime;

use runtime::{Session, StdinKeySource};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "oxvim", version, about = "Apply Vim keystrokes to a text file")]
struct Args {
    /// File to edit. A missing file starts empty; without a path the document is unnamed.
    pub path: Option<PathBuf>,
    /// Keys in Vim notation, e.g. `ggdd` or `ciwfoo<Esc>`. Read from stdin when omitted.
    #[arg(short, long)]
    pub keys: Option<String>,
    /// Configuration file (overrides discovery of `oxvim.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Write the result back to the file instead of printing it.
    #[arg(short, long)]
    pub write: bool,
    /// Neither load nor save registers.
    #[arg(long)]
    pub no_persist: bool,
    /// Log file; `RUST_LOG` selects what is written.
    #[arg(long, default_value = "oxvim.log")]
    pub log: PathBuf,
}

fn configure_logging(path: &Path) -> Option<WorkerGuard> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file = path.file_name()?.to_owned();
    if path.exists() {
        let _ = std::fs::remove_file(path);
    }
    let appender = tracing_appender::rolling::never(dir, file);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()
        .map(|_| guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn load_registers(store: Option<&FileRegisterStore>) -> Registers {
    let mut registers = Registers::default();
    if let Some(store) = store
        && let Err(e) = registers.load(store)
    {
        warn!(target: "registers", error = %e, path = %store.path().display(), "register_load_failed");
        registers = Registers::default();
    }
    registers
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging(&args.log);
    install_panic_hook();
    info!(target: "runtime", "startup");

    let config = load_from(args.config.clone())?;
    let store = (config.file.registers.persist && !args.no_persist)
        .then(|| FileRegisterStore::new(config.file.registers.resolved_path()));
    let registers = load_registers(store.as_ref());

    let mut session = match &args.path {
        Some(path) => Session::open(path, config, registers)?,
        None => Session::from_text("untitled", "", config, registers)?,
    };

    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let mut registry = EventSourceRegistry::new();
    match &args.keys {
        Some(script) => registry.register(ScriptedKeySource::from_notation(script)?),
        None => registry.register(StdinKeySource),
    }
    let sources = registry.len();
    let handles = registry.spawn_all(&tx);
    drop(tx);

    let reason = session.run(rx, sources).await;
    for handle in handles {
        match tokio::time::timeout(Duration::from_millis(200), handle).await {
            Ok(Ok(())) => trace!(target: "runtime.shutdown", reason = reason.as_str(), "event_source_task_stopped"),
            Ok(Err(err)) => error!(target: "runtime.shutdown", ?err, "event_source_task_error"),
            Err(_) => warn!(target: "runtime.shutdown", reason = reason.as_str(), "event_source_task_timeout"),
        }
    }

    let mut stderr = std::io::stderr().lock();
    for line in session.take_status() {
        let tag = if line.is_error { "error" } else { "info" };
        writeln!(stderr, "{tag}: {}", line.text)?;
    }

    if let Some(store) = &store {
        session.vim.registers().save(store)?;
    }
    if args.write {
        session.write()?;
    } else {
        std::io::stdout().lock().write_all(session.text().as_bytes())?;
    }

    info!(target: "runtime", engine_errors = session.engine_errors, "shutdown");
    if session.engine_errors > 0 {
        anyhow::bail!("{} key(s) failed inside the engine; see the log", session.engine_errors);
    }
    Ok(())
}
