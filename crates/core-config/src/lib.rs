//! Configuration loading and parsing.
//!
//! Parses `oxvim.toml` (or an override path provided by the binary). Every
//! section and field is optional; unknown fields are ignored so the file can
//! evolve without warnings. A missing file or a parse error falls back to
//! defaults (logged under the `config` target) rather than failing startup.
//!
//! The engine treats `Config` as read-only; hosts may swap it between
//! keystrokes.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EditorConfig {
    pub tabstop: usize,
    pub shiftwidth: usize,
    pub expandtab: bool,
    /// Vim `iskeyword` syntax.
    pub iskeyword: String,
    /// Linewise jumps land on the first non-blank.
    pub startofline: bool,
    /// Minimum number of changed lines before a "N more lines" message.
    pub report: usize,
    /// Vim `matchpairs` syntax used by `%`.
    pub matchpairs: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tabstop: 8,
            shiftwidth: 8,
            expandtab: false,
            iskeyword: "@,48-57,_,192-255".to_string(),
            startofline: true,
            report: 2,
            matchpairs: "(:),{:},[:]".to_string(),
        }
    }
}

impl EditorConfig {
    /// Text inserted for one level of indentation.
    pub fn indent_unit(&self) -> String {
        if self.expandtab {
            " ".repeat(self.shiftwidth.max(1))
        } else if self.shiftwidth >= self.tabstop && self.tabstop > 0 {
            let tabs = self.shiftwidth / self.tabstop;
            let spaces = self.shiftwidth % self.tabstop;
            format!("{}{}", "\t".repeat(tabs), " ".repeat(spaces))
        } else {
            " ".repeat(self.shiftwidth.max(1))
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    pub wrapscan: bool,
    pub ignorecase: bool,
    pub smartcase: bool,
    /// Patterns are regular expressions (otherwise literal text).
    pub regex: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            wrapscan: true,
            ignorecase: false,
            smartcase: false,
            regex: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ClipboardConfig {
    /// Mirror the default register to the host clipboard.
    pub use_system_clipboard: bool,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct InsertConfig {
    /// Typed characters are inserted by the host itself.
    pub defer_to_host: bool,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Internal invariant violations become hard errors.
    pub strict: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RegistersConfig {
    pub persist: bool,
    /// Relative paths resolve against the data directory.
    pub file: PathBuf,
}

impl Default for RegistersConfig {
    fn default() -> Self {
        Self {
            persist: true,
            file: PathBuf::from("registers.json"),
        }
    }
}

impl RegistersConfig {
    pub fn resolved_path(&self) -> PathBuf {
        if self.file.is_absolute() {
            return self.file.clone();
        }
        match dirs::data_dir() {
            Some(dir) => dir.join("oxvim").join(&self.file),
            None => self.file.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigFile {
    pub editor: EditorConfig,
    pub search: SearchConfig,
    pub clipboard: ClipboardConfig,
    pub insert: InsertConfig,
    pub engine: EngineConfig,
    pub registers: RegistersConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

impl Config {
    pub fn editor(&self) -> &EditorConfig {
        &self.file.editor
    }

    pub fn search(&self) -> &SearchConfig {
        &self.file.search
    }

    pub fn strict(&self) -> bool {
        self.file.engine.strict
    }

    /// Defaults with strict invariant checking, as used by tests.
    pub fn strict_defaults() -> Self {
        let mut cfg = Self::default();
        cfg.file.engine.strict = true;
        cfg
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file = toml::from_str::<ConfigFile>(content)?;
        Ok(Self {
            raw: Some(content.to_string()),
            file,
        })
    }
}

/// Best-effort config path: `oxvim.toml` in the working directory, then
/// the platform config dir (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("oxvim.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("oxvim").join("oxvim.toml");
    }
    PathBuf::from("oxvim.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_missing_using_defaults");
        return Ok(Config::default());
    };
    match Config::parse(&content) {
        Ok(cfg) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(cfg)
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}
