//! The `~/.skrevorc` INI file.
//!
//! ```ini
//! [settings]
//! auto-save = true
//! content-file = ~/writing/today.txt
//! show-toolbar = false
//! enable-word-wrap = true
//! enable-borders = false
//!
//! [keys]
//! quit = q, ctrl q
//! ```

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use ini::Ini;
use tracing::{debug, info};

use crate::{error::StartupError, keys::KeyBindings};

pub const DEFAULT_CONFIG_PATH: &str = "~/.skrevorc";
pub const DEFAULT_CONTENT_FILE: &str = "~/skrevo.txt";

const SETTINGS_SECTION: &str = "settings";
const KEYS_SECTION: &str = "keys";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    pub auto_save: bool,
    pub content_file: Option<String>,
    pub show_toolbar: bool,
    pub enable_word_wrap: bool,
    pub enable_borders: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub settings: Settings,
    /// Raw `[keys]` entries in file order.
    pub keys: Vec<(String, String)>,
}

impl Config {
    /// Reads the config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        if !path.exists() {
            info!(target: "config", path = %path.display(), "config_missing_using_defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| StartupError::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, StartupError> {
        let ini = Ini::load_from_str(text).map_err(|err| StartupError::ConfigMalformed {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        let mut settings = Settings::default();
        if let Some(section) = ini.section(Some(SETTINGS_SECTION)) {
            let flag = |name: &str| section.get(name).is_some_and(parse_bool);
            settings.auto_save = flag("auto-save");
            settings.show_toolbar = flag("show-toolbar");
            settings.enable_word_wrap = flag("enable-word-wrap");
            settings.enable_borders = flag("enable-borders");
            settings.content_file = section
                .get("content-file")
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string);
        }

        let keys = ini
            .section(Some(KEYS_SECTION))
            .map(|section| {
                section
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        debug!(target: "config", ?settings, key_overrides = ?keys, "config_loaded");
        Ok(Self { settings, keys })
    }

    /// Defaults overlaid with the `[keys]` section.
    pub fn key_bindings(&self) -> KeyBindings {
        KeyBindings::from_config(
            self.keys
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
            KeyBindings::default(),
        )
    }
}

/// `true` or `1` (any case) enable a setting; everything else disables it.
pub fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1")
}

/// Writes bindings as a `[keys]` section, ready to paste into the config.
pub fn write_bindings<W: Write>(bindings: &KeyBindings, out: &mut W) -> io::Result<()> {
    let mut ini = Ini::new();
    for (name, chords) in bindings.serialize() {
        ini.set_to(Some(KEYS_SECTION), name.to_string(), chords);
    }
    ini.write_to(out)
}
