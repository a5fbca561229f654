//! Layered settings resolution.
//!
//! Two sources, checked in order on every lookup:
//! 1. the host's per-view/project override block for this plugin
//! 2. the plugin-level settings store
//!
//! Nothing is cached; each lookup re-reads both layers so edits to either
//! take effect on the next invocation. The store sits behind the narrow
//! [`ConfigStore`] seam so the whole stack is testable without a real host.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use toml::Value;
use tracing::debug;

use crate::error::SettingsError;

/// Well-known setting keys shared by all tool profiles.
pub mod keys {
    /// Enable verbose plugin logging.
    pub const DEBUG: &str = "debug";
    /// Raise a modal notification on errors (status line is always written).
    pub const POPUP_ERRORS: &str = "popup_errors";
    /// Charset assumed when the host reports the document encoding as unknown.
    pub const DEFAULT_ENCODING: &str = "default_encoding";
    /// Run the sorter from the pre-save hook.
    pub const ON_SAVE: &str = "on_save";
    /// Filename globs exempt from the pre-save hook.
    pub const ONSAVE_IGNORE_FN_GLOB: &str = "onsave_ignore_fn_glob";
}

/// Narrow seam over the host-managed persistent settings storage.
///
/// `get` must observe external modifications (no caching), and `set` must
/// persist durably so a discovered executable path survives restarts.
pub trait ConfigStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
}

/// Settings store backed by a TOML file, conventionally
/// `<config dir>/impsort/settings.toml`.
///
/// The file is re-read on every `get`; a missing file reads as empty.
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default per-user location.
    pub fn default_path(plugin_name: &str) -> Self {
        let path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(plugin_name)
            .join("settings.toml");
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<toml::Table, SettingsError> {
        if !self.path.exists() {
            return Ok(toml::Table::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| SettingsError::Read {
            path: self.path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl ConfigStore for TomlConfigStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut table = self.load()?;
        table.insert(key.to_string(), value);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        let rendered = toml::to_string_pretty(&table).expect("settings table serializes");
        std::fs::write(&self.path, rendered).map_err(|source| SettingsError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// In-memory store for tests and embedded hosts.
#[derive(Debug, Default, Clone)]
pub struct MemoryConfigStore {
    values: BTreeMap<String, Value>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// The layered resolver: per-view overrides, then the plugin store, then a
/// caller-supplied fallback.
pub struct Settings {
    namespace: String,
    overrides: Option<Value>,
    store: Box<dyn ConfigStore>,
}

impl Settings {
    /// `namespace` names the plugin's override slot in the host settings
    /// (used only for diagnostics); `overrides` is whatever the host stored
    /// under that slot, if anything.
    pub fn new(namespace: &str, overrides: Option<Value>, store: Box<dyn ConfigStore>) -> Self {
        Self {
            namespace: namespace.to_string(),
            overrides,
            store,
        }
    }

    /// Look up a key across both layers.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MalformedOverride`] if the override slot
    /// exists but is not a table. A corrupted host configuration must
    /// surface, not be silently skipped.
    pub fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        if let Some(overrides) = &self.overrides {
            let table = overrides
                .as_table()
                .ok_or_else(|| SettingsError::MalformedOverride {
                    namespace: self.namespace.clone(),
                })?;
            if let Some(value) = table.get(key) {
                return Ok(Some(value.clone()));
            }
        }
        self.store.get(key)
    }

    pub fn get_bool(&self, key: &str, fallback: bool) -> Result<bool, SettingsError> {
        Ok(self
            .get(key)?
            .and_then(|v| v.as_bool())
            .unwrap_or(fallback))
    }

    pub fn get_string(&self, key: &str, fallback: &str) -> Result<String, SettingsError> {
        Ok(self
            .get(key)?
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| fallback.to_string()))
    }

    pub fn get_string_list(&self, key: &str) -> Result<Vec<String>, SettingsError> {
        let list = self
            .get(key)?
            .and_then(|v| {
                v.as_array().map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect()
                })
            })
            .unwrap_or_default();
        Ok(list)
    }

    /// Write a value through to the plugin store. Overrides are host-owned
    /// and never written.
    pub fn persist(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        debug!("persisting setting {key} = {value}");
        self.store.set(key, value)
    }
}
