//! `ImpSort` - Editor-agnostic external import-sorter bridge
//!
//! # Features
//!
//! - **Round-trip**: buffer → temp file → external sorter → buffer, one
//!   atomic edit, selection state preserved
//! - **Command resolution**: explicit setting with `~`/`${var}` expansion,
//!   PATH search fallback, discovered paths persisted
//! - **Layered settings**: per-view/project overrides over a plugin-level
//!   TOML store, re-read on every lookup
//! - **Host seam**: documents injected as an [`EditorView`] trait, never a
//!   concrete editor SDK
//!
//! # Example
//!
//! ```rust,no_run
//! use impsort::{
//!     HostGeneration, MemoryConfigStore, NullNotifier, Plugin, ScratchView, Settings,
//!     ToolProfile,
//! };
//!
//! let settings = Settings::new("ImpSort", None, Box::new(MemoryConfigStore::new()));
//! let mut plugin = Plugin::new(
//!     ToolProfile::isort(),
//!     settings,
//!     HostGeneration::Modern,
//!     Box::new(NullNotifier),
//! );
//!
//! let mut view = ScratchView::new("import b\nimport a\n");
//! plugin.sort_document(&mut view)?;
//! # Ok::<(), impsort::FormatError>(())
//! ```

pub mod error;
pub mod format;
pub mod invoke;
pub mod locate;
pub mod plugin;
pub mod preserve;
pub mod profile;
pub mod settings;
pub mod view;

pub use error::{FormatError, SettingsError};
pub use format::{format_document, SUCCESS_EXIT_CODES};
pub use invoke::{split_command, InvocationSpec};
pub use locate::find_command;
pub use plugin::Plugin;
pub use preserve::{preserver_for, HostGeneration, LegacyPreserver, ModernPreserver, ViewPreserver};
pub use profile::ToolProfile;
pub use settings::{ConfigStore, MemoryConfigStore, Settings, TomlConfigStore};
pub use view::{EditorView, Notifier, NullNotifier, ScratchView, Selection};

/// Version of impsort
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
