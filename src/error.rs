//! Error taxonomy for the formatting round-trip.
//!
//! Four user-facing kinds, mirroring how the host should present them:
//! - configuration: no executable resolvable, fix your settings
//! - encoding: buffer not representable in the document charset
//! - spawn: the OS could not start the tool (distinct from the tool failing)
//! - tool: the tool ran and exited nonzero

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the settings layer.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The host handed us a per-view override slot that is not a mapping.
    /// This indicates corrupted host configuration and is never masked.
    #[error("override settings for '{namespace}' are not a table")]
    MalformedOverride { namespace: String },

    #[error("failed to read settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write settings file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors produced by the format orchestrator and its collaborators.
#[derive(Error, Debug)]
pub enum FormatError {
    /// No executable configured and none of the candidates found on PATH.
    #[error("no import sorter found; configure the 'command' setting or install one of the candidate executables")]
    CommandNotFound,

    /// The document text cannot be encoded in the document's charset.
    #[error("document is not representable in encoding '{encoding}'; re-open the file with a different encoding")]
    Encoding { encoding: String },

    /// The host reported an encoding label the encoding machinery does not know.
    #[error("unknown encoding label '{0}'")]
    UnknownEncoding(String),

    /// The OS could not start the process at all.
    #[error("failed to launch '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and exited nonzero. `message` is the last stderr line;
    /// the full stream is retained for diagnostics.
    #[error("{message}")]
    Tool {
        message: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    /// Whether the host should always raise a modal notification for this
    /// error, regardless of the `popup_errors` setting. Spawn failures are
    /// the one case where the user otherwise has no way to tell "tool
    /// missing" apart from "tool failed".
    pub fn always_popup(&self) -> bool {
        matches!(self, FormatError::Spawn { .. })
    }
}

pub type Result<T> = std::result::Result<T, FormatError>;
