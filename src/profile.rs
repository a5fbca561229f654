//! Description of the external tool a plugin instance drives.
//!
//! The round-trip machinery is tool-agnostic; everything tool-specific
//! (candidate binary names, fixed flags, temp-file suffix, which documents
//! the tool claims) lives here.

use std::path::Path;

/// Static description of one external formatting tool.
#[derive(Debug, Clone)]
pub struct ToolProfile {
    /// Human-readable plugin name, used in log and status lines.
    pub name: &'static str,
    /// Host status-line slot written on errors and cleared per invocation.
    pub status_key: &'static str,
    /// Settings key holding the explicit executable path.
    pub command_key: &'static str,
    /// Executable names searched on PATH when no path is configured.
    pub candidates: &'static [&'static str],
    /// Fixed flags that make the tool rewrite its file argument in place.
    pub apply_args: &'static [&'static str],
    /// Suffix for the temp file, so tools that sniff extensions behave.
    pub temp_suffix: &'static str,
    /// File extensions this tool claims. Documents without a backing file
    /// are always claimed.
    pub extensions: &'static [&'static str],
}

impl ToolProfile {
    /// Profile for [isort](https://pycqa.github.io/isort/), the Python
    /// import sorter this crate originally wrapped.
    pub fn isort() -> Self {
        Self {
            name: "ImpSort",
            status_key: "impsort",
            command_key: "command",
            candidates: &["isort", "isort.exe"],
            apply_args: &["--apply"],
            temp_suffix: ".py",
            extensions: &["py"],
        }
    }

    /// Whether this tool should run for the given document.
    pub fn claims(&self, file_path: Option<&Path>) -> bool {
        let Some(path) = file_path else {
            // Unsaved buffers have no extension to go by; let the tool try.
            return true;
        };
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self
                .extensions
                .iter()
                .any(|claimed| claimed.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}
