//! Executable resolution.
//!
//! Preference order: the explicit `command` setting (with `~` and host
//! `${variable}` expansion), then a PATH search over the profile's
//! candidate names. A successful search is written back to the settings
//! store so later invocations resolve instantly and deterministically.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::PathBuf;

use toml::Value;
use tracing::debug;

use crate::error::SettingsError;
use crate::profile::ToolProfile;
use crate::settings::Settings;

/// Resolve the tool executable for `profile`.
///
/// `vars` is the host's variable map (project dir, file name, ...) used
/// for `${name}` substitution in the configured command. Returns `None`
/// when nothing resolves; the caller owns turning that into a
/// configuration error.
pub fn find_command(
    settings: &mut Settings,
    profile: &ToolProfile,
    vars: &HashMap<String, String>,
) -> Result<Option<String>, SettingsError> {
    find_command_in(
        settings,
        profile,
        vars,
        std::env::var_os("PATH").as_deref(),
    )
}

/// Same as [`find_command`] with the PATH value injected.
fn find_command_in(
    settings: &mut Settings,
    profile: &ToolProfile,
    vars: &HashMap<String, String>,
    path_var: Option<&OsStr>,
) -> Result<Option<String>, SettingsError> {
    let raw = settings.get_string(profile.command_key, "")?;
    let mut cmd = expand_vars(&expand_user(&raw), vars);

    // Only a discovery should be persisted; an explicit setting is
    // already the user's choice.
    let discovered = cmd.is_empty();

    if cmd.is_empty() {
        if let Some(found) = search_path(profile.candidates, path_var) {
            cmd = found.to_string_lossy().into_owned();
        }
    }

    if cmd.is_empty() {
        return Ok(None);
    }
    debug!("found command: {cmd}");

    if discovered {
        settings.persist(profile.command_key, Value::String(cmd.clone()))?;
    }
    Ok(Some(cmd))
}

/// First candidate found on `path_var`, searched in candidate order.
fn search_path(candidates: &[&str], path_var: Option<&OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    candidates
        .iter()
        .find_map(|candidate| which::which_in(candidate, Some(path_var), &cwd).ok())
}

/// Expand a leading `~` to the user's home directory.
fn expand_user(raw: &str) -> String {
    let Some(rest) = raw.strip_prefix('~') else {
        return raw.to_string();
    };
    if !rest.is_empty() && !rest.starts_with('/') && !rest.starts_with('\\') {
        // `~otheruser` forms are left to the shell we don't have.
        return raw.to_string();
    }
    match dirs::home_dir() {
        Some(home) => format!("{}{rest}", home.display()),
        None => raw.to_string(),
    }
}

/// Expand `${name}` references from the host's variable map. Unknown
/// names are left intact, the way host substitution behaves.
fn expand_vars(raw: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                // Unterminated reference; keep the remainder verbatim.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
