//! Child process invocation descriptors.
//!
//! Builds everything a spawn needs up front: argv (split honoring quoted
//! substrings so configured commands with embedded arguments parse
//! correctly), working directory (the edited file's directory), and a
//! full environment copy with `LANG` forced to the document charset.
//! On the windows family the console window is suppressed.

use std::collections::HashMap;
use std::path::Path;
use std::process::{Output, Stdio};

use tracing::debug;

use crate::error::FormatError;
use crate::view::file_directory;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Split a command line into discrete arguments.
///
/// Double- and single-quoted substrings group into one argument with the
/// quotes stripped; quotes may start mid-token (`--opt="a b"`). There is
/// no escape processing, matching how hosts hand commands around.
pub fn split_command(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quote: Option<char> = None;
    let mut has_token = false;

    for ch in command.chars() {
        match in_quote {
            Some(quote) if ch == quote => in_quote = None,
            Some(_) => current.push(ch),
            None => match ch {
                '"' | '\'' => {
                    in_quote = Some(ch);
                    has_token = true;
                }
                c if c.is_whitespace() => {
                    if has_token {
                        args.push(std::mem::take(&mut current));
                        has_token = false;
                    }
                }
                c => {
                    current.push(c);
                    has_token = true;
                }
            },
        }
    }
    if has_token {
        args.push(current);
    }
    args
}

/// Everything needed to run the external tool once.
#[derive(Debug, Clone)]
pub struct InvocationSpec {
    /// Argument vector; `argv[0]` is the program.
    pub argv: Vec<String>,
    /// Directory containing the file being edited, or unset for unsaved
    /// documents. Running there lets the tool pick up project-local
    /// configuration.
    pub cwd: Option<std::path::PathBuf>,
    /// Full inherited environment plus the forced locale override.
    pub env: HashMap<String, String>,
}

impl InvocationSpec {
    /// Build a spec from a configured command string.
    ///
    /// `encoding` is the resolved document charset name, exported as
    /// `LANG` so the tool agrees with us about text encoding.
    pub fn new(command: &str, file_path: Option<&Path>, encoding: &str) -> Self {
        let mut env: HashMap<String, String> = std::env::vars().collect();
        env.insert("LANG".to_string(), encoding.to_string());
        Self {
            argv: split_command(command),
            cwd: file_directory(file_path),
            env,
        }
    }

    /// Append trailing arguments (fixed apply flags, then the target file
    /// path last).
    pub fn push_args<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv.extend(args.into_iter().map(Into::into));
    }

    /// Run the process to completion, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// [`FormatError::Spawn`] when the OS cannot start the process — a
    /// distinct kind so callers can tell "tool missing" from "tool
    /// failed". A nonzero exit is NOT an error here; outcome
    /// discrimination belongs to the orchestrator.
    pub fn run(&self) -> Result<Output, FormatError> {
        let program = self.argv.first().ok_or(FormatError::CommandNotFound)?;

        let mut command = std::process::Command::new(program);
        command
            .args(&self.argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env_clear()
            .envs(&self.env);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        debug!("running {:?} in {:?}", self.argv, self.cwd);
        command.output().map_err(|source| FormatError::Spawn {
            command: program.clone(),
            source,
        })
    }
}
