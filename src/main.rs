//! `ImpSort` CLI - a terminal host for the import-sorter bridge.
//!
//! Files on disk stand in for editor buffers: the file is loaded into a
//! scratch view, pushed through the same round-trip an editor plugin
//! would use, and written back only if the sorter changed it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use impsort::settings::keys;
use impsort::{
    find_command, ConfigStore, HostGeneration, Notifier, Plugin, ScratchView, Settings,
    TomlConfigStore, ToolProfile,
};

#[derive(Parser)]
#[command(name = "impsort")]
#[command(about = "Sort imports in source files via an external sorter")]
#[command(version)]
struct Cli {
    /// Verbose plugin logging
    #[arg(long, global = true)]
    debug: bool,

    /// Settings file (defaults to the per-user config location)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sort imports in a file, in place
    Sort {
        /// File to sort
        file: PathBuf,

        /// Sorter command (overrides the 'command' setting)
        #[arg(short, long)]
        command: Option<String>,

        /// Document charset label (utf-8, latin1, ...)
        #[arg(short, long)]
        encoding: Option<String>,

        /// Go through the pre-save hook (honors on_save and exclusion globs)
        #[arg(long)]
        save: bool,
    },

    /// Resolve and print the sorter executable
    Locate,
}

/// Popup surface for a terminal host: modal messages go to stderr.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn popup(&self, message: &str) {
        eprintln!("{message}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let store = match &cli.settings {
        Some(path) => TomlConfigStore::new(path),
        None => TomlConfigStore::default_path("impsort"),
    };

    // The flag wins; otherwise honor the stored `debug` setting.
    let debug = cli.debug
        || store
            .get(keys::DEBUG)
            .ok()
            .flatten()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { "impsort=debug" } else { "impsort=info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    match cli.command {
        Commands::Sort {
            file,
            command,
            encoding,
            save,
        } => cmd_sort(&file, command, encoding.as_deref(), save, store),
        Commands::Locate => cmd_locate(store),
    }
}

fn cmd_sort(
    file: &Path,
    command: Option<String>,
    encoding: Option<&str>,
    save: bool,
    store: TomlConfigStore,
) -> Result<()> {
    let label = encoding.unwrap_or("utf-8");
    let Some(charset) = encoding_rs::Encoding::for_label(label.as_bytes()) else {
        bail!("unknown encoding label '{label}'");
    };

    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let (text, _, had_errors) = charset.decode(&bytes);
    if had_errors {
        bail!("{} is not valid {}", file.display(), charset.name());
    }
    let original = text.into_owned();

    let mut overrides = toml::Table::new();
    if let Some(cmd) = command {
        overrides.insert("command".to_string(), toml::Value::String(cmd));
    }
    let settings = Settings::new(
        "ImpSort",
        Some(toml::Value::Table(overrides)),
        Box::new(store),
    );

    let mut plugin = Plugin::new(
        ToolProfile::isort(),
        settings,
        HostGeneration::Modern,
        Box::new(StderrNotifier),
    )
    .with_vars(host_vars(file));
    let mut view = ScratchView::new(original.clone())
        .with_file_path(file)
        .with_encoding(label);

    if save {
        if !plugin.on_pre_save(&mut view)? {
            println!("skipped {}", file.display());
            return Ok(());
        }
    } else {
        plugin.sort_document(&mut view)?;
    }

    if view.contents() == original {
        println!("already sorted {}", file.display());
        return Ok(());
    }

    let (encoded, _, had_errors) = charset.encode(view.contents());
    if had_errors {
        bail!("sorted text is not representable in {}", charset.name());
    }
    std::fs::write(file, &encoded)
        .with_context(|| format!("failed to write {}", file.display()))?;
    println!("sorted {}", file.display());
    Ok(())
}

fn cmd_locate(store: TomlConfigStore) -> Result<()> {
    let mut settings = Settings::new("ImpSort", None, Box::new(store));
    match find_command(&mut settings, &ToolProfile::isort(), &HashMap::new())? {
        Some(cmd) => {
            println!("{cmd}");
            Ok(())
        }
        None => bail!("no import sorter found; configure the 'command' setting or install isort"),
    }
}

/// Variable map a real host would extract from its window state.
fn host_vars(file: &Path) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert("file".to_string(), file.display().to_string());
    if let Some(parent) = file.parent() {
        vars.insert("file_path".to_string(), parent.display().to_string());
    }
    if let Some(name) = file.file_name() {
        vars.insert("file_name".to_string(), name.to_string_lossy().into_owned());
    }
    vars
}
