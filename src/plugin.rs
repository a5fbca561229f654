//! The host-facing plugin surface.
//!
//! Wires the round-trip to the two trigger surfaces a host exposes — an
//! explicit "sort document" command and a pre-save hook — and owns the
//! user-visible error handling: status line, optional modal popup, debug
//! log. The selection preserver is chosen once here, at initialization,
//! from the host generation.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::FormatError;
use crate::format;
use crate::preserve::{preserver_for, with_preserved, HostGeneration, ViewPreserver};
use crate::profile::ToolProfile;
use crate::settings::{keys, Settings};
use crate::view::{EditorView, Notifier};

/// One initialized plugin instance: a tool profile bound to a settings
/// stack, a notifier, and a preserver for the host generation.
pub struct Plugin {
    profile: ToolProfile,
    settings: Settings,
    preserver: Box<dyn ViewPreserver>,
    notifier: Box<dyn Notifier>,
    vars: HashMap<String, String>,
}

impl Plugin {
    pub fn new(
        profile: ToolProfile,
        settings: Settings,
        generation: HostGeneration,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            profile,
            settings,
            preserver: preserver_for(generation),
            notifier,
            vars: HashMap::new(),
        }
    }

    /// Host variable map used for `${name}` expansion in the configured
    /// command (project path, file name, ...).
    #[must_use]
    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    pub fn settings(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// The explicit command: sort the whole document, preserving the
    /// selection set (and, on legacy hosts, the viewport) across the
    /// replacement.
    ///
    /// Documents the tool profile does not claim are skipped silently.
    /// Errors are reported to the host surfaces and also returned, so a
    /// non-editor host (the CLI) can turn them into an exit code.
    pub fn sort_document(&mut self, view: &mut dyn EditorView) -> Result<(), FormatError> {
        if !self.profile.claims(view.file_path().as_deref()) {
            debug!("document not claimed by {}, skipping", self.profile.name);
            return Ok(());
        }

        view.erase_status(self.profile.status_key);

        let Self {
            profile,
            settings,
            preserver,
            vars,
            ..
        } = self;
        let result = with_preserved(preserver.as_ref(), view, |v| {
            format::format_document(v, profile, settings, vars)
        });

        match result {
            Ok(region) => {
                debug!("replaced region {region:?}");
                Ok(())
            }
            Err(err) => {
                self.report_error(view, &err);
                Err(err)
            }
        }
    }

    /// The pre-save hook. Runs the sorter only when `on_save` is enabled
    /// and the filename matches none of the exclusion globs. Returns
    /// whether a formatting invocation happened.
    pub fn on_pre_save(&mut self, view: &mut dyn EditorView) -> Result<bool, FormatError> {
        if !self.settings.get_bool(keys::ON_SAVE, false)? {
            return Ok(false);
        }

        if let Some(path) = view.file_path() {
            let path_str = path.to_string_lossy();
            for raw in self.settings.get_string_list(keys::ONSAVE_IGNORE_FN_GLOB)? {
                let Ok(pattern) = glob::Pattern::new(&raw) else {
                    warn!("ignoring invalid glob pattern {raw:?}");
                    continue;
                };
                if pattern.matches(&path_str) {
                    info!("skipping sort, {path_str} matches pattern {raw}");
                    return Ok(false);
                }
            }
        }

        self.sort_document(view)?;
        Ok(true)
    }

    /// Surface an error the way the host expects: status line always, a
    /// modal popup when configured — or unconditionally for spawn
    /// failures, which the user cannot otherwise tell apart from the tool
    /// misbehaving.
    fn report_error(&mut self, view: &mut dyn EditorView, err: &FormatError) {
        let message = user_message(err);
        warn!("{}: {message}", self.profile.name);
        view.set_status(
            self.profile.status_key,
            &format!("{}: {message}", self.profile.name),
        );

        let popup = err.always_popup()
            || self
                .settings
                .get_bool(keys::POPUP_ERRORS, false)
                .unwrap_or(false);
        if popup {
            self.notifier.popup(&message);
        }
    }
}

/// Actionable phrasing per error kind.
fn user_message(err: &FormatError) -> String {
    match err {
        FormatError::Spawn { .. } => format!(
            "{err}\n\nYou may need to install the sorter and/or configure the 'command' setting."
        ),
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemoryConfigStore;
    use crate::view::{NullNotifier, ScratchView, Selection};
    use std::cell::RefCell;
    use std::rc::Rc;
    use toml::Value;

    #[derive(Default)]
    struct RecordingNotifier {
        messages: RefCell<Vec<String>>,
    }

    impl Notifier for Rc<RecordingNotifier> {
        fn popup(&self, message: &str) {
            self.messages.borrow_mut().push(message.to_string());
        }
    }

    fn plugin_with_store(store: MemoryConfigStore) -> Plugin {
        Plugin::new(
            ToolProfile::isort(),
            Settings::new("ImpSort", None, Box::new(store)),
            HostGeneration::Modern,
            Box::new(NullNotifier),
        )
    }

    #[test]
    fn unclaimed_documents_are_skipped() {
        // A command that would fail loudly if it ever ran.
        let store =
            MemoryConfigStore::new().with("command", Value::String("/nonexistent/sorter".into()));
        let mut plugin = plugin_with_store(store);
        let mut view = ScratchView::new("fn main() {}\n").with_file_path("main.rs");
        assert!(plugin.sort_document(&mut view).is_ok());
        assert_eq!(view.contents(), "fn main() {}\n");
    }

    #[test]
    fn on_save_disabled_performs_no_invocation() {
        let store =
            MemoryConfigStore::new().with("command", Value::String("/nonexistent/sorter".into()));
        let mut plugin = plugin_with_store(store);
        let mut view = ScratchView::new("import a\n").with_file_path("mod.py");
        // A missing binary would surface as a spawn error if this invoked.
        assert_eq!(plugin.on_pre_save(&mut view).unwrap(), false);
    }

    #[test]
    fn spawn_error_reports_status_and_always_popups() {
        let store =
            MemoryConfigStore::new().with("command", Value::String("/nonexistent/sorter".into()));
        let notifier = Rc::new(RecordingNotifier::default());
        let mut plugin = Plugin::new(
            ToolProfile::isort(),
            Settings::new("ImpSort", None, Box::new(store)),
            HostGeneration::Modern,
            Box::new(Rc::clone(&notifier)),
        );
        let mut view = ScratchView::new("import a\n").with_file_path("mod.py");

        let err = plugin.sort_document(&mut view).unwrap_err();
        assert!(matches!(err, FormatError::Spawn { .. }));
        let status = view.status("impsort").unwrap();
        assert!(status.starts_with("ImpSort: "));
        // popup_errors is off, spawn errors popup anyway
        assert_eq!(notifier.messages.borrow().len(), 1);
        assert!(notifier.messages.borrow()[0].contains("configure the 'command' setting"));
    }

    #[cfg(unix)]
    mod with_fake_tools {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::{Path, PathBuf};

        fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
            let path = dir.join(name);
            let script = format!("#!/bin/sh\nfor a; do f=$a; done\n{body}\n");
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        /// A tool that records it ran, then sorts the two-line fixture.
        fn marking_sorter(dir: &Path, marker: &Path) -> PathBuf {
            fake_tool(
                dir,
                "sorter",
                &format!(
                    "touch {}\nprintf 'import a\\nimport b\\n' > \"$f\"\nexit 0",
                    marker.display()
                ),
            )
        }

        fn store_for(tool: &Path) -> MemoryConfigStore {
            MemoryConfigStore::new()
                .with("command", Value::String(tool.to_string_lossy().into_owned()))
        }

        #[test]
        fn command_sorts_and_restores_selections() {
            let dir = tempfile::tempdir().unwrap();
            let marker = dir.path().join("ran");
            let tool = marking_sorter(dir.path(), &marker);
            let mut plugin = plugin_with_store(store_for(&tool));

            let selections = vec![Selection::new(12, 3), Selection::caret(9)];
            let mut view = ScratchView::new("import b\nimport a\n")
                .with_file_path("mod.py")
                .with_selections(selections.clone());

            plugin.sort_document(&mut view).unwrap();
            assert_eq!(view.contents(), "import a\nimport b\n");
            assert_eq!(view.selections(), selections);
            assert!(marker.exists());
        }

        #[test]
        fn caret_only_selection_roundtrips() {
            let dir = tempfile::tempdir().unwrap();
            let tool = fake_tool(dir.path(), "noop", "exit 0");
            let mut plugin = plugin_with_store(store_for(&tool));
            let mut view = ScratchView::new("import a\n")
                .with_selections(vec![Selection::caret(4)]);
            plugin.sort_document(&mut view).unwrap();
            assert_eq!(view.selections(), vec![Selection::caret(4)]);
        }

        #[test]
        fn failed_tool_leaves_document_and_selection_untouched() {
            let dir = tempfile::tempdir().unwrap();
            let tool = fake_tool(dir.path(), "broken", "echo 'ERROR: nope' >&2\nexit 1");
            let mut plugin = plugin_with_store(store_for(&tool));
            let mut view = ScratchView::new("import b\nimport a\n")
                .with_selections(vec![Selection::new(5, 2)]);

            let err = plugin.sort_document(&mut view).unwrap_err();
            assert!(matches!(err, FormatError::Tool { .. }));
            assert_eq!(view.contents(), "import b\nimport a\n");
            assert_eq!(view.selections(), vec![Selection::new(5, 2)]);
            assert_eq!(view.status("impsort"), Some("ImpSort: ERROR: nope"));
        }

        #[test]
        fn status_is_cleared_at_the_start_of_each_invocation() {
            let dir = tempfile::tempdir().unwrap();
            let tool = fake_tool(dir.path(), "noop", "exit 0");
            let mut plugin = plugin_with_store(store_for(&tool));
            let mut view = ScratchView::new("import a\n");
            view.set_status("impsort", "ImpSort: stale error");

            plugin.sort_document(&mut view).unwrap();
            assert_eq!(view.status("impsort"), None);
        }

        #[test]
        fn popup_errors_setting_raises_modal_for_tool_failures() {
            let dir = tempfile::tempdir().unwrap();
            let tool = fake_tool(dir.path(), "broken", "echo 'ERROR: nope' >&2\nexit 1");
            let store = store_for(&tool).with("popup_errors", Value::Boolean(true));
            let notifier = Rc::new(RecordingNotifier::default());
            let mut plugin = Plugin::new(
                ToolProfile::isort(),
                Settings::new("ImpSort", None, Box::new(store)),
                HostGeneration::Modern,
                Box::new(Rc::clone(&notifier)),
            );
            let mut view = ScratchView::new("import a\n");

            let _ = plugin.sort_document(&mut view);
            assert_eq!(notifier.messages.borrow().as_slice(), ["ERROR: nope"]);
        }

        #[test]
        fn on_save_runs_when_enabled() {
            let dir = tempfile::tempdir().unwrap();
            let marker = dir.path().join("ran");
            let tool = marking_sorter(dir.path(), &marker);
            let store = store_for(&tool).with("on_save", Value::Boolean(true));
            let mut plugin = plugin_with_store(store);
            let mut view = ScratchView::new("import b\nimport a\n").with_file_path("mod.py");

            assert!(plugin.on_pre_save(&mut view).unwrap());
            assert!(marker.exists());
            assert_eq!(view.contents(), "import a\nimport b\n");
        }

        #[test]
        fn on_save_skips_globbed_filenames() {
            let dir = tempfile::tempdir().unwrap();
            let marker = dir.path().join("ran");
            let tool = marking_sorter(dir.path(), &marker);
            let store = store_for(&tool)
                .with("on_save", Value::Boolean(true))
                .with(
                    "onsave_ignore_fn_glob",
                    Value::Array(vec![
                        Value::String("*_pb2.py".into()),
                        Value::String("*/migrations/*".into()),
                    ]),
                );
            let mut plugin = plugin_with_store(store);

            let mut view =
                ScratchView::new("import b\nimport a\n").with_file_path("proto/api_pb2.py");
            assert_eq!(plugin.on_pre_save(&mut view).unwrap(), false);
            assert!(!marker.exists());
            assert_eq!(view.contents(), "import b\nimport a\n");

            // Non-matching files still format.
            let mut view = ScratchView::new("import b\nimport a\n").with_file_path("app/mod.py");
            assert!(plugin.on_pre_save(&mut view).unwrap());
            assert!(marker.exists());
        }
    }
}
