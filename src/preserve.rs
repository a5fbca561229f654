//! Selection/view preservation around a buffer replacement.
//!
//! Capturing and restoring is host-generation dependent: legacy hosts lose
//! their scroll position when the whole buffer is replaced, modern hosts
//! keep it natively and only need the selection set carried over. The
//! generation is picked once at plugin initialization, never per call.

use crate::view::{EditorView, Selection};

/// Which vintage of host this plugin instance is running inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostGeneration {
    /// Host restores scroll position itself; only selections need saving.
    Modern,
    /// Host loses the viewport on whole-buffer edits; save it too.
    Legacy,
}

/// Snapshot taken before an edit.
#[derive(Debug, Clone)]
pub struct ViewState {
    selections: Vec<Selection>,
    viewport_offset: Option<usize>,
}

/// Capture/restore pair around an edit. Restoration replaces the live
/// selection set wholesale, in original order; no diffing.
pub trait ViewPreserver {
    fn capture(&self, view: &dyn EditorView) -> ViewState;
    fn restore(&self, view: &mut dyn EditorView, state: &ViewState);
}

/// Preserver for modern hosts: selections only.
pub struct ModernPreserver;

impl ViewPreserver for ModernPreserver {
    fn capture(&self, view: &dyn EditorView) -> ViewState {
        ViewState {
            selections: view.selections(),
            viewport_offset: None,
        }
    }

    fn restore(&self, view: &mut dyn EditorView, state: &ViewState) {
        view.set_selections(&state.selections);
    }
}

/// Preserver for legacy hosts: selections plus the visible scroll offset.
pub struct LegacyPreserver;

impl ViewPreserver for LegacyPreserver {
    fn capture(&self, view: &dyn EditorView) -> ViewState {
        ViewState {
            selections: view.selections(),
            viewport_offset: Some(view.viewport_offset()),
        }
    }

    fn restore(&self, view: &mut dyn EditorView, state: &ViewState) {
        view.set_selections(&state.selections);
        if let Some(offset) = state.viewport_offset {
            view.set_viewport_offset(offset);
        }
    }
}

/// Select the preserver for a host generation. Called once during plugin
/// initialization.
pub fn preserver_for(generation: HostGeneration) -> Box<dyn ViewPreserver> {
    match generation {
        HostGeneration::Modern => Box::new(ModernPreserver),
        HostGeneration::Legacy => Box::new(LegacyPreserver),
    }
}

/// Run `edit` with the view state captured before and restored after,
/// whether or not the edit succeeded.
pub fn with_preserved<T>(
    preserver: &dyn ViewPreserver,
    view: &mut dyn EditorView,
    edit: impl FnOnce(&mut dyn EditorView) -> T,
) -> T {
    let state = preserver.capture(view);
    let outcome = edit(view);
    preserver.restore(view, &state);
    outcome
}
