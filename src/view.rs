//! The host seam: documents, selections, and notifications.
//!
//! The host editor owns the document. This crate only ever touches it
//! through [`EditorView`], so any host (or a test) can participate by
//! implementing six document methods plus the status line. Offsets are
//! char offsets, matching how hosts address text, not bytes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A directional span of text: `anchor` is where the selection started,
/// `active` is where the caret is. `anchor <= active` reads as a forward
/// selection; the two collapse to a caret when equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    pub active: usize,
}

impl Selection {
    pub fn new(anchor: usize, active: usize) -> Self {
        Self { anchor, active }
    }

    /// A collapsed selection (caret only).
    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Span covering `0..len`.
    pub fn whole(len: usize) -> Self {
        Self::new(0, len)
    }

    pub fn begin(&self) -> usize {
        self.anchor.min(self.active)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.active)
    }

    pub fn len(&self) -> usize {
        self.end() - self.begin()
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.active
    }

    /// Direction encodes cursor-drag orientation: forward selections were
    /// dragged (or typed) left-to-right.
    pub fn is_forward(&self) -> bool {
        self.anchor <= self.active
    }
}

/// The host's in-memory representation of one open document.
///
/// Implementations must address text by char offset and must apply
/// `replace` as a single edit.
pub trait EditorView {
    /// Document length in chars.
    fn len_chars(&self) -> usize;

    /// Text covered by `region` (direction-insensitive).
    fn text(&self, region: Selection) -> String;

    /// Replace `region` with `text` in one atomic edit.
    fn replace(&mut self, region: Selection, text: &str);

    /// Current selection set, in host order.
    fn selections(&self) -> Vec<Selection>;

    /// Replace the live selection set wholesale, in the given order.
    fn set_selections(&mut self, selections: &[Selection]);

    /// Document charset label as the host reports it, `None` when unknown.
    fn encoding(&self) -> Option<String>;

    /// Backing file, `None` for unsaved buffers.
    fn file_path(&self) -> Option<PathBuf>;

    /// Write a status-line slot.
    fn set_status(&mut self, key: &str, message: &str);

    /// Clear a status-line slot.
    fn erase_status(&mut self, key: &str);

    /// First visible offset. Only meaningful on legacy hosts; modern hosts
    /// keep scroll position themselves and may ignore these two.
    fn viewport_offset(&self) -> usize {
        0
    }

    fn set_viewport_offset(&mut self, _offset: usize) {}
}

/// Modal notifications raised outside the status line.
pub trait Notifier {
    fn popup(&self, message: &str);
}

/// Notifier that drops everything; for hosts with no modal surface.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn popup(&self, _message: &str) {}
}

/// In-memory [`EditorView`] used by the CLI host and by tests.
#[derive(Debug, Clone, Default)]
pub struct ScratchView {
    buffer: String,
    selections: Vec<Selection>,
    encoding: Option<String>,
    file_path: Option<PathBuf>,
    status: BTreeMap<String, String>,
    viewport_offset: usize,
}

impl ScratchView {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            buffer: text.into(),
            selections: vec![Selection::caret(0)],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, label: &str) -> Self {
        self.encoding = Some(label.to_string());
        self
    }

    #[must_use]
    pub fn with_selections(mut self, selections: Vec<Selection>) -> Self {
        self.selections = selections;
        self
    }

    /// Full buffer contents.
    pub fn contents(&self) -> &str {
        &self.buffer
    }

    pub fn status(&self, key: &str) -> Option<&str> {
        self.status.get(key).map(String::as_str)
    }

    fn char_to_byte(&self, char_offset: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_offset)
            .map_or(self.buffer.len(), |(idx, _)| idx)
    }
}

impl EditorView for ScratchView {
    fn len_chars(&self) -> usize {
        self.buffer.chars().count()
    }

    fn text(&self, region: Selection) -> String {
        let start = self.char_to_byte(region.begin());
        let end = self.char_to_byte(region.end());
        self.buffer[start..end].to_string()
    }

    fn replace(&mut self, region: Selection, text: &str) {
        let start = self.char_to_byte(region.begin());
        let end = self.char_to_byte(region.end());
        self.buffer.replace_range(start..end, text);
    }

    fn selections(&self) -> Vec<Selection> {
        self.selections.clone()
    }

    fn set_selections(&mut self, selections: &[Selection]) {
        self.selections = selections.to_vec();
    }

    fn encoding(&self) -> Option<String> {
        self.encoding.clone()
    }

    fn file_path(&self) -> Option<PathBuf> {
        self.file_path.clone()
    }

    fn set_status(&mut self, key: &str, message: &str) {
        self.status.insert(key.to_string(), message.to_string());
    }

    fn erase_status(&mut self, key: &str) {
        self.status.remove(key);
    }

    fn viewport_offset(&self) -> usize {
        self.viewport_offset
    }

    fn set_viewport_offset(&mut self, offset: usize) {
        self.viewport_offset = offset;
    }
}

/// Convenience for hosts handing paths around.
pub fn file_directory(path: Option<&Path>) -> Option<PathBuf> {
    path.and_then(Path::parent).map(Path::to_path_buf)
}
