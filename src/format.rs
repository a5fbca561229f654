//! The formatting round-trip.
//!
//! One synchronous pipeline: encode the buffer in the document charset,
//! materialize it into a temp file, run the external sorter on that file,
//! and on exit 0 read the rewritten file back as the new document text.
//! The temp file is removed on every exit path before the outcome reaches
//! the caller. There is no cancellation or timeout; a hung tool hangs the
//! invocation (documented limitation of the host's command model).

use std::collections::HashMap;
use std::io::Write;

use encoding_rs::Encoding;
use tracing::{debug, warn};

use crate::error::FormatError;
use crate::invoke::InvocationSpec;
use crate::locate;
use crate::profile::ToolProfile;
use crate::settings::{keys, Settings};
use crate::view::{EditorView, Selection};

/// Exit codes treated as success. Some tool versions use other codes to
/// mean "changes were made"; those are still failures for the tool this
/// crate targets.
pub const SUCCESS_EXIT_CODES: &[i32] = &[0];

/// Sort the whole document through the external tool.
///
/// On success the buffer is replaced in one edit and the region covering
/// the new text is returned, direction preserved. On any error the
/// document is left unmodified.
pub fn format_document(
    view: &mut dyn EditorView,
    profile: &ToolProfile,
    settings: &mut Settings,
    vars: &HashMap<String, String>,
) -> Result<Selection, FormatError> {
    let encoding = resolve_encoding(view, settings)?;

    let selection = Selection::whole(view.len_chars());
    debug!("formatting selection {selection:?}");
    let text = view.text(selection);

    let (encoded, _, had_errors) = encoding.encode(&text);
    if had_errors {
        return Err(FormatError::Encoding {
            encoding: encoding.name().to_string(),
        });
    }

    let mut temp = tempfile::Builder::new()
        .prefix(profile.status_key)
        .suffix(profile.temp_suffix)
        .tempfile()?;
    temp.write_all(&encoded)?;
    temp.flush()?;

    let command = locate::find_command(settings, profile, vars)?
        .ok_or(FormatError::CommandNotFound)?;

    let mut spec = InvocationSpec::new(
        &command,
        view.file_path().as_deref(),
        encoding.name(),
    );
    spec.push_args(profile.apply_args.iter().copied().map(str::to_string));
    spec.push_args([temp.path().to_string_lossy().into_owned()]);

    let outcome = run_round_trip(&spec, temp.path(), encoding);

    // Removal happens here, before any outcome is surfaced.
    if let Err(err) = temp.close() {
        warn!("failed to remove temp file: {err}");
    }

    let new_text = outcome?;
    view.replace(selection, &new_text);
    Ok(reselect(selection, new_text.chars().count()))
}

/// Spawn the tool and, on success, read the rewritten temp file back.
fn run_round_trip(
    spec: &InvocationSpec,
    temp_path: &std::path::Path,
    encoding: &'static Encoding,
) -> Result<String, FormatError> {
    let output = spec.run()?;
    let exit_code = output.status.code();
    debug!("exit code {exit_code:?}");

    if !exit_code.is_some_and(|code| SUCCESS_EXIT_CODES.contains(&code)) {
        let stderr = encoding.decode(&output.stderr).0.replace("\r\n", "\n");
        debug!("error:\n{stderr}");
        let message = match stderr.lines().last() {
            Some(last) => last.to_string(),
            None => match exit_code {
                Some(code) => format!("import sorter exited with code {code}"),
                None => "import sorter was terminated by a signal".to_string(),
            },
        };
        return Err(FormatError::Tool {
            message,
            exit_code,
            stderr,
        });
    }

    let bytes = std::fs::read(temp_path)?;
    let (new_text, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        return Err(FormatError::Encoding {
            encoding: encoding.name().to_string(),
        });
    }
    Ok(new_text.into_owned())
}

/// Region covering replacement text of char length `len`, preserving the
/// original selection's direction: the caret lands at the same logical
/// end relative to typing direction.
fn reselect(original: Selection, len: usize) -> Selection {
    if original.is_forward() {
        Selection::new(original.anchor, original.anchor + len)
    } else {
        Selection::new(original.active + len, original.active)
    }
}

/// Resolve the charset used for the round-trip: the host-reported label,
/// or the configured default when the host does not know.
fn resolve_encoding(
    view: &dyn EditorView,
    settings: &Settings,
) -> Result<&'static Encoding, FormatError> {
    let label = match view.encoding() {
        Some(label) if !label.is_empty() && label != "Undefined" => {
            debug!("encoding is {label:?}");
            label
        }
        _ => {
            let fallback = settings.get_string(keys::DEFAULT_ENCODING, "utf-8")?;
            debug!("encoding is not specified, falling back to default {fallback:?}");
            fallback
        }
    };
    Encoding::for_label(label.as_bytes()).ok_or(FormatError::UnknownEncoding(label))
}
