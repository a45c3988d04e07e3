//! Edit value types and batch application for virtual document buffers.
//!
//! The external edit pipeline delivers ordered batches of incremental edits.
//! Each edit replaces a byte range with new text; an insertion uses an empty
//! range and a deletion uses empty text. Later edits in a batch are expressed
//! against the buffer state produced by the earlier edits, matching standard
//! incremental text-edit semantics.

use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, ProjectionResult};

/// Half-open byte range `[start, end)` into a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// An empty range, used for insertions.
    pub fn insertion(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// One incremental text edit: replace `range` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub range: TextRange,
    pub new_text: String,
}

impl TextEdit {
    pub fn new(range: TextRange, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }

    /// Insert `text` at `offset`.
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(TextRange::insertion(offset), text)
    }

    /// Delete the text covered by `range`.
    pub fn delete(range: TextRange) -> Self {
        Self::new(range, "")
    }
}

/// Apply an ordered edit batch to `text` and return the updated string.
///
/// Each edit is validated against the evolving scratch text before it is
/// applied, so a [`ProjectionError::MalformedEdit`] failure leaves the
/// caller's buffer untouched.
pub(crate) fn apply_edit_batch(text: &str, edits: &[TextEdit]) -> ProjectionResult<String> {
    let mut updated = text.to_string();

    for edit in edits {
        validate_edit(&updated, edit)?;
        updated.replace_range(edit.range.start..edit.range.end, &edit.new_text);
    }

    Ok(updated)
}

/// Check that an edit's range is consistent with the current buffer state.
fn validate_edit(text: &str, edit: &TextEdit) -> ProjectionResult<()> {
    let TextRange { start, end } = edit.range;

    if start > end {
        return Err(ProjectionError::malformed_edit(format!(
            "range start {start} is after range end {end}"
        )));
    }

    if end > text.len() {
        return Err(ProjectionError::malformed_edit(format!(
            "range end {end} exceeds buffer length {}",
            text.len()
        )));
    }

    if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
        return Err(ProjectionError::malformed_edit(format!(
            "range [{start}, {end}) does not fall on character boundaries"
        )));
    }

    Ok(())
}
