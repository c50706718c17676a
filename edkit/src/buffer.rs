//! The editor-widget collaborator boundary.
//!
//! The real text widget lives in the GUI shell; the engines only need the
//! narrow surface below. [`PlainBuffer`] is the in-memory implementation used
//! by tests, the CLI, and anything else that wants the engines without a
//! widget.

use crate::highlight::StyleSpan;

/// Minimal text-widget surface the search engines drive.
///
/// Offsets are byte offsets into the buffer text. `insert_text` replaces the
/// selection when one exists, which is how a located match gets swapped for
/// its replacement. Edit transactions bracket a batch of edits into a single
/// undo step; the widget decides what that means.
pub trait TextBuffer {
    fn text(&self) -> &str;

    fn cursor(&self) -> usize;
    fn set_cursor(&mut self, offset: usize);

    fn selection(&self) -> Option<(usize, usize)>;
    fn select(&mut self, start: usize, end: usize);
    fn clear_selection(&mut self);

    /// Replaces the selection if any, otherwise inserts at the cursor. The
    /// cursor ends up just past the inserted text and the selection is gone.
    fn insert_text(&mut self, text: &str);

    fn apply_style_spans(&mut self, spans: &[StyleSpan]);
    fn clear_style_spans(&mut self);

    fn begin_edit_transaction(&mut self);
    fn end_edit_transaction(&mut self);
}

/// Typed access to "the current editor", replacing ad-hoc widget casting.
pub trait ActiveDocumentProvider {
    type Buffer: TextBuffer;

    fn active_buffer(&mut self) -> Option<&mut Self::Buffer>;
}

/// Byte offset of the start of a 1-based line, clamped to the last line.
/// Used to reposition the cursor after a multi-file match is selected.
pub fn offset_of_line(text: &str, line_number: usize) -> usize {
    if line_number <= 1 {
        return 0;
    }
    let mut remaining = line_number - 1;
    for (offset, ch) in text.char_indices() {
        if ch == '\n' {
            remaining -= 1;
            if remaining == 0 {
                return offset + 1;
            }
        }
    }
    // Fewer lines than requested: clamp to the start of the last line.
    text.rfind('\n').map_or(0, |n| n + 1)
}

/// In-memory text buffer with a single highlight layer and a transaction
/// counter, sufficient to observe everything the engines promise.
#[derive(Debug, Default, Clone)]
pub struct PlainBuffer {
    text: String,
    cursor: usize,
    selection: Option<(usize, usize)>,
    highlights: Vec<StyleSpan>,
    transaction_depth: u32,
    transactions_completed: u32,
}

impl PlainBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// The currently applied highlight layer.
    pub fn highlights(&self) -> &[StyleSpan] {
        &self.highlights
    }

    /// How many top-level edit transactions have completed.
    pub fn transactions_completed(&self) -> u32 {
        self.transactions_completed
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction_depth > 0
    }
}

impl TextBuffer for PlainBuffer {
    fn text(&self) -> &str {
        &self.text
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn set_cursor(&mut self, offset: usize) {
        self.cursor = offset.min(self.text.len());
        self.selection = None;
    }

    fn selection(&self) -> Option<(usize, usize)> {
        self.selection
    }

    fn select(&mut self, start: usize, end: usize) {
        let end = end.min(self.text.len());
        let start = start.min(end);
        self.selection = Some((start, end));
        self.cursor = end;
    }

    fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn insert_text(&mut self, text: &str) {
        match self.selection.take() {
            Some((start, end)) => {
                self.text.replace_range(start..end, text);
                self.cursor = start + text.len();
            }
            None => {
                let at = self.cursor.min(self.text.len());
                self.text.insert_str(at, text);
                self.cursor = at + text.len();
            }
        }
    }

    fn apply_style_spans(&mut self, spans: &[StyleSpan]) {
        self.highlights.extend_from_slice(spans);
    }

    fn clear_style_spans(&mut self) {
        self.highlights.clear();
    }

    fn begin_edit_transaction(&mut self) {
        self.transaction_depth += 1;
    }

    fn end_edit_transaction(&mut self) {
        debug_assert!(self.transaction_depth > 0, "unbalanced edit transaction");
        self.transaction_depth = self.transaction_depth.saturating_sub(1);
        if self.transaction_depth == 0 {
            self.transactions_completed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_at_cursor() {
        let mut buffer = PlainBuffer::new("HELLO WORLD");
        buffer.set_cursor(5);
        buffer.insert_text(",");
        assert_eq!(buffer.text(), "HELLO, WORLD");
        assert_eq!(buffer.cursor(), 6);
    }

    #[test]
    fn test_insert_replaces_selection() {
        let mut buffer = PlainBuffer::new("CALL OLDNAME;");
        buffer.select(5, 12);
        buffer.insert_text("NEWPROC");
        assert_eq!(buffer.text(), "CALL NEWPROC;");
        assert_eq!(buffer.cursor(), 12);
        assert_eq!(buffer.selection(), None);
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut buffer = PlainBuffer::new("short");
        buffer.select(2, 100);
        assert_eq!(buffer.selection(), Some((2, 5)));
    }

    #[test]
    fn test_transactions_nest() {
        let mut buffer = PlainBuffer::new("");
        buffer.begin_edit_transaction();
        buffer.begin_edit_transaction();
        buffer.end_edit_transaction();
        assert!(buffer.in_transaction());
        assert_eq!(buffer.transactions_completed(), 0);
        buffer.end_edit_transaction();
        assert_eq!(buffer.transactions_completed(), 1);
    }

    #[test]
    fn test_offset_of_line() {
        let text = "line one\nline two\nline three\n";
        assert_eq!(offset_of_line(text, 1), 0);
        assert_eq!(offset_of_line(text, 2), 9);
        assert_eq!(offset_of_line(text, 3), 18);
        assert_eq!(&text[offset_of_line(text, 3)..][..10], "line three");
    }

    #[test]
    fn test_offset_of_line_clamps_past_end() {
        let text = "one\ntwo";
        assert_eq!(offset_of_line(text, 99), 4);
        assert_eq!(offset_of_line("", 5), 0);
    }

    #[test]
    fn test_style_layers() {
        use crate::highlight::Style;
        let mut buffer = PlainBuffer::new("abc");
        buffer.apply_style_spans(&[StyleSpan {
            start: 0,
            len: 3,
            style: Style::color("#FFFF00"),
        }]);
        assert_eq!(buffer.highlights().len(), 1);
        buffer.clear_style_spans();
        assert!(buffer.highlights().is_empty());
    }
}
