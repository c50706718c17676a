//! Find/replace within one open document.
//!
//! All operations run against an exclusively borrowed buffer, so nothing here
//! can race a concurrent highlight or edit on the same document. Absence of a
//! match is reported as `None`/`0`/`false` — "no matches" is an outcome for
//! the caller to surface, not an error.

use std::ops::Range;
use tracing::debug;

use crate::buffer::TextBuffer;
use crate::highlight::{Style, StyleSpan};
use crate::query::{Direction, SearchQuery};

/// The fixed style `highlight_all` paints every match with.
pub fn match_style() -> Style {
    Style::color("#FFFF00")
}

/// Finds the next match from `from` in the query's direction.
///
/// No wrap-around: scanning forward past the last match, or backward past the
/// first, returns `None` and the caller reports "no (more) matches found".
pub fn find_next<B: TextBuffer>(
    buffer: &B,
    query: &SearchQuery,
    from: usize,
) -> Option<Range<usize>> {
    if query.is_empty() {
        return None;
    }
    let text = buffer.text();
    match query.direction() {
        Direction::Forward => query.first_match_at(text, from).map(|(s, e)| s..e),
        Direction::Backward => query
            .find_in(text)
            .into_iter()
            .take_while(|&(_, end)| end <= from)
            .last()
            .map(|(s, e)| s..e),
    }
}

/// Clears any previous highlight layer, then paints every match in the
/// document with [`match_style`]. Returns the match count, possibly zero.
/// Calling it twice without edits in between is idempotent: one layer, same
/// count.
pub fn highlight_all<B: TextBuffer>(buffer: &mut B, query: &SearchQuery) -> usize {
    buffer.clear_style_spans();
    if query.is_empty() {
        return 0;
    }
    let style = match_style();
    let spans: Vec<StyleSpan> = query
        .find_in(buffer.text())
        .into_iter()
        .map(|(start, end)| StyleSpan {
            start,
            len: end - start,
            style: style.clone(),
        })
        .collect();
    let count = spans.len();
    buffer.apply_style_spans(&spans);
    debug!("highlighted {count} matches");
    count
}

/// Replaces one occurrence. An existing selection is replaced directly;
/// otherwise the next match from the cursor is located and replaced. Returns
/// whether a replacement happened.
pub fn replace_one<B: TextBuffer>(buffer: &mut B, query: &SearchQuery, replacement: &str) -> bool {
    if query.is_empty() {
        return false;
    }
    if buffer.selection().is_none() {
        let cursor = buffer.cursor();
        match find_next(buffer, query, cursor) {
            Some(range) => buffer.select(range.start, range.end),
            None => return false,
        }
    }
    buffer.insert_text(replacement);
    true
}

/// Replaces every match in document order inside a single edit transaction.
///
/// The scan resumes after each inserted replacement, so replacement text is
/// never re-matched within the same call even when it contains the pattern.
/// Returns the replacement count; zero means "no matches" upstream.
pub fn replace_all<B: TextBuffer>(buffer: &mut B, query: &SearchQuery, replacement: &str) -> usize {
    if query.is_empty() {
        return 0;
    }
    buffer.begin_edit_transaction();
    let mut count = 0;
    let mut pos = 0;
    loop {
        let found = query.first_match_at(buffer.text(), pos);
        let Some((start, end)) = found else { break };
        buffer.select(start, end);
        buffer.insert_text(replacement);
        count += 1;
        // Resume after the inserted text so the replacement is never
        // re-matched within this call.
        pos = start + replacement.len();
        if end == start {
            // Zero-width match: consume one character so the scan advances.
            match buffer.text()[pos..].chars().next() {
                Some(ch) => pos += ch.len_utf8(),
                None => break,
            }
        }
    }
    buffer.end_edit_transaction();
    debug!("replaced {count} occurrences");
    count
}

/// Scoped highlight ownership for a find session: highlights applied through
/// the session are cleared when it is dropped, the way a search dialog cleans
/// up when it closes.
pub struct HighlightSession<'a, B: TextBuffer> {
    buffer: &'a mut B,
}

impl<'a, B: TextBuffer> HighlightSession<'a, B> {
    pub fn new(buffer: &'a mut B) -> Self {
        Self { buffer }
    }

    pub fn highlight_all(&mut self, query: &SearchQuery) -> usize {
        highlight_all(self.buffer, query)
    }

    pub fn find_next(&self, query: &SearchQuery, from: usize) -> Option<Range<usize>> {
        find_next(self.buffer, query, from)
    }
}

impl<B: TextBuffer> Drop for HighlightSession<'_, B> {
    fn drop(&mut self) {
        self.buffer.clear_style_spans();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PlainBuffer;
    use crate::errors::EditError;

    fn forward(pattern: &str) -> SearchQuery {
        SearchQuery::new(pattern, true, false, Direction::Forward).unwrap()
    }

    fn backward(pattern: &str) -> SearchQuery {
        SearchQuery::new(pattern, true, false, Direction::Backward).unwrap()
    }

    #[test]
    fn test_find_next_forward() {
        let buffer = PlainBuffer::new("foo bar foo baz");
        let query = forward("foo");
        assert_eq!(find_next(&buffer, &query, 0), Some(0..3));
        assert_eq!(find_next(&buffer, &query, 3), Some(8..11));
    }

    #[test]
    fn test_find_next_does_not_wrap() {
        let buffer = PlainBuffer::new("foo bar");
        let query = forward("foo");
        // Past the last match: NotFound, not a wrapped hit at offset 0.
        assert_eq!(find_next(&buffer, &query, 4), None);
        assert_eq!(find_next(&buffer, &query, buffer.text().len()), None);
    }

    #[test]
    fn test_find_next_backward() {
        let buffer = PlainBuffer::new("foo bar foo baz");
        let query = backward("foo");
        assert_eq!(find_next(&buffer, &query, buffer.text().len()), Some(8..11));
        assert_eq!(find_next(&buffer, &query, 8), Some(0..3));
        assert_eq!(find_next(&buffer, &query, 2), None);
    }

    #[test]
    fn test_find_next_empty_pattern_is_noop() {
        let buffer = PlainBuffer::new("anything");
        let query = forward("");
        assert_eq!(find_next(&buffer, &query, 0), None);
    }

    #[test]
    fn test_invalid_regex_rejected_before_any_scan() {
        let err = SearchQuery::new("(unclosed", true, true, Direction::Forward).unwrap_err();
        assert!(matches!(err, EditError::InvalidPattern(_)));
    }

    #[test]
    fn test_highlight_all_counts_and_layers() {
        let mut buffer = PlainBuffer::new("foo bar foo baz foo");
        let query = forward("foo");
        assert_eq!(highlight_all(&mut buffer, &query), 3);
        assert_eq!(buffer.highlights().len(), 3);

        // Second call with no edits: same count, still exactly one layer.
        assert_eq!(highlight_all(&mut buffer, &query), 3);
        assert_eq!(buffer.highlights().len(), 3);
    }

    #[test]
    fn test_highlight_all_zero_matches() {
        let mut buffer = PlainBuffer::new("nothing here");
        assert_eq!(highlight_all(&mut buffer, &forward("foo")), 0);
        assert!(buffer.highlights().is_empty());
        // Safe with no prior highlights and an empty pattern.
        assert_eq!(highlight_all(&mut buffer, &forward("")), 0);
    }

    #[test]
    fn test_replace_one_uses_existing_selection() {
        let mut buffer = PlainBuffer::new("alpha beta");
        buffer.select(0, 5);
        assert!(replace_one(&mut buffer, &forward("beta"), "gamma"));
        // The selection is replaced directly, whatever it covers.
        assert_eq!(buffer.text(), "gamma beta");
    }

    #[test]
    fn test_replace_one_finds_from_cursor() {
        let mut buffer = PlainBuffer::new("foo bar foo");
        buffer.set_cursor(4);
        assert!(replace_one(&mut buffer, &forward("foo"), "qux"));
        assert_eq!(buffer.text(), "foo bar qux");
    }

    #[test]
    fn test_replace_one_no_match() {
        let mut buffer = PlainBuffer::new("foo bar");
        buffer.set_cursor(0);
        assert!(!replace_one(&mut buffer, &forward("missing"), "x"));
        assert_eq!(buffer.text(), "foo bar");
    }

    #[test]
    fn test_replace_all_counts_and_replaces() {
        let mut buffer = PlainBuffer::new("foo bar foo baz foo");
        assert_eq!(replace_all(&mut buffer, &forward("foo"), "qux"), 3);
        assert_eq!(buffer.text(), "qux bar qux baz qux");
    }

    #[test]
    fn test_replace_all_is_one_transaction() {
        let mut buffer = PlainBuffer::new("a a a a");
        assert_eq!(replace_all(&mut buffer, &forward("a"), "b"), 4);
        assert_eq!(buffer.transactions_completed(), 1);
        assert!(!buffer.in_transaction());
    }

    #[test]
    fn test_replace_all_never_rescans_replacement() {
        // "foo" -> "foofoo": naive re-scanning would never terminate.
        let mut buffer = PlainBuffer::new("foo x foo");
        assert_eq!(replace_all(&mut buffer, &forward("foo"), "foofoo"), 2);
        assert_eq!(buffer.text(), "foofoo x foofoo");
    }

    #[test]
    fn test_replace_all_with_empty_replacement() {
        let mut buffer = PlainBuffer::new("foofoo bar foo");
        assert_eq!(replace_all(&mut buffer, &forward("foo"), ""), 3);
        assert_eq!(buffer.text(), " bar ");
    }

    #[test]
    fn test_replace_all_zero_width_regex_terminates() {
        // "a*" matches zero-width before every unconsumed character; the
        // scan must still consume the text and finish.
        let mut buffer = PlainBuffer::new("bbb");
        let query = SearchQuery::new("a*", true, true, Direction::Forward).unwrap();
        assert_eq!(replace_all(&mut buffer, &query, "x"), 4);
        assert_eq!(buffer.text(), "xbxbxbx");
    }

    #[test]
    fn test_replace_all_zero_width_over_multibyte_text() {
        let mut buffer = PlainBuffer::new("éb");
        let query = SearchQuery::new("a*", true, true, Direction::Forward).unwrap();
        assert_eq!(replace_all(&mut buffer, &query, "x"), 3);
        assert_eq!(buffer.text(), "xéxbx");
    }

    #[test]
    fn test_replace_all_zero_matches() {
        let mut buffer = PlainBuffer::new("nothing");
        assert_eq!(replace_all(&mut buffer, &forward("foo"), "bar"), 0);
        assert_eq!(buffer.text(), "nothing");
    }

    #[test]
    fn test_replace_all_empty_pattern_is_noop() {
        let mut buffer = PlainBuffer::new("abc");
        assert_eq!(replace_all(&mut buffer, &forward(""), "x"), 0);
        assert_eq!(buffer.text(), "abc");
        assert_eq!(buffer.transactions_completed(), 0);
    }

    #[test]
    fn test_replace_all_regex_document_order() {
        let mut buffer = PlainBuffer::new("id1 id22 id333");
        let query = SearchQuery::new(r"id\d+", true, true, Direction::Forward).unwrap();
        assert_eq!(replace_all(&mut buffer, &query, "ID"), 3);
        assert_eq!(buffer.text(), "ID ID ID");
    }

    #[test]
    fn test_highlight_session_clears_on_drop() {
        let mut buffer = PlainBuffer::new("foo foo");
        {
            let mut session = HighlightSession::new(&mut buffer);
            assert_eq!(session.highlight_all(&forward("foo")), 2);
        }
        assert!(buffer.highlights().is_empty());
    }
}
