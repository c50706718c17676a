//! Rule-based block highlighting.
//!
//! A [`HighlightRuleSet`] is an ordered list of regex-to-style rules. Order is
//! priority: rules are applied in declaration order and a later rule's match
//! overwrites any overlapping portion of an earlier rule's span at the
//! character level. There is no blending and no error path — a rule that
//! matches nothing simply contributes no spans.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{EditError, EditResult};

mod rules;
pub use rules::{load_rules_file, pl1};

/// Visual style attached to a span: a color plus weight/slant flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub color: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl Style {
    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            bold: false,
            italic: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

/// A contiguous byte range of a block plus the style to render it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSpan {
    pub start: usize,
    pub len: usize,
    pub style: Style,
}

impl StyleSpan {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// One pattern-to-style mapping, optionally scoped to a capture group so a
/// rule like `PROCEDURE\s+(\w+)` can colorize only the procedure name.
#[derive(Debug, Clone)]
pub struct HighlightRule {
    pattern: Regex,
    style: Style,
    capture: Option<usize>,
}

impl HighlightRule {
    pub fn new(pattern: &str, style: Style) -> EditResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| EditError::invalid_pattern(e.to_string()))?;
        Ok(Self {
            pattern,
            style,
            capture: None,
        })
    }

    /// Scopes the rule's styling to capture group `capture`, which the
    /// pattern must define.
    pub fn with_capture(pattern: &str, style: Style, capture: usize) -> EditResult<Self> {
        let compiled =
            Regex::new(pattern).map_err(|e| EditError::invalid_pattern(e.to_string()))?;
        if capture == 0 || capture >= compiled.captures_len() {
            return Err(EditError::invalid_pattern(format!(
                "pattern `{pattern}` has no capture group {capture}"
            )));
        }
        Ok(Self {
            pattern: compiled,
            style,
            capture: Some(capture),
        })
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Byte ranges this rule styles in `text`: the full range of every
    /// non-overlapping match, or the capture group's range when scoped. A
    /// match whose scoped group did not participate contributes nothing.
    fn match_ranges(&self, text: &str) -> Vec<(usize, usize)> {
        match self.capture {
            None => self
                .pattern
                .find_iter(text)
                .map(|m| (m.start(), m.end()))
                .collect(),
            Some(group) => self
                .pattern
                .captures_iter(text)
                .filter_map(|caps| caps.get(group).map(|g| (g.start(), g.end())))
                .collect(),
        }
    }
}

/// Ordered rule list applied to one line/block of text at a time.
///
/// Re-invoked on every edit to the containing block; never scans beyond the
/// block it is given. Purely functional: returns spans, mutates nothing.
#[derive(Debug, Clone, Default)]
pub struct HighlightRuleSet {
    rules: Vec<HighlightRule>,
}

impl HighlightRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule. Declaration order encodes precedence: this rule now
    /// overwrites every rule pushed before it wherever their spans overlap.
    pub fn push(&mut self, rule: HighlightRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies every rule to `text` and returns the resulting spans, sorted
    /// by start offset and coalesced into maximal same-style runs.
    pub fn highlight(&self, text: &str) -> Vec<StyleSpan> {
        // Paint rule indices into a per-byte map so later rules overwrite
        // earlier ones exactly at the character level.
        let mut painted: Vec<Option<usize>> = vec![None; text.len()];
        for (index, rule) in self.rules.iter().enumerate() {
            for (start, end) in rule.match_ranges(text) {
                for slot in &mut painted[start..end] {
                    *slot = Some(index);
                }
            }
        }

        let mut spans = Vec::new();
        let mut pos = 0;
        while pos < painted.len() {
            let Some(index) = painted[pos] else {
                pos += 1;
                continue;
            };
            let start = pos;
            while pos < painted.len() && painted[pos] == Some(index) {
                pos += 1;
            }
            spans.push(StyleSpan {
                start,
                len: pos - start,
                style: self.rules[index].style.clone(),
            });
        }
        spans
    }
}

impl FromIterator<HighlightRule> for HighlightRuleSet {
    fn from_iter<I: IntoIterator<Item = HighlightRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
