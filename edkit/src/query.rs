use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::errors::{EditError, EditResult};

/// Compiled strategies are cached per pattern-and-flags so a scan over
/// thousands of lines compiles its pattern exactly once per session.
static STRATEGY_CACHE: Lazy<DashMap<String, MatchStrategy>> = Lazy::new(DashMap::new);

/// Scan direction for cursor-relative searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Strategy for pattern matching
#[derive(Debug, Clone)]
enum MatchStrategy {
    /// Case-sensitive plain substring search
    Literal(String),
    /// Everything else: regex mode, or case-folded literals compiled as an
    /// escaped regex
    Regex(Arc<Regex>),
}

/// An immutable, validated description of one search operation.
///
/// Regex validation happens here, at construction, never mid-scan: a query
/// that exists is a query whose pattern compiles. An empty pattern is legal
/// to construct; each engine treats it as a no-op.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pattern: String,
    case_sensitive: bool,
    use_regex: bool,
    direction: Direction,
    strategy: Option<MatchStrategy>,
}

impl SearchQuery {
    pub fn new(
        pattern: impl Into<String>,
        case_sensitive: bool,
        use_regex: bool,
        direction: Direction,
    ) -> EditResult<Self> {
        let pattern = pattern.into();
        let strategy = if pattern.is_empty() {
            None
        } else {
            let key = format!("{}/{}/{}", case_sensitive, use_regex, pattern);
            if let Some(entry) = STRATEGY_CACHE.get(&key) {
                Some(entry.clone())
            } else {
                let built = build_strategy(&pattern, case_sensitive, use_regex)?;
                STRATEGY_CACHE.insert(key, built.clone());
                Some(built)
            }
        };

        Ok(Self {
            pattern,
            case_sensitive,
            use_regex,
            direction,
            strategy,
        })
    }

    /// A forward, case-sensitive, literal query. Convenience for callers that
    /// only care about the pattern text; cannot fail validation.
    pub fn literal(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let strategy = if pattern.is_empty() {
            None
        } else {
            Some(MatchStrategy::Literal(pattern.clone()))
        };
        Self {
            pattern,
            case_sensitive: true,
            use_regex: false,
            direction: Direction::Forward,
            strategy,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn use_regex(&self) -> bool {
        self.use_regex
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_empty(&self) -> bool {
        self.strategy.is_none()
    }

    /// Finds every non-overlapping match in `text`, in text order, as
    /// half-open byte ranges.
    pub fn find_in(&self, text: &str) -> Vec<(usize, usize)> {
        match &self.strategy {
            None => Vec::new(),
            Some(MatchStrategy::Literal(needle)) => text
                .match_indices(needle.as_str())
                .map(|(start, matched)| (start, start + matched.len()))
                .collect(),
            Some(MatchStrategy::Regex(regex)) => regex
                .find_iter(text)
                .map(|m| (m.start(), m.end()))
                .collect(),
        }
    }

    /// Whether `line` contains at least one match.
    pub fn is_match(&self, line: &str) -> bool {
        match &self.strategy {
            None => false,
            Some(MatchStrategy::Literal(needle)) => line.contains(needle.as_str()),
            Some(MatchStrategy::Regex(regex)) => regex.is_match(line),
        }
    }

    /// First match starting at or after byte offset `from`, regardless of the
    /// query's direction. `from` is rounded up to the next char boundary.
    pub fn first_match_at(&self, text: &str, from: usize) -> Option<(usize, usize)> {
        if from > text.len() {
            return None;
        }
        let mut from = from;
        while !text.is_char_boundary(from) {
            from += 1;
        }
        match &self.strategy {
            None => None,
            Some(MatchStrategy::Literal(needle)) => text[from..]
                .find(needle.as_str())
                .map(|pos| (from + pos, from + pos + needle.len())),
            Some(MatchStrategy::Regex(regex)) => {
                regex.find_at(text, from).map(|m| (m.start(), m.end()))
            }
        }
    }
}

fn build_strategy(pattern: &str, case_sensitive: bool, use_regex: bool) -> EditResult<MatchStrategy> {
    if use_regex {
        let source = if case_sensitive {
            pattern.to_string()
        } else {
            format!("(?i){pattern}")
        };
        let regex = Regex::new(&source).map_err(|e| EditError::invalid_pattern(e.to_string()))?;
        Ok(MatchStrategy::Regex(Arc::new(regex)))
    } else if case_sensitive {
        Ok(MatchStrategy::Literal(pattern.to_string()))
    } else {
        let source = format!("(?i){}", regex::escape(pattern));
        let regex = Regex::new(&source).map_err(|e| EditError::invalid_pattern(e.to_string()))?;
        Ok(MatchStrategy::Regex(Arc::new(regex)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_regex_fails_at_construction() {
        let err = SearchQuery::new("(unclosed", true, true, Direction::Forward).unwrap_err();
        assert!(matches!(err, EditError::InvalidPattern(_)));
    }

    #[test]
    fn test_invalid_regex_text_is_fine_as_literal() {
        let query = SearchQuery::new("(unclosed", true, false, Direction::Forward).unwrap();
        assert!(query.is_match("an (unclosed paren"));
    }

    #[test]
    fn test_literal_matching() {
        let query = SearchQuery::literal("CALL");
        let text = "CALL FIRST; CALL SECOND;";
        let matches = query.find_in(text);
        assert_eq!(matches, vec![(0, 4), (12, 16)]);
        assert_eq!(&text[matches[0].0..matches[0].1], "CALL");
    }

    #[test]
    fn test_case_insensitive_literal() {
        let query = SearchQuery::new("call", false, false, Direction::Forward).unwrap();
        assert_eq!(query.find_in("CALL one, Call two").len(), 2);
        // The pattern text is escaped, not interpreted.
        let query = SearchQuery::new("a.b", false, false, Direction::Forward).unwrap();
        assert!(query.is_match("A.B"));
        assert!(!query.is_match("AxB"));
    }

    #[test]
    fn test_regex_matching() {
        let query = SearchQuery::new(r"\bDO\b", true, true, Direction::Forward).unwrap();
        assert!(query.is_match("DO I = 1 TO 10;"));
        assert!(!query.is_match("DOUBLE;"));
    }

    #[test]
    fn test_case_insensitive_regex() {
        let query = SearchQuery::new(r"end\s+\w+", false, true, Direction::Forward).unwrap();
        assert!(query.is_match("END MAIN;"));
    }

    #[test]
    fn test_empty_pattern_matches_nothing() {
        let query = SearchQuery::new("", true, false, Direction::Forward).unwrap();
        assert!(query.is_empty());
        assert!(query.find_in("anything").is_empty());
        assert!(!query.is_match("anything"));
        assert_eq!(query.first_match_at("anything", 0), None);
    }

    #[test]
    fn test_first_match_at() {
        let query = SearchQuery::literal("foo");
        let text = "foo bar foo";
        assert_eq!(query.first_match_at(text, 0), Some((0, 3)));
        assert_eq!(query.first_match_at(text, 1), Some((8, 11)));
        assert_eq!(query.first_match_at(text, 9), None);
        assert_eq!(query.first_match_at(text, text.len() + 1), None);
    }

    #[test]
    fn test_first_match_at_rounds_to_char_boundary() {
        let query = SearchQuery::literal("x");
        let text = "éx";
        // Offset 1 is inside the two-byte 'é'.
        assert_eq!(query.first_match_at(text, 1), Some((2, 3)));
    }

    #[test]
    fn test_matches_are_ordered_and_non_overlapping() {
        let query = SearchQuery::new("aa", true, false, Direction::Forward).unwrap();
        assert_eq!(query.find_in("aaaa"), vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn test_strategy_cache_reuse() {
        let a = SearchQuery::new("cached_pattern_xyz", true, false, Direction::Forward).unwrap();
        let b = SearchQuery::new("cached_pattern_xyz", true, false, Direction::Backward).unwrap();
        assert_eq!(a.find_in("cached_pattern_xyz"), b.find_in("cached_pattern_xyz"));
    }
}
