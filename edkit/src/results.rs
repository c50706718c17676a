use std::fmt;
use std::path::PathBuf;

/// One line-level hit from a multi-file search: enough to list it and to
/// navigate to it. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    /// The file the match was found in
    pub path: PathBuf,
    /// 1-based line number
    pub line_number: usize,
    /// The full text of the matching line
    pub line_text: String,
}

impl fmt::Display for SearchMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} - {}",
            self.path.display(),
            self.line_number,
            self.line_text
        )
    }
}

/// Aggregate result of an eager multi-file search.
#[derive(Debug, Clone, Default)]
pub struct FileSearchOutput {
    /// Every match, in traversal order
    pub matches: Vec<SearchMatch>,
    /// Files that were actually read
    pub files_searched: usize,
    /// Files that produced at least one match
    pub files_with_matches: usize,
}

impl FileSearchOutput {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn total_matches(&self) -> usize {
        self.matches.len()
    }

    /// Records one scanned file's matches (possibly none).
    pub fn add_file(&mut self, matches: Vec<SearchMatch>) {
        self.files_searched += 1;
        if !matches.is_empty() {
            self.files_with_matches += 1;
            self.matches.extend(matches);
        }
    }

    /// Merges another output into this one; used when disjoint subtree scans
    /// run independently.
    pub fn merge(&mut self, other: FileSearchOutput) {
        self.files_searched += other.files_searched;
        self.files_with_matches += other.files_with_matches;
        self.matches.extend(other.matches);
    }
}
