//! Multi-file search and replace.
//!
//! File enumeration is recursive under a root folder, restricted by a
//! space-separated glob filter list ("*.pli *.inc"), and sorted by file name
//! so a given filesystem snapshot always scans in the same order. Per-file
//! read/write failures are skipped with a warning and the batch continues;
//! only input validation aborts an operation up front.

use ignore::WalkBuilder;
use rayon::prelude::*;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::errors::{EditError, EditResult};
use crate::query::SearchQuery;
use crate::results::{FileSearchOutput, SearchMatch};

mod worker;
pub use worker::{spawn_scan, ScanHandle};

/// Compiled "*.pli *.inc" style filter list, matched against file names.
#[derive(Debug, Clone)]
pub struct FileFilters {
    patterns: Vec<glob::Pattern>,
}

impl FileFilters {
    /// Parses a space-separated glob list. Blank input is a usage error,
    /// rejected before any I/O happens.
    pub fn parse(filters: &str) -> EditResult<Self> {
        let globs: Vec<&str> = filters.split_whitespace().collect();
        if globs.is_empty() {
            return Err(EditError::empty_input("file type filters"));
        }
        let mut patterns = Vec::with_capacity(globs.len());
        for source in globs {
            let pattern = glob::Pattern::new(source)
                .map_err(|e| EditError::invalid_pattern(format!("filter `{source}`: {e}")))?;
            patterns.push(pattern);
        }
        Ok(Self { patterns })
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.patterns.iter().any(|p| p.matches(name)))
    }
}

/// Recursively enumerates matching files under `root`, sorted by file name at
/// every directory level. Traversal order is not part of the contract, but it
/// is deterministic for a given snapshot and results are presented in this
/// order.
fn collect_files(root: &Path, filters: &FileFilters) -> Vec<PathBuf> {
    let mut walker = WalkBuilder::new(root);
    walker
        .hidden(true)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    let files: Vec<PathBuf> = walker
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| filters.matches(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    debug!("found {} files to scan under {}", files.len(), root.display());
    files
}

fn validate_inputs(query: &SearchQuery, root: &Path) -> EditResult<()> {
    if query.is_empty() {
        return Err(EditError::empty_input("search pattern"));
    }
    if root.as_os_str().is_empty() {
        return Err(EditError::empty_input("folder"));
    }
    Ok(())
}

/// Scans one file line by line, yielding a match per matching line.
/// `None` means the file could not be read and was skipped.
fn scan_file(query: &SearchQuery, path: &Path) -> Option<Vec<SearchMatch>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("skipping {}: {}", path.display(), e);
            return None;
        }
    };
    Some(
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| query.is_match(line))
            .map(|(index, line)| SearchMatch {
                path: path.to_path_buf(),
                line_number: index + 1,
                line_text: line.to_string(),
            })
            .collect(),
    )
}

/// Lazy multi-file scan: yields matches file by file, line by line, in
/// traversal order. Checks its cancellation flag between files and stops
/// promptly once it is set.
#[derive(Debug)]
pub struct Scan {
    query: SearchQuery,
    files: std::vec::IntoIter<PathBuf>,
    pending: std::vec::IntoIter<SearchMatch>,
    cancel: Arc<AtomicBool>,
}

impl Scan {
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }
}

impl Iterator for Scan {
    type Item = SearchMatch;

    fn next(&mut self) -> Option<SearchMatch> {
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                return None;
            }
            if let Some(m) = self.pending.next() {
                return Some(m);
            }
            let path = self.files.next()?;
            if let Some(matches) = scan_file(&self.query, &path) {
                self.pending = matches.into_iter();
            }
        }
    }
}

/// Starts a lazy scan under `root`. Validation errors (empty pattern, empty
/// folder, bad filter) surface here, before any file is touched; an invalid
/// regex can never reach this point because [`SearchQuery`] construction
/// rejects it.
pub fn scan(query: &SearchQuery, root: &Path, filters: &FileFilters) -> EditResult<Scan> {
    scan_with_cancel(query, root, filters, Arc::new(AtomicBool::new(false)))
}

/// Same as [`scan`], sharing an externally owned cancellation flag.
pub fn scan_with_cancel(
    query: &SearchQuery,
    root: &Path,
    filters: &FileFilters,
    cancel: Arc<AtomicBool>,
) -> EditResult<Scan> {
    validate_inputs(query, root)?;
    let files = collect_files(root, filters);
    Ok(Scan {
        query: query.clone(),
        files: files.into_iter(),
        pending: Vec::new().into_iter(),
        cancel,
    })
}

/// Eager multi-file search: processes files in parallel chunks and returns
/// the aggregated output, with matches in traversal order.
pub fn search(
    query: &SearchQuery,
    root: &Path,
    filters: &FileFilters,
    thread_count: NonZeroUsize,
) -> EditResult<FileSearchOutput> {
    validate_inputs(query, root)?;
    info!("searching for `{}` under {}", query.pattern(), root.display());

    let files = collect_files(root, filters);
    let chunk_size = (files.len() / thread_count.get()).clamp(1, 256);

    let per_file: Vec<Option<Vec<SearchMatch>>> = files
        .par_chunks(chunk_size)
        .flat_map(|chunk| {
            chunk
                .iter()
                .map(|path| scan_file(query, path))
                .collect::<Vec<_>>()
        })
        .collect();

    let mut output = FileSearchOutput::new();
    for matches in per_file.into_iter().flatten() {
        output.add_file(matches);
    }

    info!(
        "search complete: {} matches in {} files",
        output.total_matches(),
        output.files_with_matches
    );
    Ok(output)
}

/// Replaces every occurrence of `search_text` (plain, case-sensitive
/// substring) across matching files, rewriting each changed file in place.
///
/// Returns the number of files modified — a file counts once no matter how
/// many occurrences it contained. A file that cannot be read, or that cannot
/// be rewritten after a successful read, is skipped; earlier rewrites stand.
pub fn replace_all(
    search_text: &str,
    replacement: &str,
    root: &Path,
    filters: &FileFilters,
) -> EditResult<usize> {
    if search_text.is_empty() {
        return Err(EditError::empty_input("search text"));
    }
    if root.as_os_str().is_empty() {
        return Err(EditError::empty_input("folder"));
    }

    let mut replaced_files = 0;
    for path in collect_files(root, filters) {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                continue;
            }
        };
        if !content.contains(search_text) {
            continue;
        }
        let updated = content.replace(search_text, replacement);
        match std::fs::write(&path, updated) {
            Ok(()) => {
                debug!("rewrote {}", path.display());
                replaced_files += 1;
            }
            Err(e) => {
                warn!("cannot rewrite {}: {}", path.display(), e);
            }
        }
    }

    info!("replaced in {replaced_files} file(s)");
    Ok(replaced_files)
}
