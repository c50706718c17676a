//! Background hosting for multi-file scans.
//!
//! The lazy [`Scan`](super::Scan) runs synchronously on whatever thread calls
//! it. `spawn_scan` moves it onto a worker thread and streams matches back
//! over a channel, so a UI thread can keep pumping events while a large tree
//! is scanned and can cancel the scan mid-flight.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::debug;

use super::{scan_with_cancel, FileFilters};
use crate::errors::EditResult;
use crate::query::SearchQuery;
use crate::results::SearchMatch;

/// Handle to a scan running on a worker thread.
///
/// Iterating the handle receives matches in traversal order. `cancel` stops
/// further file and line scanning promptly; matches already in the channel
/// are simply dropped with the handle.
pub struct ScanHandle {
    receiver: mpsc::Receiver<SearchMatch>,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ScanHandle {
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Blocks until the scan finishes and returns everything it produced.
    pub fn wait(mut self) -> Vec<SearchMatch> {
        let matches: Vec<SearchMatch> = self.receiver.iter().collect();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        matches
    }
}

impl Iterator for ScanHandle {
    type Item = SearchMatch;

    fn next(&mut self) -> Option<SearchMatch> {
        self.receiver.recv().ok()
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        // A dropped handle means nobody wants further results.
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Validates inputs, then runs the scan on a named worker thread.
///
/// Validation failures surface here, on the calling thread, before the worker
/// exists — the worker itself can no longer fail, only finish or be
/// cancelled.
pub fn spawn_scan(
    query: SearchQuery,
    root: PathBuf,
    filters: FileFilters,
) -> EditResult<ScanHandle> {
    // Probe validation eagerly so the caller gets the error synchronously.
    super::validate_inputs(&query, &root)?;

    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);
    let (sender, receiver) = mpsc::channel();

    let worker = std::thread::Builder::new()
        .name("edkit-file-scan".to_string())
        .spawn(move || {
            let Ok(scan) = scan_with_cancel(&query, &root, &filters, worker_cancel) else {
                return;
            };
            for m in scan {
                if sender.send(m).is_err() {
                    debug!("scan receiver dropped, stopping");
                    break;
                }
            }
        })?;

    Ok(ScanHandle {
        receiver,
        cancel,
        worker: Some(worker),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_spawn_scan_streams_matches() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.pli"), "needle\nhay\nneedle\n").unwrap();
        fs::write(dir.path().join("b.pli"), "needle\n").unwrap();

        let handle = spawn_scan(
            SearchQuery::literal("needle"),
            dir.path().to_path_buf(),
            FileFilters::parse("*.pli").unwrap(),
        )
        .unwrap();

        let matches = handle.wait();
        assert_eq!(matches.len(), 3);
        // Traversal order is preserved across the channel.
        assert_eq!(matches[0].path, dir.path().join("a.pli"));
        assert_eq!(matches[0].line_number, 1);
        assert_eq!(matches[1].line_number, 3);
        assert_eq!(matches[2].path, dir.path().join("b.pli"));
    }

    #[test]
    fn test_spawn_scan_validates_before_spawning() {
        let dir = tempdir().unwrap();
        let result = spawn_scan(
            SearchQuery::literal(""),
            dir.path().to_path_buf(),
            FileFilters::parse("*.pli").unwrap(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_cancel_stops_worker() {
        let dir = tempdir().unwrap();
        for i in 0..50 {
            fs::write(dir.path().join(format!("f{i:02}.pli")), "needle\n").unwrap();
        }
        let handle = spawn_scan(
            SearchQuery::literal("needle"),
            dir.path().to_path_buf(),
            FileFilters::parse("*.pli").unwrap(),
        )
        .unwrap();

        handle.cancel();
        assert!(handle.is_cancelled());
        // The worker observes the flag and finishes well short of the full
        // tree; dropping the handle joins it either way.
        let matches = handle.wait();
        assert!(matches.len() <= 50);
    }
}
