//! Best-effort recursive directory sizing.
//!
//! The walk is depth-first over a live filesystem: an unreadable file is
//! skipped, an unlistable subtree is skipped, a missing root yields an empty
//! inventory. Nothing here returns an error to the caller.

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::events::{EventSink, MonitorEvent};
use crate::core::format::format_size;

/// One successfully stat'd regular file. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    /// Path relative to the scan root, `/`-separated on every platform.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Pre-formatted size for display.
    pub size_formatted: String,
}

impl FileRecord {
    fn new(name: String, size: u64) -> Self {
        Self {
            size_formatted: format_size(size),
            name,
            size,
        }
    }
}

/// The result of one scan. Built once per invocation, never mutated after.
#[derive(Debug, Clone, Serialize)]
pub struct Inventory {
    /// All files, sorted descending by size (stable sort).
    pub files: Vec<FileRecord>,
    /// Sum of all file sizes.
    pub total_size: u64,
    /// See [`Inventory::total_size`].
    pub total_size_formatted: String,
    /// Subsequence of `files` whose name ends with the recognized suffix.
    pub grouped_files: Vec<FileRecord>,
    /// Sum over `grouped_files`.
    pub grouped_total_size: u64,
    /// See [`Inventory::grouped_total_size`].
    pub grouped_total_size_formatted: String,
    /// The path that was scanned (or attempted).
    pub scan_path: String,
}

impl Inventory {
    /// Builds an inventory from raw records: stable descending size sort,
    /// grouped-subset derivation, and totals.
    #[must_use]
    pub fn build(scan_path: String, mut files: Vec<FileRecord>, grouped_suffix: &str) -> Self {
        files.sort_by(|a, b| b.size.cmp(&a.size));
        let grouped_files: Vec<FileRecord> = files
            .iter()
            .filter(|file| file.name.ends_with(grouped_suffix))
            .cloned()
            .collect();
        let total_size: u64 = files.iter().map(|file| file.size).sum();
        let grouped_total_size: u64 = grouped_files.iter().map(|file| file.size).sum();
        Self {
            total_size_formatted: format_size(total_size),
            grouped_total_size_formatted: format_size(grouped_total_size),
            files,
            total_size,
            grouped_files,
            grouped_total_size,
            scan_path,
        }
    }

    /// An inventory with nothing in it, for roots that cannot be scanned.
    #[must_use]
    pub fn empty(scan_path: String) -> Self {
        Self::build(scan_path, Vec::new(), "")
    }

    /// Whether the scan found any files at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Recursive workspace scanner. Holds only the recognized grouped suffix.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    grouped_suffix: String,
}

impl DirectoryScanner {
    /// Creates a scanner recognizing `grouped_suffix` (e.g. `".caido"`).
    pub fn new(grouped_suffix: impl Into<String>) -> Self {
        Self {
            grouped_suffix: grouped_suffix.into(),
        }
    }

    /// Walks `root` and builds an [`Inventory`]. Emits one `ScanComplete`
    /// event on the sink when done. A missing or unlistable root produces an
    /// empty inventory, not an error.
    pub fn scan(&self, root: &Path, sink: &dyn EventSink) -> Inventory {
        let scan_path = root.display().to_string();
        let mut files = Vec::new();
        if root.is_dir() {
            walk(root, "", &mut files);
        } else {
            info!(path = %scan_path, "scan root does not exist, reporting empty inventory");
        }
        let inventory = Inventory::build(scan_path, files, &self.grouped_suffix);
        info!(
            path = %inventory.scan_path,
            files = inventory.files.len(),
            total = %inventory.total_size_formatted,
            "scan complete"
        );
        sink.emit(MonitorEvent::ScanComplete {
            scan_path: inventory.scan_path.clone(),
            file_count: inventory.files.len(),
            grouped_file_count: inventory.grouped_files.len(),
            total_size_formatted: inventory.total_size_formatted.clone(),
            grouped_total_size_formatted: inventory.grouped_total_size_formatted.clone(),
            detected_at: Utc::now(),
        });
        inventory
    }
}

/// Depth-first walk. `prefix` accumulates the `/`-joined relative name.
/// Per-entry failures are absorbed here so one bad branch cannot blank out
/// the report.
fn walk(dir: &Path, prefix: &str, files: &mut Vec<FileRecord>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(path = %dir.display(), %err, "skipping unlistable directory");
            return;
        }
    };
    for entry in entries {
        let Ok(entry) = entry else { continue };
        let name = entry.file_name().to_string_lossy().into_owned();
        let display = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            walk(&entry.path(), &display, files);
        } else if file_type.is_file() {
            match entry.metadata() {
                Ok(meta) => files.push(FileRecord::new(display, meta.len())),
                Err(err) => {
                    debug!(path = %entry.path().display(), %err, "skipping unreadable file");
                }
            }
        }
        // Symlinks and special files are not sized.
    }
}
