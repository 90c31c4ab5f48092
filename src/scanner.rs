use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Which Go files a scan should collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFilter {
    /// Every `.go` file except `_test.go` files.
    Sources,
    /// Non-test files whose name mentions `controller`, `http` or `setup`.
    Controllers,
}

impl ScanFilter {
    fn accepts(&self, file_name: &str) -> bool {
        if !file_name.ends_with(".go") || file_name.ends_with("_test.go") {
            return false;
        }
        match self {
            ScanFilter::Sources => true,
            ScanFilter::Controllers => {
                let lower = file_name.to_lowercase();
                ["controller", "http", "setup"]
                    .iter()
                    .any(|keyword| lower.contains(keyword))
            }
        }
    }
}

/// File scanner for traversing Go project directories.
///
/// The `FileScanner` recursively walks a directory and collects Go source files matching a
/// [`ScanFilter`]. Hidden directories, `vendor` and `testdata` are skipped.
///
/// # Example
///
/// ```no_run
/// use openapi_from_go::scanner::{FileScanner, ScanFilter};
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./internal/ms/ms_orders"));
/// let result = scanner.scan(ScanFilter::Controllers);
/// println!("Found {} controller files", result.go_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of a directory scan.
pub struct ScanResult {
    /// Matching `.go` files in sorted order
    pub go_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

/// A service directory selected for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Microservice {
    pub name: String,
    pub path: PathBuf,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Recursively collects Go files accepted by `filter`.
    ///
    /// Inaccessible entries are logged and recorded as warnings; scanning continues.
    pub fn scan(&self, filter: ScanFilter) -> ScanResult {
        let mut go_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.path() == self.root_path || !is_skipped_dir(e.path()))
        {
            match entry {
                Ok(entry) => {
                    let name = entry.file_name().to_string_lossy();
                    if entry.file_type().is_file() && filter.accepts(&name) {
                        go_files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        debug!(
            "Scanned {}: {} files matched {:?}",
            self.root_path.display(),
            go_files.len(),
            filter
        );
        ScanResult { go_files, warnings }
    }

    /// Lists the `.go` files directly inside `dir`, excluding tests.
    pub fn files_in_dir(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.is_file()
                        && path
                            .file_name()
                            .map(|name| ScanFilter::Sources.accepts(&name.to_string_lossy()))
                            .unwrap_or(false)
                })
                .collect(),
            Err(e) => {
                warn!("Cannot read directory {}: {}", dir.display(), e);
                Vec::new()
            }
        };
        files.sort();
        files
    }

    /// Service directories directly under the root whose name starts with `prefix`.
    ///
    /// A non-empty `filters` list keeps only services whose name contains one of its entries.
    pub fn find_microservices(&self, prefix: &str, filters: &[String]) -> Vec<Microservice> {
        let entries = match fs::read_dir(&self.root_path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Cannot read microservice directory {}: {}",
                    self.root_path.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut services: Vec<Microservice> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .map(|entry| Microservice {
                name: entry.file_name().to_string_lossy().to_string(),
                path: entry.path(),
            })
            .filter(|ms| ms.name.starts_with(prefix))
            .filter(|ms| filters.is_empty() || filters.iter().any(|f| ms.name.contains(f.as_str())))
            .collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        services
    }

    /// Directories anywhere under the root whose name ends with `suffix`.
    pub fn find_dirs_with_suffix(&self, suffix: &str) -> Vec<PathBuf> {
        WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.path() == self.root_path || !is_skipped_dir(e.path()))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Failed to access path: {}", e);
                    None
                }
            })
            .filter(|entry| {
                entry.file_type().is_dir() && entry.file_name().to_string_lossy().ends_with(suffix)
            })
            .map(|entry| entry.path().to_path_buf())
            .collect()
    }
}

fn is_skipped_dir(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    name.starts_with('.') || name == "vendor" || name == "testdata"
}
