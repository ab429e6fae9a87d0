//! Pattern file watcher for hot reload.
//!
//! Rebuilds the table whenever the pattern file changes and publishes it
//! through a [`SharedTable`]. A rebuild that fails leaves the previous table
//! in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use urltable::SharedTable;

use crate::patterns::{build_table, LoadError};

/// Reloads a pattern file into a shared table.
#[derive(Debug, Clone)]
pub struct PatternWatcher {
    path: PathBuf,
    table: Arc<SharedTable>,
}

impl PatternWatcher {
    pub fn new(path: &Path, table: Arc<SharedTable>) -> Self {
        Self {
            path: path.to_path_buf(),
            table,
        }
    }

    /// Rebuild the table from disk and swap it in. Returns the new size.
    pub fn reload(&self) -> Result<usize, LoadError> {
        let table = match build_table(&self.path) {
            Ok(table) => table,
            Err(e) => {
                urltable_telemetry::log_reload_failed!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to rebuild pattern table, keeping the current one"
                );
                return Err(e);
            }
        };

        let size = table.size();
        self.table.store(table);

        urltable_telemetry::log_patterns_reloaded!(
            path = %self.path.display(),
            size,
            "pattern table reloaded"
        );

        Ok(size)
    }

    /// Start watching the file in a background thread.
    ///
    /// The parent directory is watched so that editors that replace the file
    /// by rename are still picked up. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file = std::fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        let dir = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let target = file.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = (event.kind.is_modify() || event.kind.is_create())
                        && event.paths.iter().any(|p| p == &target);
                    if relevant {
                        tracing::info!("pattern file change detected, reloading");
                        match self.reload() {
                            Ok(size) => tracing::debug!(size, "watcher published new table"),
                            // Already logged as reload_failed; the old table stays.
                            Err(_) => tracing::debug!("watcher kept the current table"),
                        }
                    }
                }
                Err(e) => tracing::error!(error = %e, "pattern file watch error"),
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %file.display(), "pattern watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use urltable::Table;

    fn shared(patterns: &[&str]) -> Arc<SharedTable> {
        Arc::new(SharedTable::from(Table::from_patterns(patterns).unwrap()))
    }

    #[test]
    fn reload_swaps_in_the_new_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.yaml");
        std::fs::write(&path, "patterns:\n  - GET/old\n").unwrap();

        let table = shared(&["GET/old"]);
        let watcher = PatternWatcher::new(&path, Arc::clone(&table));

        std::fs::write(&path, "patterns:\n  - GET/new\n  - GET/api/**\n").unwrap();
        assert_eq!(watcher.reload().unwrap(), 2);

        assert_eq!(table.mapping("GET/old").unwrap(), None);
        assert_eq!(table.mapping("GET/api/x/y").unwrap().as_deref(), Some("GET/api/**"));
    }

    #[test]
    fn failed_reload_keeps_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.yaml");
        std::fs::write(&path, "patterns:\n  - GET/api/*/info\n  - GET/api/**\n").unwrap();

        let table = shared(&["GET/api/v1/user"]);
        let watcher = PatternWatcher::new(&path, Arc::clone(&table));

        let err = watcher.reload().unwrap_err();
        assert!(matches!(err, LoadError::Pattern { index: 1, .. }), "got {:?}", err);
        assert_eq!(
            table.mapping("GET/api/v1/user").unwrap().as_deref(),
            Some("GET/api/v1/user")
        );
    }

    /// Replace the file by rename so the watcher never reads a half-written file.
    fn replace(path: &Path, contents: &str) {
        let staged = path.with_extension("staged");
        std::fs::write(&staged, contents).unwrap();
        std::fs::rename(&staged, path).unwrap();
    }

    /// Poll until `request` resolves to `expected`, giving up after five seconds.
    fn wait_for(table: &SharedTable, request: &str, expected: Option<&str>) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if table.mapping(request).unwrap().as_deref() == expected {
                return true;
            }
            std::thread::sleep(Duration::from_millis(25));
        }
        false
    }

    #[test]
    fn file_change_is_picked_up_by_running_watcher() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.yaml");
        std::fs::write(&path, "patterns:\n  - GET/old\n").unwrap();

        let table = shared(&["GET/old"]);
        let _watcher = PatternWatcher::new(&path, Arc::clone(&table)).run().unwrap();

        replace(&path, "patterns:\n  - GET/new\n");

        assert!(wait_for(&table, "GET/new", Some("GET/new")));
        assert_eq!(table.mapping("GET/old").unwrap(), None);
    }

    #[test]
    fn conflicting_change_keeps_serving_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.yaml");
        std::fs::write(&path, "patterns:\n  - GET/old\n").unwrap();

        let table = shared(&["GET/old"]);
        let _watcher = PatternWatcher::new(&path, Arc::clone(&table)).run().unwrap();

        replace(&path, "patterns:\n  - GET/api/*/info\n  - GET/api/**\n");
        std::thread::sleep(Duration::from_millis(500));
        assert_eq!(table.mapping("GET/old").unwrap().as_deref(), Some("GET/old"));
        assert_eq!(table.mapping("GET/api/v1/info").unwrap(), None);

        // The watcher is still alive after a failed reload.
        replace(&path, "patterns:\n  - GET/fixed\n");
        assert!(wait_for(&table, "GET/fixed", Some("GET/fixed")));
        assert_eq!(table.mapping("GET/old").unwrap(), None);
    }

    #[test]
    fn other_files_in_the_directory_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.yaml");
        std::fs::write(&path, "patterns:\n  - GET/old\n").unwrap();

        let table = shared(&["GET/sentinel"]);
        let _watcher = PatternWatcher::new(&path, Arc::clone(&table)).run().unwrap();

        std::fs::write(dir.path().join("unrelated.yaml"), "patterns:\n  - GET/x\n").unwrap();
        std::thread::sleep(Duration::from_millis(500));
        assert_eq!(
            table.mapping("GET/sentinel").unwrap().as_deref(),
            Some("GET/sentinel")
        );
    }

    #[test]
    fn run_starts_on_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.yaml");
        std::fs::write(&path, "patterns: []\n").unwrap();

        let watcher = PatternWatcher::new(&path, Arc::new(SharedTable::default()));
        assert!(watcher.run().is_ok());
    }
}
