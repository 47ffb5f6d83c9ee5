//! Scope guard that removes chart files when a run ends.

use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Deletes the listed files on drop, whether the run succeeded, failed or
/// panicked. `keep` turns it into a no-op.
///
/// Files can be registered from several render workers while the guard is
/// alive.
#[derive(Debug)]
pub struct ChartCleanup {
    paths: Mutex<Vec<PathBuf>>,
    keep: bool,
}

impl ChartCleanup {
    pub fn new(paths: Vec<PathBuf>, keep: bool) -> Self {
        Self {
            paths: Mutex::new(paths),
            keep,
        }
    }

    pub fn register(&self, path: PathBuf) {
        self.paths
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path);
    }

    pub fn keep(&mut self) {
        self.keep = true;
    }

    pub fn is_kept(&self) -> bool {
        self.keep
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Drop for ChartCleanup {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        let paths = self
            .paths
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for path in paths.iter() {
            match std::fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "chart removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "could not remove chart"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &std::path::Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"png").unwrap();
        path
    }

    #[test]
    fn removes_files_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "A_30_day_chart.png");
        let b = touch(dir.path(), "B_30_day_chart.png");
        {
            let _guard = ChartCleanup::new(vec![a.clone(), b.clone()], false);
        }
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn keep_leaves_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "A_30_day_chart.png");
        {
            let mut guard = ChartCleanup::new(vec![a.clone()], false);
            guard.keep();
            assert!(guard.is_kept());
        }
        assert!(a.exists());
    }

    #[test]
    fn registered_files_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "A_30_day_chart.png");
        let b = touch(dir.path(), "B_30_day_chart.png");
        {
            let guard = ChartCleanup::new(Vec::new(), false);
            std::thread::scope(|s| {
                s.spawn(|| guard.register(a.clone()));
                s.spawn(|| guard.register(b.clone()));
            });
            assert_eq!(guard.paths().len(), 2);
        }
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[test]
    fn already_missing_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let ghost = dir.path().join("ghost.png");
        drop(ChartCleanup::new(vec![ghost], false));
    }

    #[test]
    fn cleans_up_during_unwind() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "A_30_day_chart.png");
        let path = a.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = ChartCleanup::new(vec![path], false);
            panic!("video stage blew up");
        });
        assert!(result.is_err());
        assert!(!a.exists());
    }
}
