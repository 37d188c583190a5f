use reqwest::{Client, redirect};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use super::task::DownloadTask;

/// Registry of download tasks, at most one per URL.
///
/// Owns the long-lived redirect-following HTTP client every transfer
/// shares. An instance is passed explicitly to whatever needs it; there
/// is no process-wide singleton.
pub struct DownloadManager {
    client: Client,
    tasks: Mutex<Vec<Arc<DownloadTask>>>,
    // Bumped on every add/remove so observers can re-subscribe.
    epoch_tx: watch::Sender<u64>,
}

impl Default for DownloadManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadManager {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(concat!("winhub/", env!("CARGO_PKG_VERSION")))
            .redirect(redirect::Policy::limited(10))
            .build()
            .expect("Failed to create HTTP client");
        let (epoch_tx, _) = watch::channel(0);
        Self {
            client,
            tasks: Mutex::new(Vec::new()),
            epoch_tx,
        }
    }

    /// Register a download, or return the task already registered for
    /// this URL. When the destination path is already occupied on disk,
    /// a ` (n)` suffix is appended to the filename until it is free.
    pub fn add_task(&self, url: &str, path: &Path, title: &str) -> Arc<DownloadTask> {
        let mut tasks = self.tasks.lock().expect("task registry lock poisoned");
        if let Some(existing) = tasks.iter().find(|t| t.url() == url) {
            return Arc::clone(existing);
        }

        let path = unique_destination(path);
        let task = DownloadTask::new(url, &path, title, self.client.clone());
        tasks.push(Arc::clone(&task));
        drop(tasks);

        self.epoch_tx.send_modify(|epoch| *epoch += 1);
        task
    }

    /// Cancel a task and drop it from the registry.
    pub fn remove_task(&self, task: &Arc<DownloadTask>) {
        task.pause();
        self.tasks
            .lock()
            .expect("task registry lock poisoned")
            .retain(|t| !Arc::ptr_eq(t, task));
        self.epoch_tx.send_modify(|epoch| *epoch += 1);
    }

    /// Snapshot of all registered tasks, in registration order.
    pub fn tasks(&self) -> Vec<Arc<DownloadTask>> {
        self.tasks
            .lock()
            .expect("task registry lock poisoned")
            .clone()
    }

    /// Notified whenever the set of registered tasks changes.
    pub fn registry_changes(&self) -> watch::Receiver<u64> {
        self.epoch_tx.subscribe()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// First free variant of `path`: `foo.apk`, `foo (1).apk`, `foo (2).apk`, ...
fn unique_destination(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("download");
    let extension = path.extension().and_then(|s| s.to_str());
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut counter = 1;
    loop {
        let name = match extension {
            Some(ext) => format!("{stem} ({counter}).{ext}"),
            None => format!("{stem} ({counter})"),
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DownloadStatus;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_add_task_is_idempotent_per_url() {
        let tmp_dir = TempDir::new().unwrap();
        let manager = DownloadManager::new();

        let a = manager.add_task(
            "https://example.com/wine.tzst",
            &tmp_dir.path().join("wine.tzst"),
            "Wine",
        );
        let b = manager.add_task(
            "https://example.com/wine.tzst",
            &tmp_dir.path().join("elsewhere.tzst"),
            "Wine again",
        );

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(manager.tasks().len(), 1);
        assert_eq!(b.title(), "Wine");
    }

    #[test]
    fn test_collision_appends_numeric_suffix() {
        let tmp_dir = TempDir::new().unwrap();
        File::create(tmp_dir.path().join("foo.apk")).unwrap();
        File::create(tmp_dir.path().join("foo (1).apk")).unwrap();

        let manager = DownloadManager::new();
        let task = manager.add_task(
            "https://example.com/foo.apk",
            &tmp_dir.path().join("foo.apk"),
            "foo.apk",
        );

        assert_eq!(task.path(), tmp_dir.path().join("foo (2).apk"));
    }

    #[test]
    fn test_collision_without_extension() {
        let tmp_dir = TempDir::new().unwrap();
        File::create(tmp_dir.path().join("driver")).unwrap();

        let manager = DownloadManager::new();
        let task = manager.add_task(
            "https://example.com/driver",
            &tmp_dir.path().join("driver"),
            "driver",
        );

        assert_eq!(task.path(), tmp_dir.path().join("driver (1)"));
    }

    #[test]
    fn test_remove_task_pauses_and_unregisters() {
        let tmp_dir = TempDir::new().unwrap();
        let manager = DownloadManager::new();

        let task = manager.add_task(
            "https://example.com/box64.zip",
            &tmp_dir.path().join("box64.zip"),
            "Box64",
        );
        assert_eq!(manager.tasks().len(), 1);

        manager.remove_task(&task);
        assert!(manager.tasks().is_empty());
        // Idle tasks have nothing to cancel; status is untouched.
        assert_eq!(task.current_status(), DownloadStatus::Idle);
    }

    #[test]
    fn test_registry_changes_epoch() {
        let tmp_dir = TempDir::new().unwrap();
        let manager = DownloadManager::new();
        let rx = manager.registry_changes();
        assert_eq!(*rx.borrow(), 0);

        let task = manager.add_task(
            "https://example.com/a.zip",
            &tmp_dir.path().join("a.zip"),
            "a",
        );
        assert_eq!(*rx.borrow(), 1);

        manager.remove_task(&task);
        assert_eq!(*rx.borrow(), 2);
    }
}
