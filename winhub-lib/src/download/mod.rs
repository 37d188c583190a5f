//! Resumable downloads: per-URL tasks with pause/resume over HTTP range
//! requests, a registry that deduplicates them, and an aggregate
//! progress notifier.

mod manager;
mod notifier;
mod task;

pub use manager::DownloadManager;
pub use notifier::{AggregateSnapshot, DownloadNotifier};
pub use task::{DownloadStatus, DownloadTask};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::range_server::{RangeServer, ServerMode};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::watch;
    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;

    const WAIT: Duration = Duration::from_secs(10);

    async fn wait_for_status(
        rx: &mut watch::Receiver<DownloadStatus>,
        wanted: DownloadStatus,
    ) -> DownloadStatus {
        timeout(WAIT, async {
            loop {
                let status = *rx.borrow_and_update();
                if status == wanted || status.is_terminal() {
                    return status;
                }
                rx.changed().await.expect("status channel closed");
            }
        })
        .await
        .expect("timed out waiting for download status")
    }

    #[tokio::test]
    async fn test_fresh_download_completes_with_full_content() {
        let content: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        let server = RangeServer::spawn(content.clone(), ServerMode::Normal).await;
        let tmp_dir = TempDir::new().unwrap();
        let dest = tmp_dir.path().join("asset.bin");

        let manager = DownloadManager::new();
        let task = manager.add_task(&server.url, &dest, "asset.bin");
        let mut status_rx = task.status();
        task.start();

        let status = wait_for_status(&mut status_rx, DownloadStatus::Completed).await;
        assert_eq!(status, DownloadStatus::Completed);
        assert_eq!(task.current_progress(), 1.0);
        assert_eq!(std::fs::read(&dest).unwrap(), content);
        assert_eq!(server.range_offsets(), vec![0]);
    }

    #[tokio::test]
    async fn test_resume_requests_remaining_range() {
        let content: Vec<u8> = (0..40_000u32).map(|i| (i % 239) as u8).collect();
        let server = RangeServer::spawn(content.clone(), ServerMode::Normal).await;
        let tmp_dir = TempDir::new().unwrap();

        let manager = DownloadManager::new();
        let task = manager.add_task(&server.url, &tmp_dir.path().join("asset.bin"), "asset.bin");

        // A prior attempt left the first 10k bytes at the task's path.
        std::fs::write(task.path(), &content[..10_000]).unwrap();

        let mut status_rx = task.status();
        task.start();
        let status = wait_for_status(&mut status_rx, DownloadStatus::Completed).await;

        assert_eq!(status, DownloadStatus::Completed);
        assert_eq!(std::fs::read(task.path()).unwrap(), content);
        assert_eq!(server.range_offsets(), vec![10_000]);
    }

    #[tokio::test]
    async fn test_range_not_satisfiable_marks_completed_without_writes() {
        let content: Vec<u8> = vec![7u8; 4_096];
        let server = RangeServer::spawn(content.clone(), ServerMode::Normal).await;
        let tmp_dir = TempDir::new().unwrap();
        let dest = tmp_dir.path().join("done.bin");

        let manager = DownloadManager::new();
        let task = manager.add_task(&server.url, &dest, "done.bin");
        // Fully downloaded already.
        std::fs::write(task.path(), &content).unwrap();

        let mut status_rx = task.status();
        task.start();
        let status = wait_for_status(&mut status_rx, DownloadStatus::Completed).await;

        assert_eq!(status, DownloadStatus::Completed);
        assert_eq!(task.current_progress(), 1.0);
        assert_eq!(std::fs::read(task.path()).unwrap().len(), content.len());
        assert_eq!(server.range_offsets(), vec![content.len() as u64]);
    }

    #[tokio::test]
    async fn test_server_error_marks_failed() {
        let server = RangeServer::spawn(Vec::new(), ServerMode::Status(500)).await;
        let tmp_dir = TempDir::new().unwrap();

        let manager = DownloadManager::new();
        let task = manager.add_task(&server.url, &tmp_dir.path().join("x.bin"), "x.bin");
        let mut status_rx = task.status();
        task.start();

        let status = wait_for_status(&mut status_rx, DownloadStatus::Failed).await;
        assert_eq!(status, DownloadStatus::Failed);
    }

    #[tokio::test]
    async fn test_pause_halts_writes_and_resume_continues_from_offset() {
        let content: Vec<u8> = (0..120_000u32).map(|i| (i % 247) as u8).collect();
        let server =
            RangeServer::spawn(content.clone(), ServerMode::StallFirst { after: 16_384 }).await;
        let tmp_dir = TempDir::new().unwrap();

        let manager = DownloadManager::new();
        let task = manager.add_task(&server.url, &tmp_dir.path().join("big.bin"), "big.bin");

        let mut progress_rx = task.progress();
        task.start();

        // Wait until some bytes arrived.
        timeout(WAIT, async {
            loop {
                if *progress_rx.borrow_and_update() > 0.0 {
                    break;
                }
                progress_rx.changed().await.expect("progress channel closed");
            }
        })
        .await
        .expect("no progress before pause");

        task.pause();
        assert_eq!(task.current_status(), DownloadStatus::Paused);

        // Give the transfer loop a moment to observe the cancellation,
        // then the file size must be stable.
        tokio::time::sleep(Duration::from_millis(150)).await;
        let paused_len = std::fs::metadata(task.path()).unwrap().len();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(std::fs::metadata(task.path()).unwrap().len(), paused_len);
        assert!(paused_len > 0);
        assert!(paused_len < content.len() as u64);

        let mut status_rx = task.status();
        task.resume();
        let status = wait_for_status(&mut status_rx, DownloadStatus::Completed).await;

        assert_eq!(status, DownloadStatus::Completed);
        assert_eq!(std::fs::read(task.path()).unwrap(), content);
        // The second request picked up exactly where the flushed file ended.
        assert_eq!(server.range_offsets().last(), Some(&paused_len));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_within_an_attempt() {
        let content: Vec<u8> = (0..80_000u32).map(|i| (i % 211) as u8).collect();
        let server = RangeServer::spawn(content.clone(), ServerMode::Normal).await;
        let tmp_dir = TempDir::new().unwrap();

        let manager = DownloadManager::new();
        let task = manager.add_task(&server.url, &tmp_dir.path().join("m.bin"), "m.bin");

        let mut progress_rx = task.progress();
        let mut status_rx = task.status();
        task.start();

        let mut last = 0.0f64;
        timeout(WAIT, async {
            loop {
                let progress = *progress_rx.borrow_and_update();
                assert!((0.0..=1.0).contains(&progress));
                assert!(progress >= last, "progress went backwards: {last} -> {progress}");
                last = progress;
                if status_rx.borrow_and_update().is_terminal() {
                    break;
                }
                tokio::select! {
                    changed = progress_rx.changed() => changed.expect("progress channel closed"),
                    changed = status_rx.changed() => changed.expect("status channel closed"),
                }
            }
        })
        .await
        .expect("download did not finish");

        assert_eq!(task.current_status(), DownloadStatus::Completed);
        assert_eq!(task.current_progress(), 1.0);
    }

    #[tokio::test]
    async fn test_notifier_exits_foreground_once_tasks_settle() {
        let content: Vec<u8> = (0..30_000u32).map(|i| (i % 199) as u8).collect();
        let server = RangeServer::spawn(content.clone(), ServerMode::Normal).await;
        let tmp_dir = TempDir::new().unwrap();

        let manager = Arc::new(DownloadManager::new());
        let notifier = Arc::new(DownloadNotifier::new(Arc::clone(&manager)));
        let mut snapshot_rx = notifier.subscribe();

        let shutdown = CancellationToken::new();
        let runner = tokio::spawn({
            let notifier = Arc::clone(&notifier);
            let shutdown = shutdown.clone();
            async move { notifier.run(shutdown).await }
        });

        let task = manager.add_task(&server.url, &tmp_dir.path().join("n.bin"), "n.bin");
        let mut status_rx = task.status();
        task.start();

        let status = wait_for_status(&mut status_rx, DownloadStatus::Completed).await;
        assert_eq!(status, DownloadStatus::Completed);

        // The notifier must eventually publish a settled snapshot.
        timeout(WAIT, async {
            loop {
                let snapshot = snapshot_rx.borrow_and_update().clone();
                if !snapshot.foreground && snapshot.downloading == 0 && snapshot.total == 1 {
                    break;
                }
                snapshot_rx.changed().await.expect("snapshot channel closed");
            }
        })
        .await
        .expect("notifier never settled");

        shutdown.cancel();
        runner.await.unwrap();
    }
}
