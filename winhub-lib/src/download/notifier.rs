use futures_util::future::{BoxFuture, select_all};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::manager::DownloadManager;
use super::task::DownloadStatus;

/// What a progress renderer needs to draw the single aggregate
/// "ongoing downloads" notification.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSnapshot {
    /// Tasks currently transferring bytes.
    pub downloading: usize,
    /// All registered tasks.
    pub total: usize,
    /// Mean progress across downloading tasks, in `[0, 1]`.
    pub progress: f64,
    /// Notification headline, e.g. `Downloading Box64` or
    /// `Downloading 3 files`.
    pub label: String,
    /// Whether an ongoing-download notification should be showing.
    pub foreground: bool,
}

impl Default for AggregateSnapshot {
    fn default() -> Self {
        Self {
            downloading: 0,
            total: 0,
            progress: 0.0,
            label: String::new(),
            foreground: false,
        }
    }
}

struct Observation {
    title: String,
    status: DownloadStatus,
    progress: f64,
}

struct Summary {
    downloading: usize,
    progress: f64,
    label: String,
    all_settled: bool,
}

fn summarize(observed: &[Observation]) -> Summary {
    let active: Vec<&Observation> = observed
        .iter()
        .filter(|o| o.status == DownloadStatus::Downloading)
        .collect();

    let progress = if active.is_empty() {
        0.0
    } else {
        active.iter().map(|o| o.progress).sum::<f64>() / active.len() as f64
    };

    let label = match active.as_slice() {
        [] => String::new(),
        [only] => format!("Downloading {}", only.title),
        many => format!("Downloading {} files", many.len()),
    };

    Summary {
        downloading: active.len(),
        progress,
        label,
        all_settled: observed.iter().all(|o| o.status.is_settled()),
    }
}

/// Watches every registered task and republishes one aggregate snapshot
/// whenever any task's progress or status changes, or when tasks are
/// added or removed.
///
/// The foreground flag latches on as soon as one task is downloading
/// and drops only once every task has settled, mirroring how an
/// ongoing-transfer notification should behave.
pub struct DownloadNotifier {
    manager: Arc<DownloadManager>,
    snapshot_tx: watch::Sender<AggregateSnapshot>,
}

impl DownloadNotifier {
    pub fn new(manager: Arc<DownloadManager>) -> Self {
        let (snapshot_tx, _) = watch::channel(AggregateSnapshot::default());
        Self {
            manager,
            snapshot_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AggregateSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub async fn run(&self, shutdown: CancellationToken) {
        let mut registry_rx = self.manager.registry_changes();
        let mut foreground = false;

        loop {
            let tasks = self.manager.tasks();

            // Subscribe before reading so nothing slips between the
            // snapshot and the wait below.
            let mut status_rxs: Vec<_> = tasks.iter().map(|t| t.status()).collect();
            let mut progress_rxs: Vec<_> = tasks.iter().map(|t| t.progress()).collect();

            let observed: Vec<Observation> = tasks
                .iter()
                .map(|t| Observation {
                    title: t.title().to_string(),
                    status: t.current_status(),
                    progress: t.current_progress(),
                })
                .collect();

            let summary = summarize(&observed);
            if summary.downloading > 0 {
                foreground = true;
            } else if summary.all_settled {
                foreground = false;
            }

            self.snapshot_tx.send_replace(AggregateSnapshot {
                downloading: summary.downloading,
                total: observed.len(),
                progress: summary.progress,
                label: summary.label,
                foreground,
            });

            let mut waiters: Vec<BoxFuture<'_, ()>> = Vec::new();
            for rx in status_rxs.iter_mut() {
                waiters.push(Box::pin(async move {
                    let _ = rx.changed().await;
                }));
            }
            for rx in progress_rxs.iter_mut() {
                waiters.push(Box::pin(async move {
                    let _ = rx.changed().await;
                }));
            }
            let registry = &mut registry_rx;
            waiters.push(Box::pin(async move {
                let _ = registry.changed().await;
            }));

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = select_all(waiters) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(status: DownloadStatus, progress: f64) -> Observation {
        Observation {
            title: "asset.zip".to_string(),
            status,
            progress,
        }
    }

    #[test]
    fn test_mean_progress_across_downloading_tasks() {
        let observed = vec![
            observation(DownloadStatus::Downloading, 0.4),
            observation(DownloadStatus::Downloading, 0.6),
        ];
        let summary = summarize(&observed);
        assert_eq!(summary.downloading, 2);
        assert!((summary.progress - 0.5).abs() < f64::EPSILON);
        assert_eq!(summary.label, "Downloading 2 files");
        assert!(!summary.all_settled);
    }

    #[test]
    fn test_settled_tasks_are_excluded_from_progress() {
        let observed = vec![
            observation(DownloadStatus::Completed, 1.0),
            observation(DownloadStatus::Downloading, 0.2),
        ];
        let summary = summarize(&observed);
        assert_eq!(summary.downloading, 1);
        assert!((summary.progress - 0.2).abs() < f64::EPSILON);
        assert_eq!(summary.label, "Downloading asset.zip");
        assert!(!summary.all_settled);
    }

    #[test]
    fn test_all_terminal_statuses_settle() {
        let observed = vec![
            observation(DownloadStatus::Completed, 1.0),
            observation(DownloadStatus::Paused, 0.3),
            observation(DownloadStatus::Failed, 0.1),
            observation(DownloadStatus::Idle, 0.0),
        ];
        let summary = summarize(&observed);
        assert_eq!(summary.downloading, 0);
        assert_eq!(summary.progress, 0.0);
        assert!(summary.all_settled);
    }

    #[test]
    fn test_empty_registry_is_settled() {
        let summary = summarize(&[]);
        assert!(summary.all_settled);
        assert_eq!(summary.downloading, 0);
    }
}
