use reqwest::{Client, StatusCode, header};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Lifecycle of a single URL-to-file transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Idle,
    Queued,
    Downloading,
    Paused,
    Completed,
    Failed,
}

impl DownloadStatus {
    /// States with no transfer in flight. The notifier leaves the
    /// foreground state once every task is settled.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            DownloadStatus::Idle
                | DownloadStatus::Paused
                | DownloadStatus::Completed
                | DownloadStatus::Failed
        )
    }

    /// Terminal for one started attempt: the last status that attempt
    /// will ever publish.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DownloadStatus::Paused | DownloadStatus::Completed | DownloadStatus::Failed
        )
    }
}

#[derive(Debug, Error)]
enum TransferError {
    #[error("server answered {0}")]
    HttpStatus(StatusCode),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

enum TransferOutcome {
    Completed,
    Cancelled,
}

/// One resumable download. Progress and status are published through
/// `watch` channels; the latest value wins for every subscriber.
///
/// Transfers resume from whatever is already on disk: each attempt
/// re-reads the destination length and asks the server for
/// `bytes=<offset>-`.
pub struct DownloadTask {
    url: String,
    path: PathBuf,
    title: String,
    client: Client,
    progress_tx: watch::Sender<f64>,
    status_tx: watch::Sender<DownloadStatus>,
    cancel: Mutex<CancellationToken>,
}

impl DownloadTask {
    pub(crate) fn new(url: &str, path: &Path, title: &str, client: Client) -> Arc<Self> {
        let (progress_tx, _) = watch::channel(0.0);
        let (status_tx, _) = watch::channel(DownloadStatus::Idle);
        Arc::new(Self {
            url: url.to_string(),
            path: path.to_path_buf(),
            title: title.to_string(),
            client,
            progress_tx,
            status_tx,
            cancel: Mutex::new(CancellationToken::new()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Subscribe to status transitions.
    pub fn status(&self) -> watch::Receiver<DownloadStatus> {
        self.status_tx.subscribe()
    }

    /// Subscribe to progress updates, a fraction in `[0, 1]`.
    pub fn progress(&self) -> watch::Receiver<f64> {
        self.progress_tx.subscribe()
    }

    pub fn current_status(&self) -> DownloadStatus {
        *self.status_tx.borrow()
    }

    pub fn current_progress(&self) -> f64 {
        *self.progress_tx.borrow()
    }

    /// Begin or resume the transfer. No-op while a transfer is running
    /// or once the download has completed.
    pub fn start(self: &Arc<Self>) {
        let status = self.current_status();
        if status == DownloadStatus::Downloading || status == DownloadStatus::Completed {
            return;
        }
        self.status_tx.send_replace(DownloadStatus::Queued);

        let token = CancellationToken::new();
        *self.cancel.lock().expect("cancel token lock poisoned") = token.clone();

        let task = Arc::clone(self);
        tokio::spawn(async move {
            task.run_attempt(token).await;
        });
    }

    /// Cancel the in-flight transfer. Only valid while queued or
    /// downloading; the partial file stays on disk for a later resume.
    pub fn pause(&self) {
        let status = self.current_status();
        if status == DownloadStatus::Downloading || status == DownloadStatus::Queued {
            self.cancel.lock().expect("cancel token lock poisoned").cancel();
            self.status_tx.send_replace(DownloadStatus::Paused);
        }
    }

    /// Continue a paused or failed download. Delegates to [`Self::start`],
    /// which re-derives the byte offset from the destination file.
    pub fn resume(self: &Arc<Self>) {
        let status = self.current_status();
        if status == DownloadStatus::Paused || status == DownloadStatus::Failed {
            self.start();
        }
    }

    async fn run_attempt(&self, token: CancellationToken) {
        if token.is_cancelled() {
            // Paused before the worker got scheduled.
            return;
        }
        self.status_tx.send_replace(DownloadStatus::Downloading);

        match self.transfer(&token).await {
            Ok(TransferOutcome::Completed) => {
                self.progress_tx.send_replace(1.0);
                self.status_tx.send_replace(DownloadStatus::Completed);
            }
            Ok(TransferOutcome::Cancelled) => {
                // pause() already published Paused.
            }
            Err(err) => {
                if token.is_cancelled() {
                    return;
                }
                tracing::debug!("download of {} failed: {err}", self.url);
                self.status_tx.send_replace(DownloadStatus::Failed);
            }
        }
    }

    async fn transfer(&self, token: &CancellationToken) -> Result<TransferOutcome, TransferError> {
        let offset = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };

        let response = self
            .client
            .get(&self.url)
            .header(header::RANGE, format!("bytes={offset}-"))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            // The file on disk already covers the whole resource.
            return Ok(TransferOutcome::Completed);
        }
        if !status.is_success() {
            return Err(TransferError::HttpStatus(status));
        }

        // Content-Length of a 206 response is the remaining byte count.
        let total = response.content_length().map(|remaining| offset + remaining);

        if let Some(total) = total.filter(|&t| t > 0) {
            if offset >= total {
                return Ok(TransferOutcome::Completed);
            }
            self.progress_tx.send_replace(offset as f64 / total as f64);
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.path)
            .await?;
        file.seek(SeekFrom::Start(offset)).await?;

        use futures_util::StreamExt;

        let mut stream = response.bytes_stream();
        let mut written = offset;

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    // Flush what already arrived, read nothing further.
                    file.flush().await?;
                    return Ok(TransferOutcome::Cancelled);
                }
                next = stream.next() => next,
            };
            let Some(chunk) = next else { break };
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            if let Some(total) = total.filter(|&t| t > 0) {
                self.progress_tx
                    .send_replace((written as f64 / total as f64).min(1.0));
            }
        }

        file.flush().await?;
        Ok(TransferOutcome::Completed)
    }
}
