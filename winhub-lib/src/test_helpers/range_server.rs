//! Minimal HTTP fixture speaking just enough of the protocol to
//! exercise range-request downloads against a real socket.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Clone, Copy)]
pub enum ServerMode {
    /// Serve the requested range completely.
    Normal,
    /// First request: send `after` bytes of the range, then hang.
    /// Later requests are served completely.
    StallFirst { after: usize },
    /// Answer every request with this status code and no body.
    Status(u16),
}

pub struct RangeServer {
    pub url: String,
    offsets: Arc<Mutex<Vec<u64>>>,
    accept_loop: JoinHandle<()>,
}

impl RangeServer {
    pub async fn spawn(content: Vec<u8>, mode: ServerMode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");

        let offsets: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
        let content = Arc::new(content);
        let requests = Arc::new(AtomicUsize::new(0));

        let accept_offsets = Arc::clone(&offsets);
        let accept_loop = tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                let content = Arc::clone(&content);
                let offsets = Arc::clone(&accept_offsets);
                let requests = Arc::clone(&requests);
                tokio::spawn(async move {
                    let request_index = requests.fetch_add(1, Ordering::SeqCst);
                    let _ = handle(socket, &content, mode, request_index, &offsets).await;
                });
            }
        });

        Self {
            url: format!("http://{addr}/asset.bin"),
            offsets,
            accept_loop,
        }
    }

    /// Byte offsets of every `Range: bytes=<offset>-` header seen.
    pub fn range_offsets(&self) -> Vec<u64> {
        self.offsets.lock().expect("offsets lock poisoned").clone()
    }
}

impl Drop for RangeServer {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn handle(
    mut socket: TcpStream,
    content: &[u8],
    mode: ServerMode,
    request_index: usize,
    offsets: &Mutex<Vec<u64>>,
) -> std::io::Result<()> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        raw.extend_from_slice(&buf[..n]);
    }

    let request = String::from_utf8_lossy(&raw);
    let offset = request
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if !name.trim().eq_ignore_ascii_case("range") {
                return None;
            }
            value.trim().strip_prefix("bytes=")?.strip_suffix('-')?.parse::<u64>().ok()
        })
        .unwrap_or(0);
    offsets.lock().expect("offsets lock poisoned").push(offset);

    if let ServerMode::Status(code) = mode {
        let head = format!(
            "HTTP/1.1 {code} Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
        );
        socket.write_all(head.as_bytes()).await?;
        return socket.shutdown().await;
    }

    let total = content.len() as u64;
    if total > 0 && offset >= total {
        let head = format!(
            "HTTP/1.1 416 Range Not Satisfiable\r\nContent-Range: bytes */{total}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
        );
        socket.write_all(head.as_bytes()).await?;
        return socket.shutdown().await;
    }

    let body = content.get(offset as usize..).unwrap_or_default();
    let head = format!(
        "HTTP/1.1 206 Partial Content\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nContent-Range: bytes {}-{}/{}\r\nConnection: close\r\n\r\n",
        body.len(),
        offset,
        total.saturating_sub(1),
        total,
    );
    socket.write_all(head.as_bytes()).await?;

    if let ServerMode::StallFirst { after } = mode {
        if request_index == 0 {
            let cut = after.min(body.len());
            socket.write_all(&body[..cut]).await?;
            socket.flush().await?;
            // Hold the connection open without ever finishing.
            std::future::pending::<()>().await;
        }
    }

    socket.write_all(body).await?;
    socket.shutdown().await
}
