#![allow(dead_code)]

use archive_core::ArchiveConfig;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub struct TestServer {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Minimal HTTP/1.1 responder serving fixed bodies by path; unknown paths get 404.
pub async fn spawn_server(routes: Vec<(&str, Vec<u8>)>) -> TestServer {
    let routes: Arc<HashMap<String, Vec<u8>>> = Arc::new(
        routes
            .into_iter()
            .map(|(path, body)| (path.to_string(), body))
            .collect(),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    let n = socket.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&chunk[..n]);
                    if request.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }

                let request = String::from_utf8_lossy(&request);
                let path = request.split_whitespace().nth(1).unwrap_or("/");
                let (status, body) = match routes.get(path) {
                    Some(body) => (200, body.clone()),
                    None => (404, b"not found".to_vec()),
                };

                let head = format!(
                    "HTTP/1.1 {} Test\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    TestServer { addr, hits }
}

/// A real JPEG well above the placeholder threshold: noisy pixels compress poorly.
pub fn noisy_jpeg() -> Vec<u8> {
    let mut state: u32 = 0x1234_5678;
    let img = image::RgbImage::from_fn(128, 128, |_, _| {
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        };
        image::Rgb([next(), next(), next()])
    });

    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg)
        .expect("encode jpeg");
    let bytes = out.into_inner();
    assert!(bytes.len() > 5120, "fixture too small: {}", bytes.len());
    bytes
}

pub fn filler_body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub struct Workspace {
    pub dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn plurks_dir(&self) -> PathBuf {
        self.root().join("data").join("plurks")
    }

    pub fn responses_dir(&self) -> PathBuf {
        self.root().join("data").join("responses")
    }

    pub fn output_root(&self) -> PathBuf {
        self.root().join("out")
    }

    pub fn config(&self) -> ArchiveConfig {
        ArchiveConfig::default()
            .with_output_root(self.output_root())
            .with_sources(self.plurks_dir(), self.responses_dir())
    }

    /// Writes an export file wrapping `items_json` the way timeline backups do.
    pub fn write_export(&self, source: &Path, name: &str, items_json: &str) -> PathBuf {
        std::fs::create_dir_all(source).unwrap();
        let path = source.join(name);
        let stem = name.trim_end_matches(".js");
        std::fs::write(
            &path,
            format!("BackupData.plurks[\"{}\"]={};\n", stem, items_json),
        )
        .unwrap();
        path
    }
}
