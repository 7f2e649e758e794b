//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use vite_bridge::{ConfigOptions, ProcessEnv, Registry};

/// Request line and headers as received by a mock dev server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Header names lowercased.
    pub headers: HashMap<String, String>,
}

impl RecordedRequest {
    fn parse(head: &str) -> Option<Self> {
        let mut lines = head.split("\r\n");
        let mut request_line = lines.next()?.split(' ');
        let method = request_line.next()?.to_string();
        let path = request_line.next()?.to_string();
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
            .collect();
        Some(Self {
            method,
            path,
            headers,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// A mock dev server answering every request with a programmable status.
pub struct MockDevServer {
    pub addr: SocketAddr,
    status: Arc<AtomicU16>,
    requests: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockDevServer {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<RecordedRequest> {
        self.received.lock().unwrap().clone()
    }

    pub fn set_status(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }
}

/// Start a mock dev server on an ephemeral port.
///
/// `delay` holds each response back, to widen race windows.
pub async fn start_dev_server(status: u16, delay: Duration) -> MockDevServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let status = Arc::new(AtomicU16::new(status));
    let requests = Arc::new(AtomicUsize::new(0));
    let received = Arc::new(Mutex::new(Vec::new()));

    let (task_status, task_requests, task_received) =
        (status.clone(), requests.clone(), received.clone());
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let status = task_status.clone();
                    let requests = task_requests.clone();
                    let received = task_received.clone();
                    tokio::spawn(async move {
                        let mut request = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => request.extend_from_slice(&buf[..n]),
                            }
                        }
                        if let Some(recorded) = RecordedRequest::parse(&String::from_utf8_lossy(&request)) {
                            received.lock().unwrap().push(recorded);
                        }
                        requests.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(delay).await;

                        let status_text = match status.load(Ordering::SeqCst) {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "418 I'm a teapot",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                            status_text
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockDevServer {
        addr,
        status,
        requests,
        received,
    }
}

/// A server that accepts connections and reads requests but never answers.
pub async fn start_silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                while let Ok(n) = socket.read(&mut buf).await {
                    if n == 0 {
                        break;
                    }
                }
            });
        }
    });

    addr
}

/// A port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Options pointing the bridge at a plain HTTP server on `port` on localhost.
pub fn options(root: &std::path::Path, mode: &str, port: u16) -> ConfigOptions {
    ConfigOptions {
        root: Some(root.to_path_buf()),
        mode: Some(mode.to_string()),
        host: Some("127.0.0.1".to_string()),
        port: Some(port),
        https: Some(false),
        dev_server_connect_timeout: Some(1.0),
        ..Default::default()
    }
}

pub fn registry(env: ProcessEnv, window: Duration) -> Registry {
    Registry::builder().env(env).probe_window(window).build()
}
