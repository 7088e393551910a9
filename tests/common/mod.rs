//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::U256;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use w3b_stitch::blockchain::scripted::ScriptedTransport;
use w3b_stitch::blockchain::{ChainClient, SubmissionSettings};
use w3b_stitch::config::NetworkConfig;
use w3b_stitch::{AppConfig, AppState, HttpServer, Shutdown};

/// Defaults with chain access and metrics off.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.chain.enabled = false;
    config.observability.metrics_enabled = false;
    config.networks = NetworkConfig::defaults();
    config
}

/// Fast tracker settings for scripted chains.
pub fn fast_settings() -> SubmissionSettings {
    SubmissionSettings {
        poll_interval: Duration::from_millis(5),
        stall_after: Duration::from_millis(50),
        finality_depth: 1,
        min_free_balance: U256::from(1_000u64),
    }
}

/// State wired to a scripted chain.
pub fn scripted_state(config: AppConfig, transport: Arc<ScriptedTransport>) -> AppState {
    AppState::new(config).with_chain(ChainClient::with_transport(transport, fast_settings()))
}

/// Bind the real router on an ephemeral port and serve it in the background.
pub async fn spawn_app(state: AppState) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(state);
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Start a mock HTTP backend. Each request body is sent on the returned
/// channel; `f` decides the status and body of the answer.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, mpsc::UnboundedReceiver<String>)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let body = read_request_body(&mut socket).await;
                let _ = tx.send(body);

                let (status, body) = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    400 => "400 Bad Request",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    502 => "502 Bad Gateway",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, rx)
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn read_request_body(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let content_length = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                return String::from_utf8_lossy(&buf[end + 4..end + 4 + content_length]).to_string();
            }
        }
    }
    String::new()
}
