//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use mini_httpd::config::ServerConfig;
use mini_httpd::lifecycle::build_router;
use mini_httpd::net::Listener;
use mini_httpd::{HttpServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Start a server on an ephemeral port. Keep the `Shutdown` alive for the test's duration.
pub async fn start_server(config: ServerConfig) -> (SocketAddr, Shutdown) {
    let router = build_router(&config).unwrap();
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    let listener = Listener::from_tcp(tcp, config.listener.max_connections);

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, router);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await;
    });

    (addr, shutdown)
}

/// Send raw bytes, half-close, and read until the server closes the connection.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("server did not close the connection")
        .unwrap();
    response
}

/// A fresh, empty directory under the system temp dir.
#[allow(dead_code)]
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mini-httpd-it-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
