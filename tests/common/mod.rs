//! Shared helpers for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use auv_sim_api::config::SimConfig;
use auv_sim_api::http::HttpServer;
use auv_sim_api::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Serve `config` on `addr` until the returned handle is triggered.
pub async fn start_server(addr: SocketAddr, config: SimConfig) -> Shutdown {
    let (shutdown, _) = start_server_with_updates(addr, config).await;
    shutdown
}

/// Like [`start_server`], also returning the sender feeding config reloads.
pub async fn start_server_with_updates(
    addr: SocketAddr,
    mut config: SimConfig,
) -> (Shutdown, mpsc::UnboundedSender<SimConfig>) {
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind(addr).await.unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (shutdown, updates)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("auv-cli/0.1")
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}
