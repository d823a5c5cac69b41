use futures::StreamExt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tungstenite::Message;

use track_server::net::start_server;
use track_server::{CourseLayout, ServerState, Simulation, SimulationConfig};

const INDEX: &str = "<!doctype html><title>track</title><canvas id=\"view\"></canvas>";

fn client_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("track-server-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), INDEX).unwrap();
    std::fs::write(dir.join("script.js"), "console.log('hi');").unwrap();
    dir
}

fn start(static_dir: Option<PathBuf>) -> SocketAddr {
    let state = ServerState::shared(Simulation::new(
        SimulationConfig::default(),
        CourseLayout::default(),
    ));
    let (addr, server) = start_server(([127, 0, 0, 1], 0).into(), static_dir, state).unwrap();
    tokio::spawn(server);
    addr
}

async fn http_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut buf))
        .await
        .expect("timed out waiting for response")
        .unwrap();
    String::from_utf8_lossy(&buf).into_owned()
}

#[tokio::test]
async fn test_serves_client_files() {
    let addr = start(Some(client_dir("files")));

    let page = http_get(addr, "/index.html").await;
    assert!(page.starts_with("HTTP/1.1 200"), "{page}");
    assert!(page.to_ascii_lowercase().contains("content-type: text/html"));
    assert!(page.ends_with(INDEX));

    let script = http_get(addr, "/script.js").await;
    assert!(script.starts_with("HTTP/1.1 200"), "{script}");
    assert!(script.ends_with("console.log('hi');"));
}

#[tokio::test]
async fn test_root_serves_index() {
    let addr = start(Some(client_dir("root")));

    let page = http_get(addr, "/").await;
    assert!(page.starts_with("HTTP/1.1 200"), "{page}");
    assert!(page.ends_with(INDEX));
}

#[tokio::test]
async fn test_missing_file_is_not_served() {
    let addr = start(Some(client_dir("missing")));

    let response = http_get(addr, "/nope.html").await;
    assert!(!response.starts_with("HTTP/1.1 200"), "{response}");
}

#[tokio::test]
async fn test_no_static_dir_serves_nothing() {
    let addr = start(None);

    let response = http_get(addr, "/index.html").await;
    assert!(!response.starts_with("HTTP/1.1 200"), "{response}");
}

#[tokio::test]
async fn test_websocket_shares_port_with_files() {
    let addr = start(Some(client_dir("shared")));
    let (mut client, _) = connect_async(format!("ws://{addr}").as_str()).await.unwrap();

    let msg = timeout(Duration::from_secs(5), client.next())
        .await
        .expect("timed out waiting for welcome")
        .expect("stream ended")
        .expect("websocket error");
    let Message::Text(text) = msg else {
        panic!("expected a text frame, got {msg:?}");
    };
    let welcome: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(welcome["type"], "yourVehicleId");
}
