//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use model_gateway::config::schema::GatewaySettings;
use model_gateway::{Gateway, RouteRegistry, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Two OpenAI routes pointing at `upstream`.
pub fn basic_config(upstream: &str) -> String {
    format!(
        r#"
routes:
  - name: completions-gpt4
    type: llm/v1/completions
    model:
      name: gpt-4
      provider: openai
      config:
        openai_api_key: mykey
        openai_api_base: {upstream}
  - name: embeddings-gpt4
    type: llm/v1/embeddings
    model:
      name: text-embedding-ada-002
      provider: openai
      config:
        openai_api_key: mykey
        openai_api_base: {upstream}
"#
    )
}

pub fn update_config(upstream: &str) -> String {
    format!(
        r#"
routes:
  - name: chat-gpt4
    type: llm/v1/chat
    model:
      name: gpt-4
      provider: openai
      config:
        openai_api_key: mykey
        openai_api_base: {upstream}
"#
    )
}

pub const INVALID_CONFIG: &str = r#"
routes:
  - invalid_name: invalid
    type: llm/v1/chat
    model:
      invalidkey: invalid
      invalid_provider: invalid
"#;

/// Overwrite the config file in one step.
pub fn write_config(path: &Path, contents: &str) {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents).unwrap();
    std::fs::rename(&tmp, path).unwrap();
}

/// A gateway serving on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub config_path: PathBuf,
    pub registry: Arc<RouteRegistry>,
    pub shutdown: Shutdown,
    _dir: tempfile::TempDir,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until the registry reaches `generation`.
    pub async fn wait_for_generation(&self, generation: u64) {
        for _ in 0..200 {
            if self.registry.generation() >= generation {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "generation {generation} never published (still at {})",
            self.registry.generation()
        );
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn test_settings() -> GatewaySettings {
    let mut settings = GatewaySettings::default();
    settings.reload.poll_interval_ms = 20;
    settings.timeouts.provider_secs = 1;
    settings
}

/// Write `config` to a fresh temp dir and serve it.
pub async fn start_gateway(config: &str) -> TestGateway {
    start_gateway_with(config, test_settings()).await
}

pub async fn start_gateway_with(config: &str, settings: GatewaySettings) -> TestGateway {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("routes.yaml");
    std::fs::write(&config_path, config).unwrap();

    let gateway = Gateway::bootstrap(&config_path, settings).unwrap();
    let registry = Arc::clone(gateway.registry());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let run_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = gateway.run(listener, &run_shutdown).await;
    });

    TestGateway {
        addr,
        config_path,
        registry,
        shutdown,
        _dir: dir,
    }
}

/// Start a programmable mock upstream on an ephemeral port.
///
/// `f` receives the raw request text and returns status and JSON body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let request = read_request(&mut socket).await;
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
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
                Err(_) => break,
            }
        }
    });

    addr
}

/// Read headers and a `Content-Length` body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
