//! Shared test fixtures: in-process providers and a minimal HTTP stub
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use price_monitor_core::error::FetchError;
use price_monitor_core::models::{AssignedProduct, Product};
use price_monitor_core::providers::PriceProvider;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub fn assigned(store: &str, name: &str, provider: &str, min: i32, max: i32) -> AssignedProduct {
    AssignedProduct {
        store_name: store.to_string(),
        product: Product::new(name, provider, min, max),
    }
}

/// Prices every product with the 1-based number of the current fetch
#[derive(Default)]
pub struct SequenceProvider {
    calls: AtomicI32,
}

#[async_trait]
impl PriceProvider for SequenceProvider {
    fn provider_name(&self) -> &str {
        "sequence"
    }

    async fn fetch_prices(
        &self,
        products: &[Product],
        _cancel: &CancellationToken,
    ) -> Result<HashMap<String, i32>, FetchError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(products
            .iter()
            .map(|p| (p.product_name.clone(), n))
            .collect())
    }
}

/// Fails the first `failures` fetches, then prices everything at `price`
pub struct FlakyProvider {
    failures_left: AtomicUsize,
    price: i32,
    pub calls: AtomicUsize,
}

impl FlakyProvider {
    pub fn new(failures: usize, price: i32) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
            price,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PriceProvider for FlakyProvider {
    fn provider_name(&self) -> &str {
        "flaky"
    }

    async fn fetch_prices(
        &self,
        products: &[Product],
        _cancel: &CancellationToken,
    ) -> Result<HashMap<String, i32>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(FetchError::Status(503));
        }

        Ok(products
            .iter()
            .map(|p| (p.product_name.clone(), self.price))
            .collect())
    }
}

pub enum StubReply {
    Json { status: u16, body: String },
    /// Read the request, never answer, and wait for the client to hang up
    Hang,
}

impl StubReply {
    pub fn ok(body: &str) -> Self {
        StubReply::Json {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        StubReply::Json {
            status,
            body: r#"{"error":"stub"}"#.to_string(),
        }
    }
}

type Responder = dyn Fn(usize, &str) -> StubReply + Send + Sync;

/// One-shot-per-connection HTTP/1.1 server on an ephemeral local port.
///
/// The responder gets the zero-based request index and the request target
/// (path plus query).
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    hung_up: Arc<Notify>,
    task: JoinHandle<()>,
}

impl StubServer {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(usize, &str) -> StubReply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let hung_up = Arc::new(Notify::new());
        let respond: Arc<Responder> = Arc::new(respond);

        let task = {
            let requests = requests.clone();
            let hung_up = hung_up.clone();
            tokio::spawn(async move {
                while let Ok((socket, _)) = listener.accept().await {
                    tokio::spawn(serve_connection(
                        socket,
                        requests.clone(),
                        hung_up.clone(),
                        respond.clone(),
                    ));
                }
            })
        };

        Self {
            base_url: format!("http://{}", addr),
            requests,
            hung_up,
            task,
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Wait until at least `n` requests have arrived
    pub async fn wait_for_requests(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.request_count() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("stub server never saw the expected requests");
    }

    /// Resolves once a client closes a connection left hanging by `StubReply::Hang`
    pub async fn client_hung_up(&self) {
        self.hung_up.notified().await
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_connection(
    mut socket: TcpStream,
    requests: Arc<Mutex<Vec<String>>>,
    hung_up: Arc<Notify>,
    respond: Arc<Responder>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let target = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let index = {
        let mut requests = requests.lock();
        requests.push(target.clone());
        requests.len() - 1
    };

    match respond(index, &target) {
        StubReply::Json { status, body } => {
            let response = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        StubReply::Hang => {
            loop {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }
            hung_up.notify_one();
        }
    }
}
