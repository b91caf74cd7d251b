// src/testing.rs
// =============================================================================
// A tiny HTTP/1.1 server for tests, so no test touches the internet.
//
// Each route has a status, content type, body, optional gzip encoding, an
// optional redirect target and an optional delay before the response is
// written. Every request is counted per
// path, which lets tests check that nothing was fetched twice.
// =============================================================================

use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct Route {
    status: u16,
    content_type: String,
    body: Vec<u8>,
    content_encoding: Option<String>,
    location: Option<String>,
    delay: Option<Duration>,
}

impl Route {
    pub fn ok(content_type: &str, body: impl AsRef<[u8]>) -> Self {
        Self {
            status: 200,
            content_type: content_type.to_string(),
            body: body.as_ref().to_vec(),
            content_encoding: None,
            location: None,
            delay: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain".to_string(),
            body: format!("status {}", status).into_bytes(),
            content_encoding: None,
            location: None,
            delay: None,
        }
    }

    pub fn gzip(mut self) -> Self {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.body).unwrap();
        self.body = encoder.finish().unwrap();
        self.content_encoding = Some("gzip".to_string());
        self
    }

    // Claims an encoding the body does not actually have
    pub fn encoded_as(mut self, encoding: &str) -> Self {
        self.content_encoding = Some(encoding.to_string());
        self
    }

    // 302 to `path` on this server, addressed by its loopback IP
    pub fn redirect_to_loopback(path: &str) -> Self {
        let mut route = Self::status(302);
        route.location = Some(format!("{{origin}}{}", path));
        route
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

pub struct TestServer {
    addr: SocketAddr,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(routes: Vec<(&str, Route)>) -> Self {
        let routes: Arc<HashMap<String, Route>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, route)| (path.to_string(), route))
                .collect(),
        );
        let hits = Arc::new(Mutex::new(HashMap::new()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let task = {
            let hits = hits.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let routes = routes.clone();
                    let hits = hits.clone();
                    tokio::spawn(async move {
                        let _ = serve(stream, &routes, &hits).await;
                    });
                }
            })
        };

        Self { addr, hits, task }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
    hits: &Mutex<HashMap<String, usize>>,
) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buf[..n]);
    }

    let head = String::from_utf8_lossy(&request);
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    *hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

    let route = routes.get(&path).cloned().unwrap_or_else(|| Route::status(404));
    if let Some(delay) = route.delay {
        tokio::time::sleep(delay).await;
    }

    let mut response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        route.status,
        reason(route.status),
        route.content_type,
        route.body.len()
    );
    if let Some(encoding) = &route.content_encoding {
        response.push_str(&format!("Content-Encoding: {}\r\n", encoding));
    }
    if let Some(location) = &route.location {
        let origin = format!("http://{}", stream.local_addr()?);
        response.push_str(&format!("Location: {}\r\n", location.replace("{origin}", &origin)));
    }
    response.push_str("\r\n");

    stream.write_all(response.as_bytes()).await?;
    stream.write_all(&route.body).await?;
    stream.shutdown().await
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        302 => "Found",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
