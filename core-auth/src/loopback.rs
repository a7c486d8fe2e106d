//! Loopback redirect receiver for the installed-application flow.
//!
//! Binds an ephemeral port on 127.0.0.1, waits for the browser to follow the
//! authorization server's redirect, and answers with a short HTML page.

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};
use url::Url;

use crate::error::{AuthError, Result};

/// Largest request head accepted from the browser.
const MAX_REQUEST_BYTES: usize = 16 * 1024;

const SUCCESS_PAGE: &str = "<html><body><h1>Authorization complete</h1>\
    <p>You may close this window and return to the terminal.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><h1>Authorization failed</h1>\
    <p>Return to the terminal for details.</p></body></html>";

/// Parameters delivered to the redirect URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCallback {
    pub code: String,
    pub state: String,
}

/// One-shot HTTP listener on the loopback interface.
pub struct LoopbackReceiver {
    listener: TcpListener,
    addr: SocketAddr,
}

impl LoopbackReceiver {
    /// Bind `127.0.0.1` on a port chosen by the OS.
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| AuthError::AuthenticationFailed(format!("cannot bind loopback port: {}", e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| AuthError::AuthenticationFailed(format!("cannot read loopback address: {}", e)))?;

        debug!(port = addr.port(), "Loopback receiver listening");
        Ok(Self { listener, addr })
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/", self.addr.port())
    }

    /// Accept connections until one carries the authorization response.
    ///
    /// Requests without `code`, `state` or `error` (favicon fetches, for
    /// instance) get a 404 and are ignored.
    pub async fn wait_for_callback(&self) -> Result<AuthCallback> {
        loop {
            let (mut stream, peer) = self
                .listener
                .accept()
                .await
                .map_err(|e| AuthError::AuthenticationFailed(format!("loopback accept failed: {}", e)))?;

            let target = match read_request_target(&mut stream).await {
                Ok(target) => target,
                Err(e) => {
                    warn!(peer = %peer, error = %e, "Ignoring malformed loopback request");
                    continue;
                }
            };

            match parse_callback(&target) {
                Some(Ok(callback)) => {
                    respond(&mut stream, "200 OK", SUCCESS_PAGE).await;
                    return Ok(callback);
                }
                Some(Err(e)) => {
                    respond(&mut stream, "400 Bad Request", FAILURE_PAGE).await;
                    return Err(e);
                }
                None => {
                    debug!(target = %target, "Ignoring unrelated loopback request");
                    respond(&mut stream, "404 Not Found", "").await;
                }
            }
        }
    }
}

async fn read_request_target(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.len() > MAX_REQUEST_BYTES {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "request head too large",
            ));
        }
    }

    let head = String::from_utf8_lossy(&buffer);
    let request_line = head.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();

    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Ok(target.to_string()),
        _ => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unexpected request line '{}'", request_line),
        )),
    }
}

/// Interpret a request target such as `/?code=...&state=...`.
///
/// `None` when the request is not an authorization response at all.
fn parse_callback(target: &str) -> Option<Result<AuthCallback>> {
    let url = Url::parse(&format!("http://127.0.0.1{}", target)).ok()?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(Err(AuthError::AuthenticationFailed(format!(
            "authorization was denied: {}",
            error
        ))));
    }

    match (code, state) {
        (Some(code), Some(state)) => Some(Ok(AuthCallback { code, state })),
        (Some(_), None) => Some(Err(AuthError::AuthenticationFailed(
            "authorization response is missing the state parameter".to_string(),
        ))),
        _ => None,
    }
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!(error = %e, "Failed to answer loopback request");
    }
    let _ = stream.shutdown().await;
}
