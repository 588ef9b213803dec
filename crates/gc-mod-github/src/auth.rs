//! One-shot OAuth authorization handshake.
//!
//! Opens the authorization page, waits for the browser redirect on a local
//! listener bound to the redirect URI's path, and exchanges the code for a
//! bearer token.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use gc_base::config::OAuthConfig;
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// How often the listener checks for a connection or the deadline
const ACCEPT_POLL_MS: u64 = 50;

/// Upper bound on an HTTP request head from the browser
const MAX_REQUEST_HEAD: usize = 16 * 1024;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid redirect URI {0}")]
    BadRedirect(String),

    #[error("could not listen for the OAuth callback: {0}")]
    Bind(std::io::Error),

    #[error("I/O error while waiting for the OAuth callback: {0}")]
    Io(#[from] std::io::Error),

    #[error("no OAuth callback received within {0}s")]
    Timeout(u64),

    #[error("authorization denied: {0}")]
    Denied(String),

    #[error("token exchange failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint returned no access token: {0}")]
    NoToken(String),
}

/// Local listener for exactly one OAuth redirect.
pub struct CallbackListener {
    listener: TcpListener,
    path: String,
}

/// A received redirect carrying a code. The browser is still waiting on
/// `stream` for the final page.
pub struct PendingCallback {
    pub code: String,
    stream: TcpStream,
}

impl PendingCallback {
    /// Finish the browser request with a plain-text page.
    pub fn respond(mut self, success: bool, message: &str) {
        let status = if success { "200 OK" } else { "500 Internal Server Error" };
        let _ = write_response(&mut self.stream, status, message);
    }
}

impl CallbackListener {
    /// Bind to the host/port of `redirect_uri` and accept only its path.
    pub fn bind(redirect_uri: &str) -> Result<Self, AuthError> {
        let url = Url::parse(redirect_uri).map_err(|e| AuthError::BadRedirect(format!("{}: {}", redirect_uri, e)))?;
        let host = url.host_str().ok_or_else(|| AuthError::BadRedirect(redirect_uri.to_string()))?;
        let port = url.port_or_known_default().ok_or_else(|| AuthError::BadRedirect(redirect_uri.to_string()))?;
        Self::bind_addr((host, port), url.path())
    }

    pub fn bind_addr(addr: impl ToSocketAddrs, path: &str) -> Result<Self, AuthError> {
        let listener = TcpListener::bind(addr).map_err(AuthError::Bind)?;
        listener.set_nonblocking(true).map_err(AuthError::Bind)?;
        Ok(Self { listener, path: path.to_string() })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Wait for the first request on our path carrying a `code`, or until
    /// `timeout`. Other paths get 404, a missing code gets 400, and the wait
    /// continues. The listener is closed when this returns.
    pub fn wait_for_code(self, timeout: Duration) -> Result<PendingCallback, AuthError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    debug!(%peer, "OAuth callback connection");
                    if let Some(result) = self.handle(stream)? {
                        return result;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(AuthError::Timeout(timeout.as_secs()));
                    }
                    thread::sleep(Duration::from_millis(ACCEPT_POLL_MS));
                }
                Err(e) => return Err(AuthError::Io(e)),
            }
        }
    }

    /// `Ok(None)` means keep waiting.
    fn handle(&self, mut stream: TcpStream) -> Result<Option<Result<PendingCallback, AuthError>>, AuthError> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;

        let Some(target) = read_request_target(&mut stream) else {
            let _ = write_response(&mut stream, "400 Bad Request", "Error: malformed request.");
            return Ok(None);
        };
        let Ok(url) = Url::parse("http://localhost").and_then(|base| base.join(&target)) else {
            let _ = write_response(&mut stream, "400 Bad Request", "Error: malformed request.");
            return Ok(None);
        };

        if url.path() != self.path {
            let _ = write_response(&mut stream, "404 Not Found", "Not Found");
            return Ok(None);
        }

        let query = |name: &str| url.query_pairs().find(|(k, _)| k == name).map(|(_, v)| v.into_owned());

        if let Some(error) = query("error") {
            let detail = query("error_description").unwrap_or(error);
            let _ = write_response(&mut stream, "400 Bad Request", &format!("Authorization failed: {}", detail));
            return Ok(Some(Err(AuthError::Denied(detail))));
        }

        match query("code").filter(|c| !c.is_empty()) {
            Some(code) => Ok(Some(Ok(PendingCallback { code, stream }))),
            None => {
                let _ = write_response(&mut stream, "400 Bad Request", "Error: No code received.");
                Ok(None)
            }
        }
    }
}

fn read_request_target(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") && buf.len() < MAX_REQUEST_HEAD {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(_) => break,
        }
    }
    let head = String::from_utf8_lossy(&buf);
    let request_line = head.lines().next()?;
    let mut parts = request_line.split_whitespace();
    let _method = parts.next()?;
    parts.next().map(str::to_string)
}

fn write_response(stream: &mut TcpStream, status: &str, body: &str) -> std::io::Result<()> {
    let reply = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(reply.as_bytes())?;
    stream.flush()
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Exchange an authorization code for a bearer token.
pub fn exchange_code(http: &Client, oauth: &OAuthConfig, code: &str) -> Result<SecretBox<String>, AuthError> {
    let request = TokenRequest {
        client_id: &oauth.client_id,
        client_secret: oauth.client_secret.expose_secret(),
        code,
        redirect_uri: &oauth.redirect_uri,
    };
    let resp = http.post(&oauth.token_url).header("Accept", "application/json").json(&request).send()?;
    let status = resp.status();
    let body: TokenResponse = resp.json()?;

    match body.access_token.filter(|t| !t.is_empty()) {
        Some(token) => Ok(SecretBox::new(Box::new(token))),
        None => {
            let reason = body
                .error_description
                .or(body.error)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            Err(AuthError::NoToken(reason))
        }
    }
}

/// Try to open `url` in the user's browser. Returns false if no opener worked.
pub fn open_browser(url: &str) -> bool {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };
    match cmd.arg(url).spawn() {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "could not open a browser");
            false
        }
    }
}
