//! [`Authority`] and [`FrameSink`] implementation over HTTP.
//!
//! Endpoints (all JSON):
//!
//! | Method | Path               | Body                          |
//! |--------|--------------------|-------------------------------|
//! | GET    | `/status`          |                               |
//! | POST   | `/toggle`          | `{"enabled": bool}`           |
//! | POST   | `/toggle_gestures` | `{"enabled": bool}`           |
//! | POST   | `/frame`           | `{"image": data-url, "timestamp": ms}` |

use super::{AuthorityStatus, AuthorityUnavailable};
use crate::traits::{Authority, FrameSink};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::debug;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// Where the authority lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Base URL without trailing slash.  Default: `http://127.0.0.1:5000`.
    pub base_url: String,
    /// Per-request timeout (ms).  Default: `2000`.
    pub timeout_ms: u64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            timeout_ms: 2000,
        }
    }
}

/// Blocking HTTP client for the authority service.
///
/// Every call is a single request; nothing is retried.
pub struct HttpAuthority {
    client: Client,
    base_url: String,
}

impl HttpAuthority {
    pub fn new(config: &AuthorityConfig) -> Result<Self, AuthorityUnavailable> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(concat!("gestured/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuthorityUnavailable(format!("client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post(&self, path: &str, body: &serde_json::Value) -> Result<(), AuthorityUnavailable> {
        let url = self.url(path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| AuthorityUnavailable(format!("POST {}: {}", url, e)))?;
        check_status(resp, &url)?;
        debug!("POST {} ok", url);
        Ok(())
    }
}

fn check_status(resp: Response, url: &str) -> Result<Response, AuthorityUnavailable> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(AuthorityUnavailable(format!("{} answered {}", url, status)))
    }
}

impl Authority for HttpAuthority {
    fn fetch_status(&self) -> Result<AuthorityStatus, AuthorityUnavailable> {
        let url = self.url("/status");
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| AuthorityUnavailable(format!("GET {}: {}", url, e)))?;
        let resp = check_status(resp, &url)?;
        let body = resp
            .text()
            .map_err(|e| AuthorityUnavailable(format!("read {}: {}", url, e)))?;
        serde_json::from_str(&body)
            .map_err(|e| AuthorityUnavailable(format!("malformed status {:?}: {}", body, e)))
    }

    fn set_gating_state(&self, enabled: bool) -> Result<(), AuthorityUnavailable> {
        self.post("/toggle_gestures", &json!({ "enabled": enabled }))
    }

    fn set_camera_enabled(&self, enabled: bool) -> Result<(), AuthorityUnavailable> {
        self.post("/toggle", &json!({ "enabled": enabled }))
    }
}

/// Encode a JPEG as the `data:` URL the frame endpoint expects.
pub(crate) fn jpeg_data_url(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg))
}

impl FrameSink for HttpAuthority {
    fn submit_frame(&self, jpeg: &[u8], timestamp_ms: u64) -> Result<(), AuthorityUnavailable> {
        self.post(
            "/frame",
            &json!({ "image": jpeg_data_url(jpeg), "timestamp": timestamp_ms }),
        )
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;

    /// A request as seen by the fake server.
    #[derive(Debug)]
    struct Captured {
        request_line: String,
        body: String,
    }

    fn read_request(stream: &TcpStream) -> Captured {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).unwrap();
        Captured {
            request_line: request_line.trim_end().to_string(),
            body: String::from_utf8(body).unwrap(),
        }
    }

    /// Serve a single request with `status` and `body`, reporting what was
    /// received.
    fn serve_once(status: &'static str, body: &'static str) -> (String, mpsc::Receiver<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let captured = read_request(&stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            let _ = tx.send(captured);
        });
        (base, rx)
    }

    fn client(base_url: String) -> HttpAuthority {
        HttpAuthority::new(&AuthorityConfig {
            base_url,
            timeout_ms: 2000,
        })
        .unwrap()
    }

    #[test]
    fn fetch_status_parses_both_flags() {
        let (base, rx) = serve_once("200 OK", r#"{"gestures_enabled":true,"camera_enabled":false}"#);
        let status = client(base).fetch_status().unwrap();
        assert!(status.gestures_enabled);
        assert!(!status.camera_enabled);
        assert!(rx.recv().unwrap().request_line.starts_with("GET /status "));
    }

    #[test]
    fn fetch_status_defaults_missing_flags() {
        let (base, _rx) = serve_once("200 OK", r#"{"camera_enabled":true}"#);
        let status = client(base).fetch_status().unwrap();
        assert!(!status.gestures_enabled);
        assert!(status.camera_enabled);
    }

    #[test]
    fn malformed_status_is_unavailable() {
        let (base, _rx) = serve_once("200 OK", "<html>nope</html>");
        assert!(client(base).fetch_status().is_err());
    }

    #[test]
    fn server_error_is_unavailable() {
        let (base, _rx) = serve_once("500 Internal Server Error", "{}");
        assert!(client(base).fetch_status().is_err());
    }

    #[test]
    fn unreachable_authority_is_unavailable() {
        // Bind then drop to get a port nobody listens on.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let err = client(format!("http://127.0.0.1:{}", port))
            .fetch_status()
            .unwrap_err();
        assert!(err.to_string().contains("authority unavailable"));
    }

    #[test]
    fn set_gating_state_posts_flag() {
        let (base, rx) = serve_once("200 OK", r#"{"success":true}"#);
        client(base).set_gating_state(false).unwrap();
        let req = rx.recv().unwrap();
        assert!(req.request_line.starts_with("POST /toggle_gestures "));
        let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
        assert_eq!(body, json!({ "enabled": false }));
    }

    #[test]
    fn set_camera_enabled_posts_to_toggle() {
        let (base, rx) = serve_once("200 OK", r#"{"success":true,"camera_enabled":true}"#);
        client(base).set_camera_enabled(true).unwrap();
        let req = rx.recv().unwrap();
        assert!(req.request_line.starts_with("POST /toggle "));
        let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
        assert_eq!(body, json!({ "enabled": true }));
    }

    #[test]
    fn frame_is_sent_as_data_url() {
        let (base, rx) = serve_once("200 OK", r#"{"success":true}"#);
        client(base).submit_frame(&[0xff, 0xd8, 0xff], 1234).unwrap();
        let req = rx.recv().unwrap();
        assert!(req.request_line.starts_with("POST /frame "));
        let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
        assert_eq!(body["image"], "data:image/jpeg;base64,/9j/");
        assert_eq!(body["timestamp"], 1234);
    }

    #[test]
    fn trailing_slash_in_base_url_is_ignored() {
        let c = client("http://127.0.0.1:5000/".into());
        assert_eq!(c.url("/status"), "http://127.0.0.1:5000/status");
    }
}
