//! [`Host`] implementation that drives a real browser through its
//! extension bridge.
//!
//! The browser side listens on a Unix socket (by default
//! `$XDG_RUNTIME_DIR/gestured-bridge.sock`).  Each host call opens a
//! short-lived connection, writes one JSON request tagged by `op`, closes
//! its write half and reads one JSON reply:
//!
//! ```json
//! {"op":"activeDocument"}
//! {"ok":true,"result":{"id":7,"window":1,"url":"https://example.com/"}}
//!
//! {"op":"scrollBy","id":7,"dy":-300}
//! {"ok":false,"error":"tab 7 is gone"}
//! ```

use crate::command::{DocumentId, DocumentInfo, WindowId};
use crate::traits::Host;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the browser bridge listens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bridge socket.  Defaults to `$XDG_RUNTIME_DIR/gestured-bridge.sock`.
    pub socket_path: Option<String>,
    /// Read/write timeout per call (ms).  Default: `2000`.
    pub timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            timeout_ms: 2000,
        }
    }
}

/// Errors from talking to the bridge.
#[derive(Debug, thiserror::Error)]
#[error("bridge error: {0}")]
pub struct BridgeHostError(String);

/// One host call on the wire.
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum Request<'a> {
    ActiveDocument,
    DocumentsInWindow { window: WindowId },
    ActivateDocument { id: DocumentId },
    CreateDocument { url: &'a str, active: bool },
    CloseDocument { id: DocumentId },
    ToggleMedia { id: DocumentId },
    ScrollBy { id: DocumentId, dy: i32 },
    ActivateElement {
        id: DocumentId,
        selector: &'a str,
        highlight: bool,
    },
}

#[derive(Debug, Deserialize)]
struct Reply {
    ok: bool,
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

/// Browser host reached over the bridge socket.
///
/// No connection is held open; every call is one request.
pub struct BridgeHost {
    path: PathBuf,
    timeout: Duration,
}

impl BridgeHost {
    pub fn new(path: impl AsRef<Path>, timeout: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            timeout,
        }
    }

    fn call<T: DeserializeOwned>(&self, request: &Request<'_>) -> Result<T, BridgeHostError> {
        let line = serde_json::to_string(request)
            .map_err(|e| BridgeHostError(format!("encode: {}", e)))?;
        debug!("bridge <- {}", line);

        let mut stream = UnixStream::connect(&self.path).map_err(|e| {
            BridgeHostError(format!("connect to {}: {}", self.path.display(), e))
        })?;
        stream
            .set_read_timeout(Some(self.timeout))
            .and_then(|_| stream.set_write_timeout(Some(self.timeout)))
            .map_err(|e| BridgeHostError(format!("timeout: {}", e)))?;

        stream
            .write_all(line.as_bytes())
            .and_then(|_| stream.write_all(b"\n"))
            .and_then(|_| stream.shutdown(std::net::Shutdown::Write))
            .map_err(|e| BridgeHostError(format!("write: {}", e)))?;

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .map_err(|e| BridgeHostError(format!("read: {}", e)))?;
        debug!("bridge -> {}", response.trim_end());

        let reply: Reply = serde_json::from_str(&response)
            .map_err(|e| BridgeHostError(format!("parse {:?}: {}", response.trim_end(), e)))?;
        if !reply.ok {
            return Err(BridgeHostError(
                reply.error.unwrap_or_else(|| "request refused".into()),
            ));
        }
        serde_json::from_value(reply.result)
            .map_err(|e| BridgeHostError(format!("unexpected result: {}", e)))
    }
}

impl Host for BridgeHost {
    type Error = BridgeHostError;

    fn active_document(&self) -> Result<Option<DocumentInfo>, Self::Error> {
        self.call(&Request::ActiveDocument)
    }

    fn documents_in_window(&self, window: WindowId) -> Result<Vec<DocumentInfo>, Self::Error> {
        self.call(&Request::DocumentsInWindow { window })
    }

    fn activate_document(&self, id: DocumentId) -> Result<(), Self::Error> {
        self.call(&Request::ActivateDocument { id })
    }

    fn create_document(&self, url: &str, active: bool) -> Result<DocumentId, Self::Error> {
        self.call(&Request::CreateDocument { url, active })
    }

    fn close_document(&self, id: DocumentId) -> Result<(), Self::Error> {
        self.call(&Request::CloseDocument { id })
    }

    fn toggle_media(&self, id: DocumentId) -> Result<bool, Self::Error> {
        self.call(&Request::ToggleMedia { id })
    }

    fn scroll_by(&self, id: DocumentId, dy: i32) -> Result<(), Self::Error> {
        self.call(&Request::ScrollBy { id, dy })
    }

    fn activate_element(
        &self,
        id: DocumentId,
        selector: &str,
        highlight: bool,
    ) -> Result<bool, Self::Error> {
        self.call(&Request::ActivateElement {
            id,
            selector,
            highlight,
        })
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::io::{BufRead, BufReader};
    use std::os::unix::net::UnixListener;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::mpsc;

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "gestured-bridge-test-{}-{}.sock",
            std::process::id(),
            id
        ))
    }

    /// Fake browser bridge answering one connection per entry in
    /// `replies`, reporting each request it saw.
    fn fake_bridge(replies: Vec<&'static str>) -> (BridgeHost, mpsc::Receiver<Value>) {
        let path = tmp_socket_path();
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).unwrap();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for reply in replies {
                let (mut stream, _) = listener.accept().unwrap();
                let mut line = String::new();
                BufReader::new(&stream).read_line(&mut line).unwrap();
                let _ = tx.send(serde_json::from_str(&line).unwrap());
                stream.write_all(reply.as_bytes()).unwrap();
            }
        });
        (BridgeHost::new(&path, Duration::from_secs(2)), rx)
    }

    #[test]
    fn active_document_round_trip() {
        let (host, rx) = fake_bridge(vec![
            r#"{"ok":true,"result":{"id":7,"window":1,"url":"https://example.com/"}}"#,
        ]);
        let doc = host.active_document().unwrap();
        assert_eq!(
            doc,
            Some(DocumentInfo {
                id: DocumentId(7),
                window: WindowId(1),
                url: "https://example.com/".into(),
            })
        );
        assert_eq!(rx.recv().unwrap(), json!({ "op": "activeDocument" }));
    }

    #[test]
    fn no_active_document_is_null() {
        let (host, _rx) = fake_bridge(vec![r#"{"ok":true,"result":null}"#]);
        assert_eq!(host.active_document().unwrap(), None);
    }

    #[test]
    fn actions_carry_their_arguments() {
        let (host, rx) = fake_bridge(vec![
            r#"{"ok":true}"#,
            r#"{"ok":true,"result":12}"#,
            r#"{"ok":true,"result":true}"#,
        ]);
        host.scroll_by(DocumentId(7), -300).unwrap();
        assert_eq!(host.create_document("cam.html", false).unwrap(), DocumentId(12));
        assert!(host.activate_element(DocumentId(7), "#mic", true).unwrap());

        let seen: Vec<Value> = rx.try_iter().collect();
        assert_eq!(
            seen,
            vec![
                json!({ "op": "scrollBy", "id": 7, "dy": -300 }),
                json!({ "op": "createDocument", "url": "cam.html", "active": false }),
                json!({ "op": "activateElement", "id": 7, "selector": "#mic", "highlight": true }),
            ]
        );
    }

    #[test]
    fn refusal_is_an_error() {
        let (host, _rx) = fake_bridge(vec![r#"{"ok":false,"error":"tab 7 is gone"}"#]);
        let err = host.close_document(DocumentId(7)).unwrap_err();
        assert_eq!(err.to_string(), "bridge error: tab 7 is gone");
    }

    #[test]
    fn garbage_reply_is_an_error() {
        let (host, _rx) = fake_bridge(vec!["<html>"]);
        assert!(host.toggle_media(DocumentId(1)).is_err());
    }

    #[test]
    fn wrong_result_type_is_an_error() {
        let (host, _rx) = fake_bridge(vec![r#"{"ok":true,"result":"yes"}"#]);
        assert!(host.toggle_media(DocumentId(1)).is_err());
    }

    #[test]
    fn missing_bridge_is_an_error() {
        let host = BridgeHost::new(tmp_socket_path(), Duration::from_millis(100));
        let err = host.documents_in_window(WindowId(1)).unwrap_err();
        assert!(err.to_string().contains("connect to"));
    }
}
