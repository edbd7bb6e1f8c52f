//! Unix-socket [`EventSource`] implementation.
//!
//! Binds a Unix stream socket and serves each connection on its own thread.
//! Each line received is parsed as a JSON-encoded [`Event`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`, tagged by
//! `action`:
//!
//! ```json
//! {"action":"gesturePrediction","gesture":"fist"}
//! {"action":"simulateCommand","command":"nextTab"}
//! {"action":"startCamera"}
//! {"action":"stopCamera"}
//! {"action":"setCamera","enabled":true}
//! {"action":"syncCamera"}
//! ```

use crate::command::Event;
use crate::traits::EventSource;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

/// An [`EventSource`] that listens on a Unix stream socket.
///
/// Every accepted connection is read on its own thread, so a recognizer
/// holding its connection open does not starve other clients.  A
/// connection may carry any number of events.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl UnixSocketListener {
    /// Create a listener for `path`.  The socket file is created by
    /// [`run`](EventSource::run).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Forward every well-formed line from `reader` to `sink`.  Returns
    /// `false` once the sink has gone away.
    ///
    /// Lines that are not UTF-8 or not a known event are logged and
    /// skipped; only a read error ends the connection.
    fn pump(mut reader: impl BufRead, sink: &mpsc::Sender<Event>) -> bool {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => return true,
                Ok(_) => {}
                Err(e) => {
                    error!("read error: {}", e);
                    return true;
                }
            }
            let text = match std::str::from_utf8(&buf) {
                Ok(text) => text.trim(),
                Err(e) => {
                    warn!("dropping non-UTF-8 line: {}", e);
                    continue;
                }
            };
            if text.is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(text) {
                Ok(event) => {
                    debug!("received {:?}", event);
                    if sink.send(event).is_err() {
                        return false;
                    }
                }
                Err(e) => warn!("bad event {:?}: {}", text, e),
            }
        }
    }
}

impl EventSource for UnixSocketListener {
    type Error = SocketError;

    /// Bind the socket and accept connections.
    ///
    /// This method **blocks**.  It returns on the first accept after the
    /// receiving end of `sink` has been dropped.  Run it on a dedicated
    /// thread.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error> {
        // Stale socket from a previous run.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        let closed = Arc::new(AtomicBool::new(false));
        for stream in listener.incoming() {
            if closed.load(Ordering::SeqCst) {
                info!("sink closed, shutting down");
                break;
            }
            match stream {
                Ok(stream) => {
                    debug!("client connected");
                    let sink = sink.clone();
                    let closed = Arc::clone(&closed);
                    std::thread::spawn(move || {
                        if !Self::pump(BufReader::new(stream), &sink) {
                            closed.store(true, Ordering::SeqCst);
                        }
                        debug!("client disconnected");
                    });
                }
                Err(e) => error!("accept error: {}", e),
            }
        }
        let _ = std::fs::remove_file(&self.path);
        Ok(())
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandName;
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "gestured-test-{}-{}.sock",
            std::process::id(),
            id
        ))
    }

    /// Run a listener on a fresh socket in the background.
    fn spawn_listener() -> (PathBuf, mpsc::Receiver<Event>) {
        let path = tmp_socket_path();
        let path_clone = path.clone();
        let (tx, rx) = mpsc::channel();

        let _handle = std::thread::spawn(move || {
            let mut listener = UnixSocketListener::new(&path_clone);
            let _ = listener.run(tx);
        });

        // Give the listener a moment to bind.
        std::thread::sleep(Duration::from_millis(150));
        (path, rx)
    }

    /// Send raw `bytes` over one connection and return what reached the
    /// sink.
    fn send_bytes(bytes: &[u8]) -> Vec<Event> {
        let (path, rx) = spawn_listener();
        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            stream.write_all(bytes).unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }

        std::thread::sleep(Duration::from_millis(150));
        let events = rx.try_iter().collect();
        let _ = std::fs::remove_file(&path);
        events
    }

    fn send_lines(lines: &[&str]) -> Vec<Event> {
        let mut bytes = Vec::new();
        for line in lines {
            bytes.extend_from_slice(line.as_bytes());
            bytes.push(b'\n');
        }
        send_bytes(&bytes)
    }

    #[test]
    fn events_arrive_in_order() {
        let events = send_lines(&[
            r#"{"action":"gesturePrediction","gesture":"fist"}"#,
            r#"{"action":"simulateCommand","command":"nextTab"}"#,
            r#"{"action":"startCamera"}"#,
            r#"{"action":"setCamera","enabled":false}"#,
        ]);
        assert_eq!(
            events,
            vec![
                Event::GesturePrediction {
                    gesture: "fist".into()
                },
                Event::SimulateCommand {
                    command: CommandName::NextTab
                },
                Event::StartCamera,
                Event::SetCamera { enabled: false },
            ]
        );
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let events = send_lines(&[
            "not json at all",
            r#"{"action":"teleport"}"#,
            "",
            r#"{"action":"simulateCommand","command":"warpDrive"}"#,
            r#"{"action":"stopCamera"}"#,
        ]);
        assert_eq!(events, vec![Event::StopCamera]);
    }

    #[test]
    fn non_utf8_line_does_not_end_connection() {
        let events = send_bytes(b"\xff\xfe garbage\n{\"action\":\"stopCamera\"}\n");
        assert_eq!(events, vec![Event::StopCamera]);
    }

    #[test]
    fn open_connection_does_not_block_other_clients() {
        let (path, rx) = spawn_listener();

        // The recognizer connects first and stays connected.
        let mut recognizer = UnixStream::connect(&path).expect("connect recognizer");
        writeln!(recognizer, r#"{{"action":"gesturePrediction","gesture":"fist"}}"#).unwrap();
        recognizer.flush().unwrap();
        std::thread::sleep(Duration::from_millis(100));

        {
            let mut control = UnixStream::connect(&path).expect("connect control");
            writeln!(control, r#"{{"action":"stopCamera"}}"#).unwrap();
            control.shutdown(std::net::Shutdown::Write).unwrap();
        }

        std::thread::sleep(Duration::from_millis(150));
        let events: Vec<Event> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                Event::GesturePrediction {
                    gesture: "fist".into()
                },
                Event::StopCamera,
            ]
        );

        drop(recognizer);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn pump_stops_when_sink_is_gone() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let input = b"{\"action\":\"syncCamera\"}\n".as_slice();
        assert!(!UnixSocketListener::pump(input, &tx));
    }

    #[test]
    fn pump_forwards_from_any_reader() {
        let (tx, rx) = mpsc::channel();
        let input =
            b"{\"action\":\"syncCamera\"}\n\n\xc3\x28\n{\"action\":\"stopCamera\"}".as_slice();
        assert!(UnixSocketListener::pump(input, &tx));
        let events: Vec<Event> = rx.try_iter().collect();
        assert_eq!(events, vec![Event::SyncCamera, Event::StopCamera]);
    }
}
