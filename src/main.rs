//! Entry point for the **gestured** daemon.
//!
//! Spawns the event sources on background threads and processes incoming
//! events on the main thread, one at a time.

use gestured::authority::http::HttpAuthority;
use gestured::authority::OfflineAuthority;
use gestured::command::Event;
use gestured::config::Config;
use gestured::engine::{DispatchEngine, Outcome};
use gestured::host::bridge::BridgeHost;
use gestured::host::memory::MemoryHost;
use gestured::ipc::listener::UnixSocketListener;
use gestured::traits::{Authority, EventSource, Host};
use log::{debug, error, info};
use std::sync::mpsc;
use std::time::Duration;

/// Default socket path for the event listener.
fn default_socket_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/gestured.sock", runtime)
}

/// Default socket path of the browser bridge.
fn default_bridge_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/gestured-bridge.sock", runtime)
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/gestured`).
fn config_dir() -> std::path::PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    std::path::PathBuf::from(base).join("gestured")
}

/// Try to load the config from `$XDG_CONFIG_HOME/gestured/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

/// A browser with a few tabs open, for trying gestures without one.
fn demo_host() -> MemoryHost {
    let host = MemoryHost::new();
    let video = host.open("https://www.youtube.com/watch?v=dQw4w9WgXcQ", true);
    host.add_media(video, true);
    host.add_element(video, "#voice-search-button button");
    let search = host.open("https://www.google.com/", false);
    host.add_element(search, r#"div[aria-label="Search by voice"]"#);
    host.open("https://doc.rust-lang.org/book/", false);
    host
}

//  Main

fn main() {
    env_logger::init();

    let simulate_tabs = std::env::args().any(|a| a == "--simulate-tabs");
    let config = load_config();

    let authority: Box<dyn Authority> = match HttpAuthority::new(&config.authority) {
        Ok(a) => Box::new(a),
        Err(e) => {
            error!("{}; every command but toggleGestures will be dropped", e);
            Box::new(OfflineAuthority::new(e.to_string()))
        }
    };

    let (event_tx, event_rx) = mpsc::channel::<Event>();
    let socket_path = config.socket_path.clone().unwrap_or_else(default_socket_path);
    spawn_event_sources(event_tx, socket_path);

    if simulate_tabs {
        info!("simulating a browser with demo tabs");
        let engine = DispatchEngine::from_config(demo_host(), authority, &config);
        run_event_loop(engine, event_rx);
    } else {
        let path = config.bridge.socket_path.clone().unwrap_or_else(default_bridge_path);
        info!("driving the browser through {}", path);
        let host = BridgeHost::new(path, Duration::from_millis(config.bridge.timeout_ms));
        let engine = DispatchEngine::from_config(host, authority, &config);
        run_event_loop(engine, event_rx);
    }
}

//  Event loop

fn run_event_loop<H: Host, A: Authority>(
    mut engine: DispatchEngine<H, A>,
    event_rx: mpsc::Receiver<Event>,
) {
    info!("gestured running");
    for event in event_rx {
        match engine.handle(event) {
            Ok(Outcome::Executed { command, effect }) => {
                debug!("{} executed: {:?}", command, effect)
            }
            Ok(outcome) => debug!("{:?}", outcome),
            Err(e) => error!("dispatch error: {}", e),
        }
    }
    info!("all event sources closed, exiting");
}

//  Helpers

fn spawn_event_sources(tx: mpsc::Sender<Event>, socket_path: String) {
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&socket_path);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}
