//! radiod entrypoint.
//!
//! A small, single-writer service that owns the radio trackers. Clients talk
//! to it over a Unix socket with newline-delimited JSON; hardware broadcasts
//! reach the trackers through one event-pump thread.

use fs_err as fs;
use std::env;
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use radio_core::{RadioError, RadioRegistry};
use radio_protocol::{
    parse_event, parse_radio_params, ErrorInfo, FiveState, Method, RadioKind, Request, Response,
    MAX_REQUEST_BYTES, PROTOCOL_VERSION,
};
use serde_json::{json, Value};

mod config;
mod events;
mod sim;

use config::DaemonConfig;
use events::{EventSource, InboundEvent};
use sim::SimulatedHardware;

const SOCKET_NAME: &str = "radiod.sock";
const SOCKET_ENV: &str = "RADIOD_SOCKET";
const DEBUG_LOG_ENV: &str = "RADIOD_DEBUG_LOG";
const READ_TIMEOUT_SECS: u64 = 2;
const READ_CHUNK_SIZE: usize = 4096;

struct DaemonContext {
    registry: Arc<RadioRegistry>,
    events: Sender<InboundEvent>,
}

fn main() {
    init_logging();

    let config = match radio_core::load_config::<DaemonConfig>(None) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "Failed to load radiod config; using defaults");
            DaemonConfig::default()
        }
    };

    let socket_path = match daemon_socket_path() {
        Ok(path) => path,
        Err(err) => {
            error!(error = %err, "Failed to resolve daemon socket path");
            std::process::exit(1);
        }
    };

    if let Err(err) = prepare_socket_dir(&socket_path) {
        error!(error = %err, "Failed to prepare daemon socket directory");
        std::process::exit(1);
    }

    if let Err(err) = remove_existing_socket(&socket_path) {
        error!(error = %err, path = %socket_path.display(), "Failed to remove existing socket");
        std::process::exit(1);
    }

    let listener = match UnixListener::bind(&socket_path) {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, path = %socket_path.display(), "Failed to bind daemon socket");
            std::process::exit(1);
        }
    };

    let (sender, receiver) = mpsc::channel();
    let hardware = Arc::new(SimulatedHardware::new(
        config.simulation.clone(),
        sender.clone(),
    ));
    let registry = Arc::new(RadioRegistry::new(
        hardware.hardware(),
        &config.radio_config(),
    ));
    registry.subscribe_all(Arc::new(|radio: RadioKind, state: FiveState| {
        info!(radio = %radio, state = %state, "Radio state changed");
    }));
    registry.sync_from_hardware();
    hardware.announce_sticky_state();

    if let Err(err) = events::spawn_event_pump(Arc::clone(&registry), hardware, receiver) {
        error!(error = %err, "Failed to start event pump");
        std::process::exit(1);
    }

    info!(
        path = %socket_path.display(),
        radios = ?registry.kinds(),
        transition_ms = config.simulation.transition_ms,
        "radiod started"
    );

    let context = Arc::new(DaemonContext {
        registry,
        events: sender,
    });

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let context = Arc::clone(&context);
                thread::spawn(move || handle_connection(stream, context));
            }
            Err(err) => {
                warn!(error = %err, "Failed to accept daemon connection");
            }
        }
    }
}

fn init_logging() {
    let debug_enabled = env::var(DEBUG_LOG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn daemon_socket_path() -> Result<PathBuf, String> {
    if let Ok(path) = env::var(SOCKET_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    radio_core::config::get_radiod_dir()
        .map(|dir| dir.join(SOCKET_NAME))
        .ok_or_else(|| "Home directory not found".to_string())
}

fn prepare_socket_dir(socket_path: &Path) -> Result<(), String> {
    let parent = socket_path
        .parent()
        .ok_or_else(|| "Socket path has no parent".to_string())?;
    fs::create_dir_all(parent).map_err(|err| format!("Failed to create socket directory: {}", err))
}

fn remove_existing_socket(socket_path: &Path) -> Result<(), String> {
    if socket_path.exists() {
        fs::remove_file(socket_path)
            .map_err(|err| format!("Failed to remove existing socket: {}", err))?;
    }
    Ok(())
}

fn handle_connection(mut stream: UnixStream, context: Arc<DaemonContext>) {
    let request = match read_request(&mut stream) {
        Ok(request) => request,
        Err(err) => {
            warn!(code = %err.code, message = %err.message, "Failed to read request");
            let response = Response::error_with_info(None, err);
            let _ = write_response(&mut stream, response);
            return;
        }
    };

    tracing::debug!(method = ?request.method, id = ?request.id, "Daemon request received");
    let response = handle_request(request, &context);
    let _ = write_response(&mut stream, response);
}

fn read_request(stream: &mut UnixStream) -> Result<Request, ErrorInfo> {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(READ_TIMEOUT_SECS)));

    let mut buffer = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                if buffer.len() > MAX_REQUEST_BYTES {
                    return Err(ErrorInfo::new(
                        "request_too_large",
                        "request exceeded maximum size",
                    ));
                }
                if chunk[..n].contains(&b'\n') {
                    break;
                }
            }
            Err(err)
                if matches!(
                    err.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                return Err(ErrorInfo::new("read_timeout", "request timed out"));
            }
            Err(err) => {
                return Err(ErrorInfo::new(
                    "read_error",
                    format!("failed to read request: {}", err),
                ));
            }
        }
    }

    let request_bytes = match buffer.iter().position(|b| *b == b'\n') {
        Some(index) => &buffer[..index],
        None => buffer.as_slice(),
    };

    if request_bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ErrorInfo::new("empty_request", "request body was empty"));
    }

    serde_json::from_slice(request_bytes).map_err(|err| {
        ErrorInfo::new(
            "invalid_json",
            format!("request was not valid JSON: {}", err),
        )
    })
}

fn handle_request(request: Request, context: &DaemonContext) -> Response {
    if request.protocol_version != PROTOCOL_VERSION {
        return Response::error(
            request.id,
            "protocol_mismatch",
            "unsupported protocol version",
        );
    }

    let registry = &context.registry;
    match request.method {
        Method::GetHealth => {
            let mut data = json!({
                "status": "ok",
                "pid": std::process::id(),
                "version": env!("CARGO_PKG_VERSION"),
                "protocol_version": PROTOCOL_VERSION,
            });
            match serde_json::to_value(registry.snapshots()) {
                Ok(value) => data["radios"] = value,
                Err(err) => warn!(error = %err, "Failed to serialize tracker snapshots"),
            }
            Response::ok(request.id, data)
        }
        Method::ListRadios => {
            let radios: Vec<Value> = registry
                .kinds()
                .into_iter()
                .filter_map(|kind| radio_summary(registry, kind).ok())
                .collect();
            tracing::debug!(radios = radios.len(), "Radio list");
            Response::ok(request.id, Value::Array(radios))
        }
        Method::GetState => with_radio(request, |id, kind| match radio_summary(registry, kind) {
            Ok(summary) => Response::ok(id, summary),
            Err(err) => registry_error(id, err),
        }),
        Method::GetTriState => with_radio(request, |id, kind| match registry.tri_state(kind) {
            Ok(tri_state) => Response::ok(id, json!({ "radio": kind, "tri_state": tri_state })),
            Err(err) => registry_error(id, err),
        }),
        Method::Toggle => with_radio(request, |id, kind| {
            if let Err(err) = registry.toggle(kind) {
                return registry_error(id, err);
            }
            info!(radio = %kind, "Toggle requested");
            match radio_summary(registry, kind) {
                Ok(summary) => Response::ok(id, summary),
                Err(err) => registry_error(id, err),
            }
        }),
        Method::Event => handle_event(request, &context.events),
    }
}

fn with_radio(
    request: Request,
    handler: impl FnOnce(Option<String>, RadioKind) -> Response,
) -> Response {
    let params = match request.params {
        Some(params) => params,
        None => return Response::error(request.id, "invalid_params", "radio is required"),
    };
    match parse_radio_params(params) {
        Ok(kind) => handler(request.id, kind),
        Err(err) => Response::error_with_info(request.id, err),
    }
}

fn radio_summary(registry: &RadioRegistry, kind: RadioKind) -> Result<Value, RadioError> {
    let tracker = registry.tracker(kind)?;
    Ok(json!({
        "radio": kind,
        "state": tracker.state(),
        "tri_state": tracker.tri_state(),
        "is_turning_on": tracker.is_turning_on(),
    }))
}

fn registry_error(id: Option<String>, err: RadioError) -> Response {
    let code = match err {
        RadioError::RadioNotRegistered(_) => "radio_not_registered",
        _ => "radio_error",
    };
    Response::error(id, code, err.to_string())
}

fn handle_event(request: Request, events: &Sender<InboundEvent>) -> Response {
    let params = match request.params {
        Some(params) => params,
        None => return Response::error(request.id, "invalid_params", "event payload is required"),
    };

    let event = match parse_event(params) {
        Ok(event) => event,
        Err(err) => return Response::error_with_info(request.id, err),
    };

    info!(action = event.action(), "Received event");

    if events
        .send(InboundEvent::new(EventSource::Client, event))
        .is_err()
    {
        return Response::error(request.id, "event_pump_stopped", "event pump is not running");
    }

    Response::ok(request.id, json!({ "accepted": true }))
}

fn write_response(stream: &mut UnixStream, response: Response) -> std::io::Result<()> {
    serde_json::to_writer(&mut *stream, &response)?;
    stream.write_all(b"\n")?;
    stream.flush()?;
    Ok(())
}
