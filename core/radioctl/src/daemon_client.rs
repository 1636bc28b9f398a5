//! Client helper for talking to radiod.
//!
//! One request per connection, newline-delimited JSON both ways. The daemon
//! owns all radio state; this side only formats requests and surfaces errors.

use chrono::Utc;
use radio_protocol::{
    HardwareEvent, Method, RadioKind, Request, Response, MAX_REQUEST_BYTES,
};
use serde_json::{json, Value};
use std::env;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

const SOCKET_ENV: &str = "RADIOD_SOCKET";
const SOCKET_NAME: &str = "radiod.sock";
const READ_TIMEOUT_MS: u64 = 2000;
const WRITE_TIMEOUT_MS: u64 = 600;
const RETRY_DELAY_MS: u64 = 50;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Home directory not found")]
    NoHome,

    #[error("Failed to connect to radiod at {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error talking to radiod: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timed out waiting for radiod response")]
    Timeout,

    #[error("radiod response was empty")]
    EmptyResponse,

    #[error("radiod response exceeded maximum size")]
    ResponseTooLarge,

    #[error("radiod error {code}: {message}")]
    Daemon { code: String, message: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

pub fn socket_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(SOCKET_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let home = dirs::home_dir().ok_or(ClientError::NoHome)?;
    Ok(home.join(".radiod").join(SOCKET_NAME))
}

pub fn health() -> Result<Value> {
    call(Method::GetHealth, None)
}

pub fn list_radios() -> Result<Value> {
    call(Method::ListRadios, None)
}

pub fn get_state(radio: RadioKind) -> Result<Value> {
    call(Method::GetState, Some(json!({ "radio": radio })))
}

pub fn get_tri_state(radio: RadioKind) -> Result<Value> {
    call(Method::GetTriState, Some(json!({ "radio": radio })))
}

pub fn toggle(radio: RadioKind) -> Result<Value> {
    call(Method::Toggle, Some(json!({ "radio": radio })))
}

pub fn send_event(event: &HardwareEvent) -> Result<Value> {
    call(Method::Event, Some(serde_json::to_value(event)?))
}

/// Sends one request and unwraps the daemon's `data`. Connection failures
/// are retried once after a short delay.
fn call(method: Method, params: Option<Value>) -> Result<Value> {
    let id = make_request_id();
    let build = || Request::new(method, Some(id.clone()), params.clone());

    let response = match send_request(build()) {
        Err(err @ ClientError::Connect { .. }) => {
            tracing::warn!(error = %err, "radiod unreachable; retrying once");
            std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS));
            send_request(build())?
        }
        other => other?,
    };

    into_data(response)
}

fn into_data(response: Response) -> Result<Value> {
    if response.ok {
        return Ok(response.data.unwrap_or(Value::Null));
    }
    let (code, message) = response
        .error
        .map(|err| (err.code, err.message))
        .unwrap_or_else(|| ("unknown".to_string(), "Unknown daemon error".to_string()));
    Err(ClientError::Daemon { code, message })
}

fn make_request_id() -> String {
    format!(
        "radioctl-{}-{}",
        std::process::id(),
        Utc::now().timestamp_millis()
    )
}

fn send_request(request: Request) -> Result<Response> {
    let socket = socket_path()?;
    let mut stream = UnixStream::connect(&socket).map_err(|source| ClientError::Connect {
        path: socket.clone(),
        source,
    })?;
    let _ = stream.set_read_timeout(Some(Duration::from_millis(READ_TIMEOUT_MS)));
    let _ = stream.set_write_timeout(Some(Duration::from_millis(WRITE_TIMEOUT_MS)));

    tracing::debug!(method = ?request.method, id = ?request.id, "Sending radiod request");
    serde_json::to_writer(&mut stream, &request)?;
    stream.write_all(b"\n")?;
    stream.flush().ok();

    read_response(&mut stream)
}

fn read_response(stream: &mut UnixStream) -> Result<Response> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                if buffer.len() > MAX_REQUEST_BYTES {
                    return Err(ClientError::ResponseTooLarge);
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
                return Err(ClientError::Timeout);
            }
            Err(err) => return Err(err.into()),
        }
    }

    let response_bytes = match buffer.iter().position(|b| *b == b'\n') {
        Some(index) => &buffer[..index],
        None => buffer.as_slice(),
    };

    if response_bytes.is_empty() {
        return Err(ClientError::EmptyResponse);
    }

    Ok(serde_json::from_slice(response_bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::thread;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    struct EnvGuard {
        key: &'static str,
        prior: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prior = std::env::var(key).ok();
            std::env::set_var(key, value);
            Self { key, prior }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.prior {
                std::env::set_var(self.key, value);
            } else {
                std::env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_request(stream: &mut UnixStream) -> Request {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..n]);
            if buffer.contains(&b'\n') {
                break;
            }
        }
        let end = buffer.iter().position(|b| *b == b'\n').unwrap_or(buffer.len());
        serde_json::from_slice(&buffer[..end]).unwrap()
    }

    /// Serves exactly one connection with the given response.
    fn serve_once(
        listener: UnixListener,
        response: Response,
    ) -> thread::JoinHandle<Request> {
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let mut payload = serde_json::to_vec(&response).unwrap();
            payload.push(b'\n');
            stream.write_all(&payload).unwrap();
            request
        })
    }

    #[test]
    fn toggle_sends_radio_params_and_returns_data() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radiod.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let _socket = EnvGuard::set(SOCKET_ENV, path.to_str().unwrap());

        let server = serve_once(
            listener,
            Response::ok(None, json!({ "radio": "bluetooth", "state": "turning_on" })),
        );

        let data = toggle(RadioKind::Bluetooth).unwrap();
        let request = server.join().unwrap();

        assert_eq!(request.method, Method::Toggle);
        assert_eq!(request.params, Some(json!({ "radio": "bluetooth" })));
        assert!(request.id.unwrap().starts_with("radioctl-"));
        assert_eq!(data["state"], "turning_on");
    }

    #[test]
    fn daemon_errors_surface_code_and_message() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radiod.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let _socket = EnvGuard::set(SOCKET_ENV, path.to_str().unwrap());

        let server = serve_once(
            listener,
            Response::error(None, "unknown_radio", "unknown radio kind: nfc"),
        );

        let err = get_state(RadioKind::Wifi).unwrap_err();
        server.join().unwrap();

        match err {
            ClientError::Daemon { code, message } => {
                assert_eq!(code, "unknown_radio");
                assert!(message.contains("nfc"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn events_are_sent_as_tagged_payloads() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radiod.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let _socket = EnvGuard::set(SOCKET_ENV, path.to_str().unwrap());

        let server = serve_once(listener, Response::ok(None, json!({ "accepted": true })));

        send_event(&HardwareEvent::MediaShared { shared: true }).unwrap();
        let request = server.join().unwrap();

        assert_eq!(request.method, Method::Event);
        assert_eq!(
            request.params,
            Some(json!({ "action": "media_shared", "shared": true }))
        );
    }

    #[test]
    fn missing_daemon_is_a_connect_error() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.sock");
        let _socket = EnvGuard::set(SOCKET_ENV, path.to_str().unwrap());

        assert!(matches!(health(), Err(ClientError::Connect { .. })));
    }
}
