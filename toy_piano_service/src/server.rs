// HTTP server loop for the counterpoint service.
//
// A single background thread owns the `tiny_http::Server` and the oracle.
// It polls with `recv_timeout` so it can notice the `keep_running` flag
// (cleared by `ServiceHandle::stop`) between requests. Requests are served
// one at a time; every request builds its own supply and composition, so
// nothing but the oracle carries over from one request to the next.
//
// Routing:
//   GET /toy_piano_counterpoint?...   the counterpoint endpoint
//   any other method on that path     405
//   any other path                    404
//
// Every response is JSON with `Access-Control-Allow-Origin: *`. Failures
// are `{"error": "..."}` with the status from `ServiceError::status_code`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, error, info};

use toy_piano_compose::oracle::Oracle;

use crate::counterpoint::toy_piano_counterpoint;
use crate::error::ServiceError;
use crate::request::CounterpointRequest;

/// Path of the counterpoint endpoint.
pub const COUNTERPOINT_PATH: &str = "/toy_piano_counterpoint";

/// How long the loop blocks waiting for a request before rechecking
/// `keep_running`.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Handle returned by `start_service` to control the running server.
pub struct ServiceHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServiceHandle {
    /// Signal the server to stop and wait for it to shut down.
    pub fn stop(mut self) {
        self.keep_running.store(false, Ordering::SeqCst);
        self.join();
    }

    /// Block until the server thread exits on its own.
    pub fn wait(mut self) {
        self.join();
    }

    fn join(&mut self) {
        if let Some(Err(_)) = self.thread.take().map(|handle| handle.join()) {
            error!("server thread panicked");
        }
    }
}

/// Where to listen.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5002,
        }
    }
}

/// Start the service on a background thread. Returns a handle for stopping
/// it and the actual bound address (port 0 lets the OS pick a free port).
pub fn start_service(
    config: ServiceConfig,
    oracle: Box<dyn Oracle + Send>,
) -> Result<(ServiceHandle, SocketAddr), ServiceError> {
    let addr = format!("{}:{}", config.host, config.port);
    let server = Server::http(&addr).map_err(|e| ServiceError::Bind {
        addr: addr.clone(),
        reason: e.to_string(),
    })?;
    let bound = server.server_addr().to_ip().ok_or_else(|| ServiceError::Bind {
        addr: addr.clone(),
        reason: "listener is not an IP socket".into(),
    })?;
    info!(%bound, backend = oracle.name(), "toy piano service listening");

    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();
    let thread = thread::spawn(move || {
        run_service(server, oracle, keep_running_clone);
    });

    Ok((
        ServiceHandle {
            keep_running,
            thread: Some(thread),
        },
        bound,
    ))
}

/// Main loop. Runs until `keep_running` is cleared or the listener fails.
fn run_service(server: Server, mut oracle: Box<dyn Oracle + Send>, keep_running: Arc<AtomicBool>) {
    while keep_running.load(Ordering::SeqCst) {
        match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => handle_request(request, oracle.as_mut()),
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "listener failed");
                break;
            }
        }
    }
    info!("toy piano service stopped");
}

fn handle_request(request: Request, oracle: &mut dyn Oracle) {
    let (status, body) = route(request.method(), request.url(), oracle);
    info!(status, method = %request.method(), url = request.url(), "served request");

    let mut response = Response::from_string(body).with_status_code(status);
    for (name, value) in [
        ("Content-Type", "application/json"),
        ("Access-Control-Allow-Origin", "*"),
    ] {
        if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            response.add_header(header);
        }
    }
    if let Err(e) = request.respond(response) {
        debug!(error = %e, "client went away before the response was written");
    }
}

/// Status and JSON body for one request.
pub fn route(method: &Method, url: &str, oracle: &mut dyn Oracle) -> (u16, String) {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    if path != COUNTERPOINT_PATH {
        return (404, error_body(&format!("no route for {path}")));
    }
    if *method != Method::Get {
        return (405, error_body(&format!("method {method} not allowed")));
    }

    let result = CounterpointRequest::from_query(query)
        .map_err(ServiceError::from)
        .and_then(|request| toy_piano_counterpoint(&request, oracle))
        .and_then(|response| serde_json::to_string(&response).map_err(ServiceError::from));
    match result {
        Ok(body) => (200, body),
        Err(e) => {
            if e.status_code() >= 500 {
                error!(error = %e, "counterpoint request failed");
            }
            (e.status_code(), error_body(&e.to_string()))
        }
    }
}

fn error_body(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use toy_piano_compose::oracle::SeededOracle;

    const QUERY: &str = "pitch_index=2&species=2&melodic_degrees=0,0,0,0,0,0&harmonic_degrees=1,1,1,1,1,1";

    #[test]
    fn test_route_success() {
        let mut oracle = SeededOracle::new(3);
        let (status, body) = route(&Method::Get, &format!("{COUNTERPOINT_PATH}?{QUERY}"), &mut oracle);
        assert_eq!(status, 200);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["melody"].as_array().unwrap().len(), 7);
        assert_eq!(json["harmony"].as_array().unwrap().len(), 14);
    }

    #[test]
    fn test_route_unknown_path() {
        let mut oracle = SeededOracle::new(3);
        let (status, body) = route(&Method::Get, "/nope", &mut oracle);
        assert_eq!(status, 404);
        assert!(body.contains("\"error\""));
    }

    #[test]
    fn test_route_wrong_method() {
        let mut oracle = SeededOracle::new(3);
        let (status, _) = route(&Method::Post, COUNTERPOINT_PATH, &mut oracle);
        assert_eq!(status, 405);
    }

    #[test]
    fn test_route_bad_request() {
        let mut oracle = SeededOracle::new(3);
        let (status, body) = route(
            &Method::Get,
            &format!("{COUNTERPOINT_PATH}?pitch_index=1&species=9&melodic_degrees=0,0,0,0,0,0"),
            &mut oracle,
        );
        assert_eq!(status, 400);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "species must be between 0 and 3, got 9");
    }

    #[test]
    fn test_route_missing_query() {
        let mut oracle = SeededOracle::new(3);
        let (status, _) = route(&Method::Get, COUNTERPOINT_PATH, &mut oracle);
        assert_eq!(status, 400);
    }
}
