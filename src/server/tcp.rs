//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Servidor HTTP/1.0 que atiende cada conexión en su propio thread. Las
//! rutas de la API delegan en el motor de jobs, que es compartido entre
//! todos los threads vía `Arc`.

use crate::config::Config;
use crate::http::{Method, Request, Response, StatusCode};
use crate::jobs::handlers::{count_handler, submit_handler};
use crate::jobs::manager::JobEngine;
use crate::jobs::workload::Workload;
use crate::metrics::MetricsCollector;
use crate::router::Router;
use serde::Serialize;
use serde_json::json;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

/// Valor del header `Server`
pub const SERVER_NAME: &str = concat!("wordcount_server/", env!("CARGO_PKG_VERSION"));

/// Tamaño máximo de un request (línea + headers)
const MAX_REQUEST_BYTES: usize = 8192;

/// Tiempo máximo esperando a que el cliente envíe el request
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Etiqueta de métricas para requests que no se pudieron parsear
const INVALID_REQUEST_ROUTE: &str = "invalid";

/// Servidor HTTP/1.0 concurrente con métricas
pub struct Server<W: Workload> {
    config: Config,
    router: Arc<Router>,
    metrics: Arc<MetricsCollector>,
    engine: Arc<JobEngine<W>>,
}

impl<W> Server<W>
where
    W: Workload<Payload = String>,
    W::Output: Serialize,
{
    pub fn new(config: Config, engine: Arc<JobEngine<W>>) -> Self {
        let metrics = Arc::new(MetricsCollector::new());
        let router = build_router(&config.base_path, &engine, &metrics);

        Self {
            config,
            router: Arc::new(router),
            metrics,
            engine,
        }
    }

    /// Abre el socket en `config.address()` y atiende conexiones
    pub fn run(&self) -> io::Result<()> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address)?;
        info!(%address, "server listening");

        self.serve(listener)
    }

    /// Atiende conexiones de un listener ya abierto
    ///
    /// Sólo retorna si el listener deja de entregar conexiones; no hay
    /// señal de parada.
    pub fn serve(&self, listener: TcpListener) -> io::Result<()> {
        if let Ok(address) = listener.local_addr() {
            debug!(%address, "accepting connections (one thread per connection)");
        }

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => self.spawn_connection(stream),
                Err(e) => warn!(error = %e, "failed to accept connection"),
            }
        }

        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream) {
        let router = Arc::clone(&self.router);
        let metrics = Arc::clone(&self.metrics);

        metrics.connection_opened();

        let spawned = thread::Builder::new()
            .name("http-conn".to_string())
            .spawn({
                let metrics = Arc::clone(&metrics);
                move || {
                    if let Err(e) = handle_connection(stream, &router, &metrics) {
                        warn!(error = %e, "connection error");
                    }
                    metrics.connection_closed();
                }
            });

        if let Err(e) = spawned {
            error!(error = %e, "failed to spawn connection thread");
            metrics.connection_closed();
        }
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn engine(&self) -> &Arc<JobEngine<W>> {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Registra las rutas de la API y `/metrics`
fn build_router<W>(
    base_path: &str,
    engine: &Arc<JobEngine<W>>,
    metrics: &Arc<MetricsCollector>,
) -> Router
where
    W: Workload<Payload = String>,
    W::Output: Serialize,
{
    let mut router = Router::new(SERVER_NAME);

    let submit_engine = Arc::clone(engine);
    router.prefix(
        &[Method::GET, Method::PUT],
        &format!("{}/url/", base_path),
        move |_req, target| submit_handler(target, &submit_engine),
    );

    let count_engine = Arc::clone(engine);
    router.prefix(
        &[Method::GET],
        &format!("{}/count/", base_path),
        move |req, token| count_handler(req, token, &count_engine),
    );

    let stats_engine = Arc::clone(engine);
    let metrics = Arc::clone(metrics);
    router.exact(&[Method::GET], "/metrics", move |_req, _| {
        Response::json(&json!({
            "http": metrics.to_json(),
            "jobs": stats_engine.stats(),
        }))
    });

    router
}

/// Procesa un único request y cierra la conexión
fn handle_connection(
    mut stream: TcpStream,
    router: &Router,
    metrics: &MetricsCollector,
) -> io::Result<()> {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let span = info_span!("request", id = %request_id, %peer);
    let _guard = span.enter();

    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let raw = read_request(&mut stream)?;

    if raw.is_empty() {
        debug!("connection closed without data");
        return Ok(());
    }

    let (mut response, route) = match Request::parse(&raw) {
        Ok(request) => {
            debug!(method = request.method().as_str(), path = request.path(), "request received");
            let (response, route) = router.route(&request);
            (response, route.to_string())
        }
        Err(e) => {
            warn!(error = %e, "invalid request");
            let mut response =
                Response::error(StatusCode::BadRequest, &format!("Invalid request: {}", e));
            router.add_common_headers(&mut response);
            (response, INVALID_REQUEST_ROUTE.to_string())
        }
    };

    response.add_header("X-Request-Id", &request_id);

    stream.write_all(&response.to_bytes())?;
    stream.flush()?;

    let latency = start.elapsed();
    metrics.record_request(&route, response.status().as_u16(), latency);

    info!(
        %route,
        status = response.status().as_u16(),
        latency_ms = latency.as_secs_f64() * 1000.0,
        "request served"
    );

    Ok(())
}

/// Lee hasta el fin de los headers, EOF o `MAX_REQUEST_BYTES`
fn read_request(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut raw = Vec::new();
    let mut buffer = [0u8; 1024];

    while raw.len() < MAX_REQUEST_BYTES {
        let n = stream.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buffer[..n]);
        if raw.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    raw.truncate(MAX_REQUEST_BYTES);
    Ok(raw)
}
