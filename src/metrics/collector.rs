//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Recolecta métricas de requests HTTP en tiempo real: totales, códigos de
//! estado, requests por ruta y percentiles de latencia sobre una ventana de
//! las últimas muestras.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Tamaño de la ventana de latencias
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Collector de métricas thread-safe
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
}

#[derive(Default)]
struct MetricsData {
    total_requests: u64,

    status_codes: HashMap<u16, u64>,

    /// Últimas latencias en microsegundos
    latencies: VecDeque<u64>,

    /// Requests por etiqueta de ruta (no por path crudo)
    requests_per_route: HashMap<String, u64>,

    active_connections: u64,
}

/// Snapshot de métricas (para uso externo)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub active_connections: u64,
    pub uptime_secs: u64,
    pub latency_p50_us: u64,
    pub latency_p95_us: u64,
    pub latency_p99_us: u64,
    pub latency_avg_us: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData::default())),
            start_time: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registra un request atendido
    pub fn record_request(&self, route: &str, status_code: u16, latency: Duration) {
        let mut data = self.lock();

        data.total_requests += 1;
        *data.status_codes.entry(status_code).or_insert(0) += 1;
        *data.requests_per_route.entry(route.to_string()).or_insert(0) += 1;

        if data.latencies.len() >= MAX_LATENCY_SAMPLES {
            data.latencies.pop_front();
        }
        data.latencies
            .push_back(u64::try_from(latency.as_micros()).unwrap_or(u64::MAX));
    }

    pub fn connection_opened(&self) {
        self.lock().active_connections += 1;
    }

    pub fn connection_closed(&self) {
        let mut data = self.lock();
        data.active_connections = data.active_connections.saturating_sub(1);
    }

    pub fn active_connections(&self) -> u64 {
        self.lock().active_connections
    }

    /// Obtiene un snapshot de las métricas
    pub fn snapshot(&self) -> MetricsSnapshot {
        let data = self.lock();
        let (p50, p95, p99, avg) = percentiles(&data.latencies);

        MetricsSnapshot {
            total_requests: data.total_requests,
            active_connections: data.active_connections,
            uptime_secs: self.start_time.elapsed().as_secs(),
            latency_p50_us: p50,
            latency_p95_us: p95,
            latency_p99_us: p99,
            latency_avg_us: avg,
        }
    }

    /// Métricas completas en JSON
    pub fn to_json(&self) -> Value {
        let snapshot = self.snapshot();
        let data = self.lock();

        let status_codes: HashMap<String, u64> = data
            .status_codes
            .iter()
            .map(|(code, count)| (code.to_string(), *count))
            .collect();

        let mut routes: Vec<_> = data.requests_per_route.iter().collect();
        routes.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let top_routes: Vec<Value> = routes
            .iter()
            .take(10)
            .map(|(route, count)| json!({ "route": route, "count": count }))
            .collect();

        json!({
            "server": {
                "uptime_seconds": snapshot.uptime_secs,
            },
            "requests": {
                "total": snapshot.total_requests,
                "active_connections": snapshot.active_connections,
                "status_codes": status_codes,
                "top_routes": top_routes,
            },
            "latency_us": {
                "p50": snapshot.latency_p50_us,
                "p95": snapshot.latency_p95_us,
                "p99": snapshot.latency_p99_us,
                "avg": snapshot.latency_avg_us,
                "stddev": stddev(&data.latencies, snapshot.latency_avg_us),
                "samples": data.latencies.len(),
            },
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// (p50, p95, p99, promedio)
fn percentiles(latencies: &VecDeque<u64>) -> (u64, u64, u64, u64) {
    if latencies.is_empty() {
        return (0, 0, 0, 0);
    }

    let mut sorted: Vec<u64> = latencies.iter().copied().collect();
    sorted.sort_unstable();

    let len = sorted.len();
    let at = |pct: usize| sorted[(len * pct / 100).min(len - 1)];
    let avg = sorted.iter().sum::<u64>() / len as u64;

    (at(50), at(95), at(99), avg)
}

fn stddev(latencies: &VecDeque<u64>, avg: u64) -> f64 {
    if latencies.is_empty() {
        return 0.0;
    }

    let variance = latencies
        .iter()
        .map(|&x| {
            let diff = x as f64 - avg as f64;
            diff * diff
        })
        .sum::<f64>()
        / latencies.len() as f64;

    variance.sqrt()
}
