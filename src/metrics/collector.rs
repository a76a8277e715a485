//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Recolecta y agrega métricas del servidor en tiempo real. Los workers
//! registran cada intercambio; el snapshot se serializa con `serde_json`.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Máximo de latencias guardadas para calcular percentiles
const MAX_LATENCIES: usize = 10_000;

/// Máximo de paths distintos contados por separado
const MAX_TRACKED_PATHS: usize = 1_000;

/// Bucket donde se acumulan los paths que exceden el límite
const OTHER_PATHS: &str = "<other>";

/// Collector de métricas thread-safe
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
}

/// Datos internos de métricas
#[derive(Debug, Default)]
struct MetricsData {
    /// Contador total de respuestas escritas
    total_requests: u64,

    /// Respuestas por código de estado
    status_codes: BTreeMap<u16, u64>,

    /// Ventana de latencias (en microsegundos)
    latencies: VecDeque<u64>,

    /// Requests por path (acotado a `MAX_TRACKED_PATHS` + `OTHER_PATHS`)
    requests_per_path: HashMap<String, u64>,

    /// Conexiones cerradas sin escribir respuesta
    dropped_connections: u64,

    /// Workers atendiendo una conexión en este momento
    active_workers: u64,
}

impl MetricsCollector {
    /// Crea un nuevo collector de métricas
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData::default())),
            start_time: Instant::now(),
        }
    }

    // Un worker que hizo panic no invalida los contadores
    fn data(&self) -> MutexGuard<'_, MetricsData> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registra una respuesta escrita
    pub fn record_request(&self, path: &str, status_code: u16, latency: Duration) {
        let mut data = self.data();

        data.total_requests += 1;
        *data.status_codes.entry(status_code).or_insert(0) += 1;

        if data.latencies.len() >= MAX_LATENCIES {
            data.latencies.pop_front();
        }
        data.latencies.push_back(latency.as_micros() as u64);

        let key = if data.requests_per_path.contains_key(path)
            || data.requests_per_path.len() < MAX_TRACKED_PATHS
        {
            path
        } else {
            OTHER_PATHS
        };
        *data.requests_per_path.entry(key.to_string()).or_insert(0) += 1;
    }

    /// Registra una conexión descartada sin respuesta
    pub fn record_dropped(&self) {
        self.data().dropped_connections += 1;
    }

    pub fn increment_active_workers(&self) {
        self.data().active_workers += 1;
    }

    pub fn decrement_active_workers(&self) {
        let mut data = self.data();
        data.active_workers = data.active_workers.saturating_sub(1);
    }

    /// Obtiene el número de workers activos
    pub fn active_workers(&self) -> u64 {
        self.data().active_workers
    }

    /// Obtiene un snapshot de las métricas
    pub fn snapshot(&self) -> MetricsSnapshot {
        let data = self.data();
        let latency = LatencySummary::from_samples(&data.latencies);

        let mut top_paths: Vec<PathCount> = data
            .requests_per_path
            .iter()
            .map(|(path, count)| PathCount {
                path: path.clone(),
                count: *count,
            })
            .collect();
        top_paths.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.path.cmp(&b.path)));
        top_paths.truncate(10);

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            total_requests: data.total_requests,
            dropped_connections: data.dropped_connections,
            active_workers: data.active_workers,
            status_codes: data.status_codes.clone(),
            top_paths,
            latency_us: latency,
        }
    }

    /// Métricas actuales en formato JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot de métricas (para uso externo)
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub dropped_connections: u64,
    pub active_workers: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub top_paths: Vec<PathCount>,
    pub latency_us: LatencySummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathCount {
    pub path: String,
    pub count: u64,
}

/// Percentiles de latencia en microsegundos
#[derive(Debug, Clone, Default, Serialize)]
pub struct LatencySummary {
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub avg: u64,
    pub max: u64,
    pub samples: usize,
}

impl LatencySummary {
    fn from_samples(latencies: &VecDeque<u64>) -> Self {
        if latencies.is_empty() {
            return Self::default();
        }

        let mut sorted: Vec<u64> = latencies.iter().copied().collect();
        sorted.sort_unstable();

        let len = sorted.len();
        let sum: u64 = sorted.iter().sum();

        Self {
            p50: sorted[len * 50 / 100],
            p95: sorted[len * 95 / 100],
            p99: sorted[len * 99 / 100],
            avg: sum / len as u64,
            max: sorted[len - 1],
            samples: len,
        }
    }
}
