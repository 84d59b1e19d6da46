//! # Motor de Jobs
//! src/jobs/manager.rs
//!
//! Coordina la ejecución de jobs: emisión de tokens, encolado, pool de
//! workers y consulta de resultados.
//!
//! ```text
//! submit ──► JobStore::reserve ──► JobQueue::enqueue ──► token
//!                                        │
//!                          worker-N ◄────┘ dequeue (bloquea)
//!                             │
//!                             └─► Workload::run ──► JobStore::write_result
//! query ──► JobStore::get ──► NotFound | Pending | Ready
//! ```

use crate::config::Config;
use crate::error::EngineError;
use crate::jobs::queue::{JobQueue, QueueClosed};
use crate::jobs::storage::JobStore;
use crate::jobs::token::Token;
use crate::jobs::types::{EngineStats, JobPoll, JobResult};
use crate::jobs::workload::Workload;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Configuración del motor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Número de workers del pool
    pub workers: usize,

    /// Edad máxima de un job terminado antes de purgarlo (`None` = nunca)
    pub retention: Option<Duration>,

    /// Cada cuánto revisa el janitor
    pub sweep_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            retention: None,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    /// Crea una configuración desde el Config principal
    pub fn from_config(config: &Config) -> Self {
        let retention = (config.job_retention_secs > 0)
            .then(|| Duration::from_secs(config.job_retention_secs));

        Self {
            workers: config.workers,
            retention,
            sweep_interval: retention
                .map(|age| age.min(Duration::from_secs(60)))
                .unwrap_or(Duration::from_secs(60)),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

/// Entrada de la cola
struct QueuedJob<P> {
    token: Token,
    payload: P,
}

/// Contadores de resultados
#[derive(Default)]
struct JobCounters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
}

/// Motor de jobs asíncronos con un pool fijo de workers
pub struct JobEngine<W: Workload> {
    config: EngineConfig,
    workload: Arc<W>,
    store: JobStore<W::Payload, W::Output>,
    queue: JobQueue<QueuedJob<W::Payload>>,
    counters: Arc<JobCounters>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    janitor: Mutex<Option<(Sender<()>, JoinHandle<()>)>>,
}

impl<W: Workload> JobEngine<W> {
    /// Crea el motor e inicia los workers
    pub fn new(workload: W, config: EngineConfig) -> Result<Self, EngineError> {
        let mut config = config;
        if config.workers == 0 {
            warn!("worker count of 0 requested, using 1");
            config.workers = 1;
        }

        let engine = Self {
            config,
            workload: Arc::new(workload),
            store: JobStore::new(),
            queue: JobQueue::new(),
            counters: Arc::new(JobCounters::default()),
            workers: Mutex::new(Vec::new()),
            janitor: Mutex::new(None),
        };

        // Si algo falla aquí, Drop cierra la cola y une los threads ya lanzados
        engine.spawn_workers()?;
        engine.spawn_janitor()?;

        info!(
            workers = engine.config.workers,
            retention_secs = engine.config.retention.map(|r| r.as_secs()),
            "job engine started"
        );

        Ok(engine)
    }

    /// Inicia los workers para procesar jobs
    fn spawn_workers(&self) -> Result<(), EngineError> {
        for i in 0..self.config.workers {
            let name = format!("job-worker-{}", i);
            let queue = self.queue.clone();
            let store = self.store.clone();
            let workload = Arc::clone(&self.workload);
            let counters = Arc::clone(&self.counters);

            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || Self::worker_loop(name, queue, store, workload, counters))
                .map_err(|source| EngineError::Spawn {
                    role: "worker",
                    source,
                })?;

            self.workers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(handle);
        }

        Ok(())
    }

    /// Inicia el janitor si hay política de retención
    fn spawn_janitor(&self) -> Result<(), EngineError> {
        let Some(max_age) = self.config.retention else {
            return Ok(());
        };

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let store = self.store.clone();
        let interval = self.config.sweep_interval;

        let handle = thread::Builder::new()
            .name("job-janitor".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let evicted = store.evict_finished_older_than(max_age);
                        if evicted > 0 {
                            info!(evicted, "evicted finished jobs");
                        }
                    }
                    // Sender soltado (o mensaje explícito): detenerse
                    _ => break,
                }
            })
            .map_err(|source| EngineError::Spawn {
                role: "janitor",
                source,
            })?;

        *self.janitor.lock().unwrap_or_else(PoisonError::into_inner) = Some((stop_tx, handle));
        Ok(())
    }

    /// Loop principal del worker
    ///
    /// Termina sólo cuando la cola se cierra y queda vacía. Ningún fallo de
    /// un job individual lo detiene.
    fn worker_loop(
        name: String,
        queue: JobQueue<QueuedJob<W::Payload>>,
        store: JobStore<W::Payload, W::Output>,
        workload: Arc<W>,
        counters: Arc<JobCounters>,
    ) {
        debug!(worker = %name, "worker ready");

        while let Some(QueuedJob { token, payload }) = queue.dequeue() {
            debug!(worker = %name, %token, remaining = queue.len(), "picked up job");

            // Cubre ejecución, descripción del error y escritura del resultado
            let processed = panic::catch_unwind(AssertUnwindSafe(|| {
                let result = Self::execute_job(&name, &token, workload.as_ref(), payload, &counters);
                if let Err(e) = store.write_result(&token, result) {
                    error!(worker = %name, %token, error = %e, "failed to store job result");
                }
            }));

            if let Err(panic) = processed {
                let message = panic_message(panic.as_ref());
                counters.panicked.fetch_add(1, Ordering::Relaxed);
                error!(worker = %name, %token, panic = %message, "internal fault while processing job");

                // El token debe llegar a Ready aunque el fallo fuera nuestro
                let fault = JobResult::Failed(format!("internal fault: {}", message));
                if let Err(e) = store.write_result(&token, fault) {
                    debug!(worker = %name, %token, error = %e, "fault result not stored");
                }
            }
        }

        debug!(worker = %name, "worker stopped");
    }

    /// Ejecuta un job, convirtiendo errores y panics en un resultado terminal
    fn execute_job(
        worker: &str,
        token: &Token,
        workload: &W,
        payload: W::Payload,
        counters: &JobCounters,
    ) -> JobResult<W::Output> {
        match panic::catch_unwind(AssertUnwindSafe(|| workload.run(payload))) {
            Ok(Ok(output)) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
                info!(worker, %token, "job completed");
                JobResult::Completed(output)
            }
            Ok(Err(err)) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                let description = err.to_string();
                warn!(worker, %token, error = %description, "job failed");
                JobResult::Failed(description)
            }
            Err(panic) => {
                counters.panicked.fetch_add(1, Ordering::Relaxed);
                let message = panic_message(panic.as_ref());
                error!(worker, %token, panic = %message, "workload panicked");
                JobResult::Failed(format!("workload panicked: {}", message))
            }
        }
    }

    /// Encola un nuevo job y retorna su token
    ///
    /// No bloquea. El registro existe en el almacén antes de que el job sea
    /// visible para los workers.
    pub fn submit(&self, payload: W::Payload) -> Result<Token, EngineError> {
        if self.queue.is_closed() {
            return Err(EngineError::ShutDown);
        }

        let token = self.store.reserve(payload.clone());

        let job = QueuedJob {
            token: token.clone(),
            payload,
        };

        if let Err(QueueClosed(job)) = self.queue.enqueue(job) {
            // Carrera con shutdown: el token nunca llegó al cliente
            self.store.remove(&job.token);
            return Err(EngineError::ShutDown);
        }

        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        debug!(%token, queued = self.queue.len(), "job enqueued");

        Ok(token)
    }

    /// Consulta el estado de un job
    ///
    /// Nunca bloquea más allá de la contención del mutex del almacén.
    /// Con `debug` se incluye el registro completo (o parcial si está
    /// pendiente).
    pub fn query(&self, token: &Token, debug: bool) -> JobPoll<W::Payload, W::Output> {
        let Some(record) = self.store.get(token) else {
            return JobPoll::NotFound;
        };

        match record.result.clone() {
            None => JobPoll::Pending {
                partial: debug.then_some(record),
            },
            Some(result) => JobPoll::Ready {
                result,
                record: debug.then_some(record),
            },
        }
    }

    /// Obtiene estadísticas del motor
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            workers: self.config.workers,
            queued: self.queue.len(),
            stored_jobs: self.store.len(),
            pending_jobs: self.store.pending_count(),
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            panicked: self.counters.panicked.load(Ordering::Relaxed),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_shut_down(&self) -> bool {
        self.queue.is_closed()
    }

    /// Detiene el motor
    ///
    /// Cierra la cola, deja que los workers terminen los jobs ya encolados
    /// y espera a que salgan. Llamarlo más de una vez no tiene efecto.
    pub fn shutdown(&self) {
        self.queue.close();

        let janitor = self
            .janitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some((stop_tx, handle)) = janitor {
            drop(stop_tx);
            if handle.join().is_err() {
                error!("janitor thread panicked");
            }
        }

        let workers: Vec<_> = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if workers.is_empty() {
            return;
        }

        let count = workers.len();
        for handle in workers {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }
        info!(workers = count, "job engine stopped");
    }
}

impl<W: Workload> Drop for JobEngine<W> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
