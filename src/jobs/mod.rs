//! # Sistema de Jobs
//! src/jobs/mod.rs
//!
//! Motor genérico de jobs asíncronos: el cliente envía un payload, recibe
//! un token de inmediato y consulta el resultado más tarde. Un pool fijo
//! de workers consume una cola FIFO y escribe resultados en un almacén
//! compartido.
//!
//! ## Endpoints
//!
//! - `GET|PUT {base}/url/<target>` - Encolar job
//! - `GET {base}/count/<token>[?debug=true]` - Consultar resultado

pub mod handlers;
pub mod manager;
pub mod queue;
pub mod storage;
pub mod token;
pub mod types;
pub mod workload;

pub use manager::{EngineConfig, JobEngine};
pub use queue::{JobQueue, QueueClosed};
pub use storage::JobStore;
pub use token::Token;
pub use types::{EngineStats, JobPoll, JobRecord, JobResult, JobStatus};
pub use workload::{FnWorkload, Workload};
