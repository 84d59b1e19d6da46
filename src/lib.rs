//! # Word Count Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 de jobs asíncronos: el cliente envía una URL, recibe
//! un token de inmediato y consulta el conteo de palabras más tarde. Un
//! pool fijo de workers descarga las páginas en segundo plano.
//!
//! ## Arquitectura
//!
//! - `http`: Parsing y construcción de mensajes HTTP/1.0
//! - `server`: Servidor TCP, un thread por conexión
//! - `router`: Enrutamiento de peticiones a handlers
//! - `jobs`: Motor genérico de jobs (tokens, cola, pool, almacén)
//! - `wordcount`: Workload que descarga y cuenta palabras
//! - `metrics`: Métricas de requests
//! - `config` / `error`: Configuración CLI y tipos de error
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use std::sync::Arc;
//! use wordcount_server::config::Config;
//! use wordcount_server::jobs::{EngineConfig, JobEngine};
//! use wordcount_server::server::Server;
//! use wordcount_server::wordcount::WordCountWorkload;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let workload = WordCountWorkload::new(config.fetch_timeout())?;
//! let engine = Arc::new(JobEngine::new(workload, EngineConfig::from_config(&config))?);
//!
//! Server::new(config, engine).run()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod jobs;
pub mod metrics;
pub mod router;
pub mod server;
pub mod wordcount;
