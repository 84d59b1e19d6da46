//! # Errores del Servidor
//! src/error.rs
//!
//! Tipos de error compartidos por el motor de jobs, el almacén y el
//! arranque del servidor. Los errores propios del workload de conteo viven
//! en `wordcount`, y los de parsing HTTP en `http::request`.

use crate::jobs::token::Token;
use crate::wordcount::WordCountError;
use thiserror::Error;

/// Errores del motor de jobs
#[derive(Debug, Error)]
pub enum EngineError {
    /// El motor ya fue detenido y no acepta más trabajo
    #[error("job engine is shut down")]
    ShutDown,

    /// No se pudo lanzar un thread del pool
    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        role: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Errores al escribir en el almacén de jobs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("job not found: {0}")]
    NotFound(Token),

    /// El resultado de un job se escribe una sola vez
    #[error("job already finished: {0}")]
    AlreadyFinished(Token),
}

/// Errores de validación de la configuración
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("workers must be >= 1")]
    InvalidWorkers,

    #[error("fetch timeout must be > 0")]
    InvalidFetchTimeout,

    #[error("base path must be empty or start with '/' and not end with '/': {0:?}")]
    InvalidBasePath(String),
}

/// Errores fatales durante el arranque o la ejecución del servidor
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to build workload: {0}")]
    Workload(#[from] WordCountError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
