//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI con fallback a variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./wordcount_server --port 8080 --workers 16 --fetch-timeout-ms 3000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 HTTP_HOST=0.0.0.0 WORKERS=4 ./wordcount_server
//! ```

use crate::error::ConfigError;
use clap::Parser;
use std::time::Duration;
use tracing::info;

/// Configuración del servidor de conteo de palabras
#[derive(Debug, Clone, Parser)]
#[command(name = "wordcount_server")]
#[command(about = "Servidor HTTP/1.0 de jobs asíncronos para contar palabras en páginas web")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Número de workers del pool
    #[arg(short, long, default_value = "10", env = "WORKERS")]
    pub workers: usize,

    /// Timeout para descargar una página, en milisegundos
    #[arg(long = "fetch-timeout-ms", default_value = "5000", env = "FETCH_TIMEOUT_MS")]
    pub fetch_timeout_ms: u64,

    /// Prefijo de las rutas de la API ("" para montarlas en la raíz)
    #[arg(long = "base-path", default_value = "/api", env = "BASE_PATH")]
    pub base_path: String,

    /// Segundos que se conserva un job terminado (0 = para siempre)
    #[arg(long = "job-retention-secs", default_value = "0", env = "JOB_RETENTION_SECS")]
    pub job_retention_secs: u64,

    /// Filtro de logs (sintaxis de `EnvFilter`)
    #[arg(long = "log-filter", default_value = "wordcount_server=info", env = "RUST_LOG")]
    pub log_filter: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use wordcount_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }

        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::InvalidFetchTimeout);
        }

        // "" o "/algo" sin "/" final
        let base = &self.base_path;
        if !base.is_empty() && (!base.starts_with('/') || base.ends_with('/')) {
            return Err(ConfigError::InvalidBasePath(base.clone()));
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn log_summary(&self) {
        info!(
            address = %self.address(),
            workers = self.workers,
            fetch_timeout_ms = self.fetch_timeout_ms,
            base_path = %self.base_path,
            job_retention_secs = self.job_retention_secs,
            "server configuration"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            workers: 10,
            fetch_timeout_ms: 5_000,
            base_path: "/api".to_string(),
            job_retention_secs: 0,
            log_filter: "wordcount_server=info".to_string(),
        }
    }
}
