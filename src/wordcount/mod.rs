//! # Conteo de palabras en páginas web
//! src/wordcount/mod.rs
//!
//! Workload que descarga una URL y cuenta sus palabras con varias
//! heurísticas. El conteo reportado es el mínimo entre ellas.
//!
//! ```json
//! {
//!   "count": 6,
//!   "counts_by_heuristic": [
//!     {"heuristic": "data_segments", "count": 17},
//!     {"heuristic": "visible_text", "count": 8},
//!     {"heuristic": "rendered_body", "count": 6}
//!   ]
//! }
//! ```

pub mod fetch;
pub mod heuristics;

use crate::jobs::workload::Workload;
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub use fetch::normalize_url;

/// Errores al descargar una página
#[derive(Debug, Error)]
pub enum WordCountError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Error de red, DNS o timeout
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("body of {url} is not valid UTF-8")]
    Decode {
        url: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Conteo de una heurística
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeuristicCount {
    pub heuristic: &'static str,
    pub count: usize,
}

/// Resultado de contar las palabras de una página
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCountReport {
    /// Mínimo entre las heurísticas
    pub count: usize,

    pub counts_by_heuristic: Vec<HeuristicCount>,
}

impl WordCountReport {
    /// Aplica todas las heurísticas a un documento
    pub fn analyze(html: &str) -> Self {
        let counts_by_heuristic: Vec<HeuristicCount> = heuristics::HEURISTICS
            .iter()
            .map(|&(heuristic, count)| HeuristicCount {
                heuristic,
                count: count(html),
            })
            .collect();

        let count = counts_by_heuristic
            .iter()
            .map(|c| c.count)
            .min()
            .unwrap_or(0);

        Self {
            count,
            counts_by_heuristic,
        }
    }
}

/// Workload: URL → `WordCountReport`
#[derive(Clone)]
pub struct WordCountWorkload {
    client: Client,
}

impl WordCountWorkload {
    /// Crea el workload con un timeout total por descarga
    pub fn new(timeout: Duration) -> Result<Self, WordCountError> {
        Ok(Self::with_client(fetch::build_client(timeout)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Descarga `url` (anteponiendo `http://` si hace falta) y cuenta
    pub fn count_url(&self, url: &str) -> Result<WordCountReport, WordCountError> {
        let url = normalize_url(url);
        let body = fetch::fetch_page(&self.client, &url)?;
        let report = WordCountReport::analyze(&body);

        info!(
            %url,
            count = report.count,
            counts = ?report.counts_by_heuristic,
            "counted words"
        );

        Ok(report)
    }
}

impl Workload for WordCountWorkload {
    type Payload = String;
    type Output = WordCountReport;
    type Error = WordCountError;

    fn run(&self, url: String) -> Result<WordCountReport, WordCountError> {
        self.count_url(&url)
    }
}
