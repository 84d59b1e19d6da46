//! # Descarga de páginas
//! src/wordcount/fetch.rs

use super::WordCountError;
use regex::Regex;
use reqwest::blocking::Client;
use std::sync::LazyLock;
use std::time::Duration;

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]+://").expect("hard-coded pattern is valid"));

/// Antepone `http://` si la URL no trae esquema
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if SCHEME_RE.is_match(url) {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

/// Cliente HTTP bloqueante con timeout total por request
pub fn build_client(timeout: Duration) -> Result<Client, WordCountError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("wordcount_server/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(WordCountError::Client)
}

/// Descarga `url` y retorna el body como texto UTF-8
///
/// Cualquier status fuera de 2xx es un error.
pub fn fetch_page(client: &Client, url: &str) -> Result<String, WordCountError> {
    let response = client.get(url).send().map_err(|source| WordCountError::Request {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(WordCountError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().map_err(|source| WordCountError::Request {
        url: url.to_string(),
        source,
    })?;

    String::from_utf8(bytes.to_vec()).map_err(|source| WordCountError::Decode {
        url: url.to_string(),
        source,
    })
}
