//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! ## Formato de una respuesta HTTP/1.0
//!
//! ```text
//! HTTP/1.0 202 Accepted\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 45\r\n
//! X-Request-Id: 6f1c...\r\n
//! \r\n
//! {"id":"3f2a...","message":"enqueued"}
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use serde_json::json;
//! use wordcount_server::http::{Response, StatusCode};
//!
//! let response = Response::json_value(StatusCode::Accepted, &json!({"status": "pending"}));
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.0 202 Accepted\r\n"));
//! ```

use super::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Usamos HashMap para evitar duplicados
    headers: HashMap<String, String>,

    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header a la respuesta (si ya existe, se sobrescribe)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de `with_header`
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Establece el cuerpo y su `Content-Length`
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self.headers
            .insert("Content-Length".to_string(), self.body.len().to_string());
        self
    }

    /// Respuesta JSON con el status indicado
    ///
    /// Automáticamente establece `Content-Type: application/json`.
    pub fn json_value(status: StatusCode, value: &Value) -> Self {
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(&value.to_string())
    }

    /// Respuesta JSON 200 OK
    pub fn json(value: &Value) -> Self {
        Self::json_value(StatusCode::Ok, value)
    }

    /// Respuesta de error con formato `{"error": "mensaje"}`
    ///
    /// # Ejemplo
    /// ```
    /// use wordcount_server::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::NotFound, "Token not found");
    /// assert_eq!(response.body(), br#"{"error":"Token not found"}"#);
    /// ```
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::json_value(status, &json!({ "error": message }))
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// - Status line: `HTTP/1.0 200 OK\r\n`
    /// - Headers: `Header-Name: Value\r\n`
    /// - Línea vacía: `\r\n`
    /// - Body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::new();

        result.extend_from_slice(format!("HTTP/1.0 {}\r\n", self.status).as_bytes());

        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        result.extend_from_slice(b"\r\n");
        result.extend_from_slice(&self.body);

        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Interpreta el body como JSON
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}
