//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Implementación mínima de HTTP/1.0 (RFC 1945) sobre `TcpStream`:
//!
//! - Parsing de requests y query parameters
//! - Construcción de responses JSON
//! - Status codes
//!
//! Una conexión atiende un único request y se cierra.

pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
