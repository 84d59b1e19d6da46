//! # Tokens de Jobs
//! src/jobs/token.rs
//!
//! Identificador opaco que `submit` devuelve al cliente. Se genera a partir
//! de un UUID v4 (122 bits aleatorios) y se representa como 32 caracteres
//! hexadecimales en minúscula.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Token opaco e inmutable que identifica un job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Genera un token nuevo
    ///
    /// La unicidad frente a los tokens ya emitidos la verifica el
    /// almacén (`JobStore::reserve`) bajo su mutex.
    pub fn generate() -> Self {
        Token(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Cualquier string es un token válido para consultar: los desconocidos
// simplemente resultan en NotFound.
impl FromStr for Token {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Token(s.to_string()))
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token(s.to_string())
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Token(s)
    }
}
