//! # Almacén de Jobs
//! src/jobs/storage.rs
//!
//! Mapa concurrente token → registro. Es la única fuente de verdad del
//! estado de los jobs. Todas las mutaciones pasan por un único mutex y las
//! lecturas devuelven copias, nunca referencias al estado interno.
//!
//! No hay política de retención implícita: el almacén crece sin límite
//! salvo que se invoque `evict_finished_older_than`.

use crate::error::StoreError;
use crate::jobs::token::Token;
use crate::jobs::types::{JobRecord, JobResult};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::warn;

/// Almacén en memoria de registros de jobs
pub struct JobStore<P, O> {
    jobs: Arc<Mutex<HashMap<Token, JobRecord<P, O>>>>,
}

impl<P: Clone, O: Clone> JobStore<P, O> {
    /// Crea un almacén vacío
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Token, JobRecord<P, O>>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Genera un token nuevo y crea su registro (sin resultado)
    pub fn reserve(&self, payload: P) -> Token {
        self.reserve_with(payload, Token::generate)
    }

    fn reserve_with(&self, payload: P, mut generate: impl FnMut() -> Token) -> Token {
        let mut jobs = self.lock();

        let mut token = generate();
        while jobs.contains_key(&token) {
            warn!(%token, "token collision, regenerating");
            token = generate();
        }

        jobs.insert(token.clone(), JobRecord::new(token.clone(), payload));
        token
    }

    /// Obtiene una copia del registro de un job
    pub fn get(&self, token: &Token) -> Option<JobRecord<P, O>> {
        self.lock().get(token).cloned()
    }

    /// Guarda el resultado terminal de un job
    pub fn write_result(&self, token: &Token, result: JobResult<O>) -> Result<(), StoreError> {
        let mut jobs = self.lock();

        let record = jobs
            .get_mut(token)
            .ok_or_else(|| StoreError::NotFound(token.clone()))?;

        if record.finish(result) {
            Ok(())
        } else {
            Err(StoreError::AlreadyFinished(token.clone()))
        }
    }

    /// Elimina un registro (sólo para deshacer un `reserve` que no llegó a la cola)
    pub(crate) fn remove(&self, token: &Token) -> Option<JobRecord<P, O>> {
        self.lock().remove(token)
    }

    /// Número de jobs almacenados
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Número de jobs sin resultado todavía
    pub fn pending_count(&self) -> usize {
        self.lock().values().filter(|job| !job.is_finished()).count()
    }

    /// Purga los jobs terminados hace más de `max_age`
    ///
    /// Los jobs pendientes nunca se purgan. Retorna cuántos se eliminaron.
    pub fn evict_finished_older_than(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let mut jobs = self.lock();
        let before = jobs.len();

        jobs.retain(|_, job| match job.finished_at {
            Some(finished_at) => now
                .signed_duration_since(finished_at)
                .to_std()
                .map(|age| age < max_age)
                .unwrap_or(true),
            None => true,
        });

        before - jobs.len()
    }
}

impl<P: Clone, O: Clone> Default for JobStore<P, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, O> Clone for JobStore<P, O> {
    fn clone(&self) -> Self {
        Self {
            jobs: Arc::clone(&self.jobs),
        }
    }
}
