//! # Tipos y Estructuras para el Sistema de Jobs
//! src/jobs/types.rs
//!
//! Define los tipos fundamentales del motor: el registro de cada job, su
//! resultado terminal y la respuesta de tres estados de `query`.

use crate::jobs::token::Token;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Estado de un job visto desde el cliente
///
/// El motor no guarda un estado `Running` separado: "pending" cubre tanto
/// jobs en cola como jobs en ejecución.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Aceptado, todavía sin resultado
    Pending,

    /// Terminado (con éxito o con fallo)
    Done,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Done => "done",
        }
    }
}

/// Resultado terminal de un job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobResult<O> {
    /// El workload retornó normalmente
    Completed(O),

    /// El workload falló; se guarda la descripción del error
    Failed(String),
}

impl<O> JobResult<O> {
    pub fn is_failed(&self) -> bool {
        matches!(self, JobResult::Failed(_))
    }

    pub fn output(&self) -> Option<&O> {
        match self {
            JobResult::Completed(output) => Some(output),
            JobResult::Failed(_) => None,
        }
    }
}

/// Registro de un job en el almacén
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord<P, O> {
    /// Token del job
    pub token: Token,

    /// Entrada opaca que consume el workload
    pub payload: P,

    /// Momento en que se aceptó el job
    pub enqueued_at: DateTime<Utc>,

    /// Momento en que el worker terminó (se asigna una sola vez)
    pub finished_at: Option<DateTime<Utc>>,

    /// Resultado terminal (nunca se sobrescribe)
    pub result: Option<JobResult<O>>,
}

impl<P, O> JobRecord<P, O> {
    /// Crea un registro nuevo, sin resultado
    pub fn new(token: Token, payload: P) -> Self {
        Self {
            token,
            payload,
            enqueued_at: Utc::now(),
            finished_at: None,
            result: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn status(&self) -> JobStatus {
        if self.is_finished() {
            JobStatus::Done
        } else {
            JobStatus::Pending
        }
    }

    /// Marca el job como terminado
    ///
    /// Retorna `false` sin tocar nada si ya tenía resultado.
    pub(crate) fn finish(&mut self, result: JobResult<O>) -> bool {
        if self.result.is_some() {
            return false;
        }
        self.finished_at = Some(Utc::now());
        self.result = Some(result);
        true
    }
}

/// Respuesta de `JobEngine::query`
#[derive(Debug, Clone, PartialEq)]
pub enum JobPoll<P, O> {
    /// El token nunca fue emitido (o su registro fue purgado)
    NotFound,

    /// El job existe pero aún no tiene resultado.
    /// `partial` sólo se llena cuando se pide `debug`.
    Pending { partial: Option<JobRecord<P, O>> },

    /// El job terminó. `record` sólo se llena cuando se pide `debug`.
    Ready {
        result: JobResult<O>,
        record: Option<JobRecord<P, O>>,
    },
}

impl<P, O> JobPoll<P, O> {
    pub fn is_not_found(&self) -> bool {
        matches!(self, JobPoll::NotFound)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, JobPoll::Pending { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, JobPoll::Ready { .. })
    }

    /// Resultado del job, si ya está listo
    pub fn result(&self) -> Option<&JobResult<O>> {
        match self {
            JobPoll::Ready { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Estadísticas del motor (para /metrics)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub workers: usize,
    pub queued: usize,
    pub stored_jobs: usize,
    pub pending_jobs: usize,
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub panicked: u64,
}
