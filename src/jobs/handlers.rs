//! # Handlers HTTP para Jobs
//! src/jobs/handlers.rs
//!
//! Traducen entre requests HTTP y el motor de jobs:
//!
//! - `GET|PUT {base}/url/<target>` → `submit_handler`
//! - `GET {base}/count/<token>[?debug=true]` → `count_handler`

use crate::error::EngineError;
use crate::http::{Request, Response, StatusCode};
use crate::jobs::manager::JobEngine;
use crate::jobs::token::Token;
use crate::jobs::types::{JobPoll, JobResult};
use crate::jobs::workload::Workload;
use serde::Serialize;
use serde_json::json;
use tracing::error;

/// Encola `target` y retorna su token
///
/// # Ejemplo de response (202)
/// ```json
/// {"id": "3f2a9c...", "message": "enqueued"}
/// ```
pub fn submit_handler<W>(target: &str, engine: &JobEngine<W>) -> Response
where
    W: Workload<Payload = String>,
{
    let target = target.trim();
    if target.is_empty() {
        return Response::error(StatusCode::BadRequest, "Missing target URL");
    }

    match engine.submit(target.to_string()) {
        Ok(token) => Response::json_value(
            StatusCode::Accepted,
            &json!({ "id": token, "message": "enqueued" }),
        ),
        Err(EngineError::ShutDown) => {
            Response::error(StatusCode::ServiceUnavailable, "Job engine is shutting down")
        }
        Err(e) => Response::error(StatusCode::InternalServerError, &e.to_string()),
    }
}

/// Consulta el resultado de un job
///
/// - 200: resultado listo (el valor, o `{"error": ...}` si falló)
/// - 202: todavía pendiente
/// - 404: token desconocido
///
/// Con `?debug=true` el body es el registro completo del job.
pub fn count_handler<W>(req: &Request, token: &str, engine: &JobEngine<W>) -> Response
where
    W: Workload,
    W::Payload: Serialize,
    W::Output: Serialize,
{
    if token.is_empty() {
        return Response::error(StatusCode::BadRequest, "Missing token");
    }

    let token = Token::from(token);
    let debug = req.flag("debug");

    match engine.query(&token, debug) {
        JobPoll::NotFound => Response::error(StatusCode::NotFound, "Token not found"),
        JobPoll::Pending {
            partial: Some(record),
        } => serialized(StatusCode::Accepted, &record),
        JobPoll::Pending { partial: None } => Response::json_value(
            StatusCode::Accepted,
            &json!({ "id": token, "status": "pending" }),
        ),
        JobPoll::Ready {
            record: Some(record),
            ..
        } => serialized(StatusCode::Ok, &record),
        JobPoll::Ready {
            result: JobResult::Completed(output),
            ..
        } => serialized(StatusCode::Ok, &output),
        JobPoll::Ready {
            result: JobResult::Failed(message),
            ..
        } => Response::json(&json!({ "error": message })),
    }
}

fn serialized<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_value(value) {
        Ok(body) => Response::json_value(status, &body),
        Err(e) => {
            error!(error = %e, "failed to serialize job response");
            Response::error(
                StatusCode::InternalServerError,
                "Failed to serialize job response",
            )
        }
    }
}
