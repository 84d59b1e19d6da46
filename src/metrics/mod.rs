//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Métricas de requests HTTP (contadores, latencias p50/p95/p99, conexiones
//! activas). Los contadores de jobs vienen de `JobEngine::stats`.

pub mod collector;

pub use collector::{MetricsCollector, MetricsSnapshot};
