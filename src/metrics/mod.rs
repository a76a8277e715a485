//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Este módulo implementa la recolección y agregación de métricas del servidor:
//! - Contadores de respuestas por código de estado y por path
//! - Latencias (p50, p95, p99, máximo)
//! - Workers activos
//! - Conexiones descartadas sin respuesta

pub mod collector;

pub use collector::{MetricsCollector, MetricsSnapshot};
