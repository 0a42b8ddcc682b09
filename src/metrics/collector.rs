//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Contadores del servidor, actualizados desde el loop de eventos y desde
//! los workers sin tomar locks.

use crate::http::StatusCode;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Contadores thread-safe del servidor
#[derive(Debug, Default)]
pub struct ServerStats {
    connections_accepted: AtomicU64,
    connections_closed: AtomicU64,
    responses_ok: AtomicU64,
    responses_forbidden: AtomicU64,
    responses_not_found: AtomicU64,
    /// Conexiones cerradas sin recibir ni un byte
    dropped: AtomicU64,
    /// Conexiones que el pool no aceptó
    rejected: AtomicU64,
    /// Conexiones cerradas por un error de I/O a mitad de camino
    failed: AtomicU64,
    bytes_sent: AtomicU64,
}

/// Foto de los contadores en un instante
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub connections_accepted: u64,
    pub connections_closed: u64,
    pub responses_ok: u64,
    pub responses_forbidden: u64,
    pub responses_not_found: u64,
    pub dropped: u64,
    pub rejected: u64,
    pub failed: u64,
    pub bytes_sent: u64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_accepted(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Registra una respuesta enviada
    pub fn record_response(&self, status: StatusCode) {
        let counter = match status {
            StatusCode::Ok => &self.responses_ok,
            StatusCode::Forbidden => &self.responses_forbidden,
            StatusCode::NotFound => &self.responses_not_found,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes(&self, bytes: u64) {
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            responses_ok: self.responses_ok.load(Ordering::Relaxed),
            responses_forbidden: self.responses_forbidden.load(Ordering::Relaxed),
            responses_not_found: self.responses_not_found.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
        }
    }

    /// Snapshot en formato JSON
    pub fn snapshot_json(&self) -> String {
        serde_json::to_string_pretty(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

impl StatsSnapshot {
    /// Total de respuestas enviadas (200 + 403 + 404)
    pub fn responses(&self) -> u64 {
        self.responses_ok + self.responses_forbidden + self.responses_not_found
    }
}
