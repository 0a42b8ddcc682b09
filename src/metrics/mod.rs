//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Contadores de conexiones y respuestas. El snapshot se escribe en el log
//! al apagar el servidor y lo devuelve `Server::run`.

pub mod collector;

pub use collector::{ServerStats, StatsSnapshot};
