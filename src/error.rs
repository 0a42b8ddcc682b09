//! # Errores del servidor
//! src/error.rs
//!
//! Cada capa tiene su propio tipo de error:
//!
//! - `ConfigError`: argumentos inválidos (se traduce a un exit code)
//! - `PoolError`: el pool rechazó una tarea o no pudo arrancar
//! - `ServerError`: fallos de arranque o del loop de eventos (fatales)
//! - `DispatchError`: fallos dentro de una conexión (nunca salen de la tarea)

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Errores de configuración / línea de comandos
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Número de argumentos incorrecto, flag desconocido, `--help`...
    #[error("{0}")]
    Usage(#[from] clap::Error),

    /// El puerto no es un número entero
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    /// El puerto no está en (0, 65535]
    #[error("Invalid port: {0}")]
    PortOutOfRange(i64),

    /// Otro valor fuera de rango
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Exit code del proceso para este error
    ///
    /// - 0: `--help` / `--version` (no es realmente un error)
    /// - 1: uso incorrecto (número de argumentos)
    /// - 2: puerto no parseable
    /// - 3: puerto fuera de rango
    pub fn exit_code(&self) -> u8 {
        match self {
            ConfigError::Usage(e) if !e.use_stderr() => 0,
            ConfigError::Usage(_) | ConfigError::Invalid(_) => 1,
            ConfigError::InvalidPort(_) => 2,
            ConfigError::PortOutOfRange(_) => 3,
        }
    }
}

/// Errores del pool de workers
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("submit on a pool that is shutting down")]
    ShutDown,

    #[error("task queue is full (capacity: {0})")]
    QueueFull(usize),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Errores fatales del servidor
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("bind() error on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to create readiness notifier: {0}")]
    Poller(#[source] io::Error),

    #[error("failed to register listener: {0}")]
    Register(#[source] io::Error),

    #[error("wait on readiness notifier failed: {0}")]
    Wait(#[source] io::Error),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Errores al atender una conexión
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_exit_codes() {
        assert_eq!(ConfigError::InvalidPort("abc".into()).exit_code(), 2);
        assert_eq!(ConfigError::PortOutOfRange(70000).exit_code(), 3);
        assert_eq!(ConfigError::Invalid("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_display() {
        let err = PoolError::QueueFull(8);
        assert_eq!(err.to_string(), "task queue is full (capacity: 8)");

        let err = ServerError::from(PoolError::ShutDown);
        assert_eq!(err.to_string(), "submit on a pool that is shutting down");
    }
}
