//! # Logging
//! src/logging.rs
//!
//! Inicializa `tracing` con salida a stderr. `RUST_LOG` tiene prioridad
//! sobre `--log-level`; `off` desactiva todo el logging.

use tracing_subscriber::EnvFilter;

/// Instala el subscriber global
///
/// Se puede llamar más de una vez (p. ej. desde varios tests): solo la
/// primera llamada tiene efecto.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .try_init();
}
