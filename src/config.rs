//! # Configuración del Servidor
//! src/config.rs
//!
//! Argumentos de línea de comandos y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./httpd 8080 ./htdocs --workers 8 --queue-capacity 4096
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTPD_WORKERS=8 HTTPD_LOG=debug ./httpd 8080 ./htdocs
//! ```
//!
//! El puerto se recibe como texto y se valida a mano para poder devolver
//! exit codes distintos: 2 si no es un número, 3 si está fuera de rango.

use crate::error::ConfigError;
use clap::Parser;
use std::ffi::OsString;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::info;

/// Argumentos tal como llegan por CLI / entorno
#[derive(Debug, Clone, Parser)]
#[command(name = "httpd")]
#[command(about = "Servidor HTTP de archivos estáticos (epoll + pool de threads)")]
#[command(version)]
pub struct Cli {
    /// Puerto en el que escucha el servidor (1-65535)
    #[arg(allow_negative_numbers = true)]
    pub port: String,

    /// Directorio raíz de los documentos
    pub doc_root: String,

    /// IP en la que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HTTPD_HOST")]
    pub host: IpAddr,

    /// Número de workers (0 = paralelismo disponible)
    #[arg(short, long, default_value = "0", env = "HTTPD_WORKERS")]
    pub workers: usize,

    /// Máximo de tareas encoladas (0 = sin límite)
    #[arg(long = "queue-capacity", default_value = "0", env = "HTTPD_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Eventos procesados por cada despertar del loop
    #[arg(long = "max-events", default_value = "2048", env = "HTTPD_MAX_EVENTS")]
    pub max_events: usize,

    /// Timeout de escritura de respuestas en milisegundos (0 = sin timeout)
    #[arg(long = "write-timeout-ms", default_value = "30000", env = "HTTPD_WRITE_TIMEOUT_MS")]
    pub write_timeout_ms: u64,

    /// Responder 404 a paths con segmentos `..`
    #[arg(long = "confine-to-root", env = "HTTPD_CONFINE")]
    pub confine_to_root: bool,

    /// Desactiva la reescritura del sufijo ".下载"
    #[arg(long = "no-download-suffix", env = "HTTPD_NO_DOWNLOAD_SUFFIX")]
    pub no_download_suffix: bool,

    /// Filtro de logging (trace, debug, info, warn, error, off)
    #[arg(long = "log-level", default_value = "info", env = "HTTPD_LOG")]
    pub log_level: String,
}

/// Configuración ya validada
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub doc_root: String,
    pub workers: usize,
    pub queue_capacity: Option<usize>,
    pub max_events: usize,
    pub write_timeout_ms: u64,
    pub confine_to_root: bool,
    pub download_suffix: bool,
    pub log_level: String,
}

impl Config {
    /// Parsea y valida los argumentos del proceso
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_args(std::env::args_os())
    }

    /// Parsea y valida una lista de argumentos (el primero es el nombre del programa)
    ///
    /// # Ejemplo
    /// ```
    /// use httpd::config::Config;
    ///
    /// let config = Config::from_args(["httpd", "8080", "./htdocs"]).unwrap();
    /// assert_eq!(config.port, 8080);
    /// assert_eq!(config.doc_root, "./htdocs");
    /// ```
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;
        let config = Self::try_from(cli)?;
        config.validate()?;
        Ok(config)
    }

    /// Dirección completa para bind (host:port)
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_events == 0 {
            return Err(ConfigError::Invalid("max events must be >= 1".to_string()));
        }
        if self.doc_root.is_empty() {
            return Err(ConfigError::Invalid("doc_root must not be empty".to_string()));
        }
        Ok(())
    }

    /// Escribe un resumen de la configuración en el log
    pub fn log_summary(&self) {
        let workers = if self.workers == 0 {
            "auto".to_string()
        } else {
            self.workers.to_string()
        };
        let queue = self
            .queue_capacity
            .map_or_else(|| "unbounded".to_string(), |c| c.to_string());

        info!(address = %self.address(), doc_root = %self.doc_root, "network");
        info!(workers = %workers, queue = %queue, max_events = self.max_events, "worker pool");
        info!(
            write_timeout_ms = self.write_timeout_ms,
            confine_to_root = self.confine_to_root,
            download_suffix = self.download_suffix,
            "request handling"
        );
    }
}

/// Valida el puerto: primero que sea un entero, luego el rango
fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    let port: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidPort(raw.to_string()))?;

    if port <= 0 || port > i64::from(u16::MAX) {
        return Err(ConfigError::PortOutOfRange(port));
    }

    // El rango ya se comprobó
    u16::try_from(port).map_err(|_| ConfigError::PortOutOfRange(port))
}

impl TryFrom<Cli> for Config {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        Ok(Self {
            host: cli.host,
            port: parse_port(&cli.port)?,
            doc_root: cli.doc_root,
            workers: cli.workers,
            queue_capacity: (cli.queue_capacity > 0).then_some(cli.queue_capacity),
            max_events: cli.max_events,
            write_timeout_ms: cli.write_timeout_ms,
            confine_to_root: cli.confine_to_root,
            download_suffix: !cli.no_download_suffix,
            log_level: cli.log_level,
        })
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            doc_root: "./htdocs".to_string(),
            workers: 0,
            queue_capacity: None,
            max_events: 2048,
            write_timeout_ms: 30_000,
            confine_to_root: false,
            download_suffix: true,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, ConfigError> {
        let mut full = vec!["httpd"];
        full.extend_from_slice(args);
        Config::from_args(full)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.workers, 0);
        assert!(config.queue_capacity.is_none());
        assert!(config.download_suffix);
        assert!(!config.confine_to_root);
    }

    #[test]
    fn test_positional_args() {
        let config = parse(&["3000", "./www"]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.doc_root, "./www");
        assert_eq!(config.address().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_wrong_argument_count() {
        let err = parse(&["3000"]).unwrap_err();
        assert_eq!(err.exit_code(), 1);

        let err = parse(&[]).unwrap_err();
        assert_eq!(err.exit_code(), 1);

        let err = parse(&["3000", "./www", "extra"]).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_unparseable_port() {
        let err = parse(&["http", "./www"]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_port_out_of_range() {
        for port in ["0", "65536", "-1", "99999999"] {
            let err = parse(&[port, "./www"]).unwrap_err();
            assert_eq!(err.exit_code(), 3, "port {port}");
        }
    }

    #[test]
    fn test_port_bounds() {
        assert_eq!(parse(&["1", "./www"]).unwrap().port, 1);
        assert_eq!(parse(&["65535", "./www"]).unwrap().port, 65535);
    }

    #[test]
    fn test_options() {
        let config = parse(&[
            "8080",
            "./www",
            "--workers",
            "3",
            "--queue-capacity",
            "16",
            "--host",
            "127.0.0.1",
            "--confine-to-root",
            "--no-download-suffix",
        ])
        .unwrap();

        assert_eq!(config.workers, 3);
        assert_eq!(config.queue_capacity, Some(16));
        assert_eq!(config.address().to_string(), "127.0.0.1:8080");
        assert!(config.confine_to_root);
        assert!(!config.download_suffix);
    }

    #[test]
    fn test_validate_max_events() {
        let err = parse(&["8080", "./www", "--max-events", "0"]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_help_is_not_failure() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_log_summary() {
        // No debe hacer panic
        Config::default().log_summary();
    }
}
