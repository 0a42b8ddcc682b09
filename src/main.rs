//! # httpd - Entry Point
//! src/main.rs
//!
//! Uso: `httpd <port> <doc_root> [OPCIONES]`
//!
//! Exit codes: 1 uso incorrecto, 2 puerto no numérico, 3 puerto fuera de
//! rango, 4 error fatal del servidor.

use httpd::config::Config;
use httpd::logging;
use httpd::server::Server;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::process::ExitCode;
use std::thread;
use tracing::{error, info};

/// Fallo de socket/bind/epoll
const EXIT_FATAL: u8 = 4;

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            // clap ya formatea el uso; los errores de puerto van a stderr
            match &e {
                httpd::error::ConfigError::Usage(clap_err) => {
                    let _ = clap_err.print();
                }
                other => eprintln!("{}", other),
            }
            return ExitCode::from(e.exit_code());
        }
    };

    logging::init(&config.log_level);
    config.log_summary();

    let server = match Server::bind(&config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "startup failed");
            eprintln!("{}", e);
            return ExitCode::from(EXIT_FATAL);
        }
    };

    // SIGINT / SIGTERM -> apagado ordenado
    let handle = server.shutdown_handle();
    match Signals::new([SIGINT, SIGTERM]) {
        Ok(mut signals) => {
            thread::spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    info!(signal, "signal received");
                    if let Err(e) = handle.shutdown() {
                        error!(error = %e, "failed to wake event loop");
                    }
                }
            });
        }
        Err(e) => error!(error = %e, "failed to install signal handler"),
    }

    match server.run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}
