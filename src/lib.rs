//! # httpd
//! src/lib.rs
//!
//! Servidor HTTP mínimo de archivos estáticos. Un thread multiplexa los
//! sockets con epoll (edge-triggered, no bloqueante) y un pool fijo de
//! workers atiende cada conexión: lee la request line, busca el archivo
//! bajo el document root y lo envía.
//!
//! ## Arquitectura
//!
//! - `server`: loop de eventos, conexiones y atención de requests
//! - `pool`: pool de threads con cola FIFO compartida
//! - `http`: request line, cabeceras de respuesta y tipos de archivo
//! - `config`: argumentos CLI / variables de entorno
//! - `metrics`: contadores de conexiones y respuestas
//! - `logging`: inicialización de `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use httpd::config::Config;
//! use httpd::server::Server;
//!
//! let config = Config::from_args(["httpd", "8080", "./htdocs"]).unwrap();
//! let server = Server::bind(&config).expect("Error al iniciar servidor");
//! server.run().expect("Error en el loop de eventos");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod pool;
pub mod server;
