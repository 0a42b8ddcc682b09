//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! - `event_loop`: acepta conexiones y las entrega al pool cuando hay datos
//! - `connection`: socket de un cliente con cierre garantizado
//! - `dispatch`: lee el request y envía la respuesta (corre en un worker)
//! - `site`: document root y reglas para resolver paths

pub mod connection;
pub mod dispatch;
pub mod event_loop;
pub mod site;

// Re-exportar para facilitar el uso
pub use connection::Connection;
pub use dispatch::{Dispatcher, Outcome};
pub use event_loop::{Server, ShutdownHandle};
pub use site::Site;
