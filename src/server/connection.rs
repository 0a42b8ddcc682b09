//! # Conexión aceptada
//! src/server/connection.rs
//!
//! Dueña única del socket de un cliente. Mientras espera datos vive en el
//! mapa del loop de eventos; cuando el socket está listo se mueve dentro de
//! la tarea del worker. Como el valor solo puede estar en un lugar a la
//! vez, dos workers nunca tocan el mismo descriptor.
//!
//! El socket se desregistra y se cierra exactamente una vez: en `close()`
//! o, si la conexión se descarta por otro camino (tarea rechazada, panic,
//! apagado), en `Drop`.

use crate::metrics::ServerStats;
use mio::unix::SourceFd;
use mio::{Interest, Registry, Token};
use std::io;
use std::net::{SocketAddr, TcpStream};
use std::os::fd::AsRawFd;
use std::sync::Arc;
use tracing::{trace, warn};

pub struct Connection {
    stream: TcpStream,
    token: Token,
    peer: SocketAddr,
    registry: Arc<Registry>,
    stats: Arc<ServerStats>,
    registered: bool,
}

impl Connection {
    /// Pone el socket en modo no bloqueante y lo registra (edge-triggered)
    /// para lectura
    ///
    /// Si algo falla el socket se cierra antes de retornar el error.
    pub fn register(
        stream: TcpStream,
        peer: SocketAddr,
        token: Token,
        registry: &Arc<Registry>,
        stats: &Arc<ServerStats>,
    ) -> io::Result<Self> {
        let mut conn = Self {
            stream,
            token,
            peer,
            registry: Arc::clone(registry),
            stats: Arc::clone(stats),
            registered: false,
        };

        conn.stream.set_nonblocking(true)?;

        let fd = conn.stream.as_raw_fd();
        conn.registry
            .register(&mut SourceFd(&fd), token, Interest::READABLE)?;
        conn.registered = true;

        Ok(conn)
    }

    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    fn deregister(&mut self) {
        if !self.registered {
            return;
        }
        self.registered = false;

        let fd = self.stream.as_raw_fd();
        if let Err(e) = self.registry.deregister(&mut SourceFd(&fd)) {
            warn!(peer = %self.peer, error = %e, "deregister failed");
        }
    }

    /// Desregistra y cierra el socket
    pub fn close(mut self) {
        self.deregister();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.deregister();
        self.stats.connection_closed();
        trace!(peer = %self.peer, token = self.token.0, "connection closed");
        // `stream` se cierra al destruirse el campo
    }
}
