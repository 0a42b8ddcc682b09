//! # Loop de eventos
//! src/server/event_loop.rs
//!
//! Un solo thread es dueño del listener, del `mio::Poll` y de las conexiones
//! que todavía no enviaron datos. Nunca lee requests ni toca archivos: solo
//! acepta, registra y entrega sockets listos al pool.
//!
//! ```text
//!            ┌──────────── poll() ◄─────────────┐
//!            │                                  │
//!   LISTENER │ accept() hasta WouldBlock        │
//!            │ registrar READABLE (edge)        │
//!            │                                  │
//!   conexión │ sacar del mapa ──► pool.submit ──┘
//!            │
//!   WAKER    │ ¿apagado pedido? ──► salir, vaciar pool
//! ```

use crate::config::Config;
use crate::error::ServerError;
use crate::metrics::{ServerStats, StatsSnapshot};
use crate::pool::ThreadPool;
use crate::server::{Connection, Dispatcher, Site};
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Registry, Token, Waker};
use std::collections::HashMap;
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::os::fd::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);

/// Los tokens de conexión empiezan aquí y nunca se reutilizan
const FIRST_CONNECTION: usize = 2;

/// Permite detener el servidor desde otro thread
#[derive(Clone)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    /// Pide el apagado y despierta al loop
    pub fn shutdown(&self) -> io::Result<()> {
        self.requested.store(true, Ordering::SeqCst);
        self.waker.wake()
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Servidor de archivos estáticos
pub struct Server {
    listener: TcpListener,
    poll: Poll,
    registry: Arc<Registry>,
    shutdown: ShutdownHandle,
    pool: ThreadPool,
    dispatcher: Arc<Dispatcher>,
    stats: Arc<ServerStats>,
    max_events: usize,
    next_token: usize,

    /// Conexiones registradas esperando su primer evento de lectura
    connections: HashMap<Token, Connection>,
}

impl Server {
    /// Abre el listener, crea el notificador y arranca el pool
    pub fn bind(config: &Config) -> Result<Self, ServerError> {
        let addr = config.address();
        let listener =
            TcpListener::bind(addr).map_err(|source| ServerError::Bind { addr, source })?;
        listener
            .set_nonblocking(true)
            .map_err(|source| ServerError::Bind { addr, source })?;

        let poll = Poll::new().map_err(ServerError::Poller)?;
        let registry = Arc::new(poll.registry().try_clone().map_err(ServerError::Poller)?);

        registry
            .register(
                &mut SourceFd(&listener.as_raw_fd()),
                LISTENER,
                Interest::READABLE,
            )
            .map_err(ServerError::Register)?;

        let waker = Waker::new(poll.registry(), WAKER).map_err(ServerError::Poller)?;
        let shutdown = ShutdownHandle {
            requested: Arc::new(AtomicBool::new(false)),
            waker: Arc::new(waker),
        };

        let pool = ThreadPool::with_capacity(config.workers, config.queue_capacity)?;

        let stats = Arc::new(ServerStats::new());
        let write_timeout =
            (config.write_timeout_ms > 0).then(|| Duration::from_millis(config.write_timeout_ms));
        let dispatcher = Arc::new(Dispatcher::new(
            Site::from_config(config),
            Arc::clone(&stats),
            write_timeout,
        ));

        Ok(Self {
            listener,
            poll,
            registry,
            shutdown,
            pool,
            dispatcher,
            stats,
            max_events: config.max_events.max(1),
            next_token: FIRST_CONNECTION,
            connections: HashMap::new(),
        })
    }

    /// Dirección real del listener (útil si se pidió el puerto 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    /// Corre el loop hasta que se pida el apagado o falle `poll()`
    ///
    /// Antes de retornar, cierra las conexiones inactivas y espera a que el
    /// pool termine todas las tareas encoladas.
    pub fn run(mut self) -> Result<StatsSnapshot, ServerError> {
        if let Ok(addr) = self.local_addr() {
            info!(%addr, workers = self.pool.size(), "listening");
        }

        let result = self.event_loop();
        if let Err(e) = &result {
            error!(error = %e, "event loop failed");
        }

        let idle = self.connections.len();
        self.connections.clear();
        debug!(idle, "idle connections closed");

        self.pool.shutdown();
        if self.pool.panicked() > 0 {
            warn!(panicked = self.pool.panicked(), "tasks panicked during run");
        }

        info!(stats = %self.stats.snapshot_json(), "server stopped");
        result.map(|()| self.stats.snapshot())
    }

    fn event_loop(&mut self) -> Result<(), ServerError> {
        let mut events = Events::with_capacity(self.max_events);

        loop {
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(ServerError::Wait(e));
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept_pending(),
                    WAKER => {}
                    token => self.dispatch(token),
                }
            }

            if self.shutdown.is_requested() {
                info!("shutdown requested");
                return Ok(());
            }
        }
    }

    /// Acepta todas las conexiones pendientes
    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    self.stats.connection_accepted();
                    let token = self.allocate_token();

                    match Connection::register(stream, peer, token, &self.registry, &self.stats) {
                        Ok(conn) => {
                            trace!(%peer, token = token.0, "connection registered");
                            self.connections.insert(token, conn);
                        }
                        Err(e) => warn!(%peer, error = %e, "failed to register connection"),
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::Interrupted | io::ErrorKind::ConnectionAborted
                    ) =>
                {
                    continue
                }
                Err(e) => {
                    // EMFILE y similares: las conexiones del backlog no
                    // generan otro flanco, hay que volver a armar el listener
                    warn!(error = %e, "accept() failed");
                    if let Err(e) = rearm_listener(&self.registry, &self.listener) {
                        error!(error = %e, "failed to re-arm listener");
                    }
                    break;
                }
            }
        }
    }

    /// Entrega una conexión lista al pool
    ///
    /// Un token que ya no está en el mapa pertenece a una conexión que ya
    /// está en manos de un worker (o cerrada); el evento se ignora.
    fn dispatch(&mut self, token: Token) {
        let Some(conn) = self.connections.remove(&token) else {
            trace!(token = token.0, "event for connection owned by a worker");
            return;
        };

        let peer = conn.peer();
        let dispatcher = Arc::clone(&self.dispatcher);

        // Si se rechaza, la closure (y con ella la conexión) se destruye y
        // el socket se cierra
        if let Err(e) = self.pool.submit(move || dispatcher.handle(conn)) {
            self.stats.record_rejected();
            warn!(%peer, error = %e, "connection rejected");
        }
    }

    fn allocate_token(&mut self) -> Token {
        let token = Token(self.next_token);
        self.next_token += 1;
        token
    }
}

/// Vuelve a registrar el listener para que epoll reporte de nuevo las
/// conexiones que ya esperan en el backlog
fn rearm_listener(registry: &Registry, listener: &TcpListener) -> io::Result<()> {
    registry.reregister(
        &mut SourceFd(&listener.as_raw_fd()),
        LISTENER,
        Interest::READABLE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpStream;

    fn listener_events(poll: &mut Poll, events: &mut Events) -> usize {
        poll.poll(events, Some(Duration::from_millis(200))).unwrap();
        events.iter().filter(|e| e.token() == LISTENER).count()
    }

    #[test]
    fn test_rearm_reports_pending_backlog() {
        let mut poll = Poll::new().unwrap();
        let mut events = Events::with_capacity(8);

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        poll.registry()
            .register(&mut SourceFd(&listener.as_raw_fd()), LISTENER, Interest::READABLE)
            .unwrap();

        let _client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        assert_eq!(listener_events(&mut poll, &mut events), 1);

        // Edge-triggered: sin aceptar, no llega otro aviso
        assert_eq!(listener_events(&mut poll, &mut events), 0);

        rearm_listener(poll.registry(), &listener).unwrap();
        assert_eq!(listener_events(&mut poll, &mut events), 1);

        // La conexión seguía en el backlog
        assert!(listener.accept().is_ok());
    }

    #[test]
    fn test_shutdown_handle_stops_run() {
        let config = Config {
            host: std::net::Ipv4Addr::LOCALHOST.into(),
            port: 0,
            workers: 1,
            ..Config::default()
        };
        let server = Server::bind(&config).unwrap();
        let handle = server.shutdown_handle();
        assert!(!handle.is_requested());

        handle.shutdown().unwrap();
        let stats = server.run().unwrap();
        assert!(handle.is_requested());
        assert_eq!(stats.connections_accepted, 0);
    }
}

