//! # Atención de una conexión
//! src/server/dispatch.rs
//!
//! Se ejecuta dentro de un worker, una vez por conexión:
//!
//! ```text
//! leer hasta WouldBlock/EOF ──► request line ──► ¿GET? ──no──► 403
//!                                                 │ sí
//!                                   resolver path + tipo ──✗──► 404
//!                                                 │
//!                                   abrir archivo ──✗──► 404
//!                                                 │
//!                                   200 + contenido del archivo
//! ```
//!
//! Pase lo que pase, la conexión termina desregistrada y cerrada.

use crate::error::DispatchError;
use crate::http::{FileType, RequestLine, ResponseHead, StatusCode};
use crate::metrics::ServerStats;
use crate::server::{Connection, Site};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Tamaño de cada lectura del socket
const READ_CHUNK: usize = 1024;

/// Máximo de bytes del request que se guardan; el resto se lee y se descarta
pub const MAX_REQUEST_BYTES: usize = 8 * 1024;

/// Cómo terminó una conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Se envió una respuesta con este código
    Responded(StatusCode),

    /// El cliente cerró sin enviar nada
    Dropped,
}

/// Atiende conexiones ya listas para leer
#[derive(Debug)]
pub struct Dispatcher {
    site: Site,
    stats: Arc<ServerStats>,
    write_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(site: Site, stats: Arc<ServerStats>, write_timeout: Option<Duration>) -> Self {
        Self {
            site,
            stats,
            write_timeout,
        }
    }

    /// Punto de entrada de la tarea: responde y cierra
    ///
    /// Los errores de I/O se registran en el log y la conexión se cierra sin
    /// más; nunca salen de aquí.
    pub fn handle(&self, mut conn: Connection) {
        match self.respond(&mut conn) {
            Ok(Outcome::Responded(status)) => {
                self.stats.record_response(status);
                debug!(peer = %conn.peer(), status = %status, "response sent");
            }
            Ok(Outcome::Dropped) => {
                self.stats.record_dropped();
                debug!(peer = %conn.peer(), "empty connection");
            }
            Err(e) => {
                self.stats.record_failed();
                warn!(peer = %conn.peer(), error = %e, "connection failed");
            }
        }

        conn.close();
    }

    fn respond(&self, conn: &mut Connection) -> Result<Outcome, DispatchError> {
        let request = read_available(conn.stream_mut())?;
        if request.is_empty() {
            return Ok(Outcome::Dropped);
        }

        let line = RequestLine::parse(&request);
        if !line.is_get() {
            debug!(method = line.method().as_str(), "method not allowed");
            return self.send_head(conn, ResponseHead::forbidden());
        }

        let Some(target) = line.target() else {
            return self.send_head(conn, ResponseHead::not_found());
        };

        let Some(resolution) = self.site.resolve(target) else {
            debug!(path = target, "path escapes document root");
            return self.send_head(conn, ResponseHead::not_found());
        };

        // Se clasifica el path completo, document root incluido
        let Some(file_type) = FileType::classify(&resolution.path.to_string_lossy()) else {
            debug!(path = %resolution.target, "unsupported file type");
            return self.send_head(conn, ResponseHead::not_found());
        };

        match open_regular_file(&resolution.path) {
            Ok((file, len)) => self.send_file(conn, file_type, file, len),
            Err(e) => {
                debug!(path = %resolution.path.display(), error = %e, "open failed");
                self.send_head(conn, ResponseHead::not_found())
            }
        }
    }

    /// El socket pasa a modo bloqueante para escribir la respuesta completa
    fn prepare_for_write(&self, conn: &Connection) -> io::Result<()> {
        let stream = conn.stream();
        stream.set_nonblocking(false)?;
        stream.set_write_timeout(self.write_timeout)?;
        Ok(())
    }

    fn send_head(
        &self,
        conn: &mut Connection,
        head: ResponseHead,
    ) -> Result<Outcome, DispatchError> {
        self.prepare_for_write(conn)?;

        let stream = conn.stream_mut();
        stream.write_all(&head.to_bytes())?;
        stream.flush()?;

        Ok(Outcome::Responded(head.status()))
    }

    fn send_file(
        &self,
        conn: &mut Connection,
        file_type: FileType,
        mut file: File,
        len: u64,
    ) -> Result<Outcome, DispatchError> {
        self.prepare_for_write(conn)?;

        let head = ResponseHead::ok(file_type, len);
        let stream = conn.stream_mut();
        stream.write_all(&head.to_bytes())?;

        // File -> TcpStream: en Linux std usa sendfile/splice
        let sent = io::copy(&mut file, stream)?;
        stream.flush()?;

        self.stats.record_bytes(sent);
        if sent != len {
            warn!(expected = len, sent, "file changed size while sending");
        }

        Ok(Outcome::Responded(head.status()))
    }
}

/// Lee todo lo disponible hasta EOF o `WouldBlock`
///
/// Con registro edge-triggered no llega otro aviso por los bytes que queden
/// sin leer, así que hay que vaciar el socket en una sola pasada.
pub fn read_available<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut request = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let room = MAX_REQUEST_BYTES.saturating_sub(request.len());
                request.extend_from_slice(&chunk[..n.min(room)]);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(request)
}

/// Abre el archivo y obtiene su tamaño; los directorios cuentan como
/// inexistentes
fn open_regular_file(path: &Path) -> io::Result<(File, u64)> {
    let file = File::open(path)?;
    let metadata = file.metadata()?;

    if !metadata.is_file() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file"));
    }

    Ok((file, metadata.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mio::{Poll, Token};
    use std::io::Cursor;
    use std::net::{Shutdown, TcpListener, TcpStream};

    /// Entrega los trozos dados y después responde WouldBlock para siempre
    struct Chunked {
        chunks: Vec<Vec<u8>>,
    }

    impl Read for Chunked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.chunks.is_empty() {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            let chunk = self.chunks.remove(0);
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    /// Falla con Interrupted una vez y luego devuelve los datos
    struct InterruptedOnce {
        interrupted: bool,
        data: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedOnce {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::ErrorKind::Interrupted.into());
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn test_read_until_eof() {
        let mut reader = Cursor::new(b"GET /index.html HTTP/1.1\r\n\r\n".to_vec());
        let request = read_available(&mut reader).unwrap();
        assert_eq!(request, b"GET /index.html HTTP/1.1\r\n\r\n");
    }

    #[test]
    fn test_read_until_would_block() {
        let mut reader = Chunked {
            chunks: vec![b"GET /a".to_vec(), b".html HTTP/1.1\r\n".to_vec()],
        };
        let request = read_available(&mut reader).unwrap();
        assert_eq!(request, b"GET /a.html HTTP/1.1\r\n");
    }

    #[test]
    fn test_read_empty() {
        let mut reader = Chunked { chunks: Vec::new() };
        assert!(read_available(&mut reader).unwrap().is_empty());
    }

    #[test]
    fn test_read_retries_interrupted() {
        let mut reader = InterruptedOnce {
            interrupted: false,
            data: Cursor::new(b"GET / HTTP/1.0".to_vec()),
        };
        assert_eq!(read_available(&mut reader).unwrap(), b"GET / HTTP/1.0");
    }

    #[test]
    fn test_read_is_capped_but_drained() {
        let mut big = b"GET /index.html HTTP/1.1\r\n".to_vec();
        big.resize(MAX_REQUEST_BYTES * 3, b'x');
        let mut reader = Cursor::new(big);

        let request = read_available(&mut reader).unwrap();
        assert_eq!(request.len(), MAX_REQUEST_BYTES);
        assert!(request.starts_with(b"GET /index.html"));
        // Todo se consumió
        assert_eq!(reader.position() as usize, MAX_REQUEST_BYTES * 3);
    }

    #[test]
    fn test_read_error_propagates() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::ErrorKind::ConnectionReset.into())
            }
        }

        let err = read_available(&mut Broken).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn test_open_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_regular_file(dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_open_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.css");
        std::fs::write(&path, "body{}").unwrap();

        let (_, len) = open_regular_file(&path).unwrap();
        assert_eq!(len, 6);
    }

    /// Par de sockets conectados: (cliente, lado del servidor)
    fn socket_pair() -> (TcpStream, TcpStream, std::net::SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, peer) = listener.accept().unwrap();
        (client, server, peer)
    }

    #[test]
    fn test_write_failure_closes_silently() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>hi</h1>\n").unwrap();

        let poll = Poll::new().unwrap();
        let registry = Arc::new(poll.registry().try_clone().unwrap());
        let stats = Arc::new(ServerStats::new());
        let site = Site::new(dir.path().to_str().unwrap());
        let dispatcher = Dispatcher::new(site, Arc::clone(&stats), None);

        let (mut client, server, peer) = socket_pair();
        client.write_all(b"GET /index.html HTTP/1.1\r\n\r\n").unwrap();

        // Esperar a que el request esté en el socket antes de volverlo no bloqueante
        let mut first = [0u8; 1];
        server.peek(&mut first).unwrap();

        stats.connection_accepted();
        let conn = Connection::register(server, peer, Token(2), &registry, &stats).unwrap();

        // Con el lado de escritura cerrado, la respuesta falla con EPIPE
        conn.stream().shutdown(Shutdown::Write).unwrap();
        dispatcher.handle(conn);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.responses(), 0);
        assert_eq!(snapshot.connections_closed, 1);

        // El cliente solo ve el cierre, sin bytes
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut response = Vec::new();
        client.read_to_end(&mut response).unwrap();
        assert!(response.is_empty());
    }

    #[test]
    fn test_handle_serves_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>hi</h1>\n").unwrap();

        let poll = Poll::new().unwrap();
        let registry = Arc::new(poll.registry().try_clone().unwrap());
        let stats = Arc::new(ServerStats::new());
        let site = Site::new(dir.path().to_str().unwrap());
        let dispatcher = Dispatcher::new(site, Arc::clone(&stats), None);

        let (mut client, server, peer) = socket_pair();
        client.write_all(b"GET /index.html HTTP/1.1\r\n\r\n").unwrap();
        let mut first = [0u8; 1];
        server.peek(&mut first).unwrap();

        let conn = Connection::register(server, peer, Token(2), &registry, &stats).unwrap();
        dispatcher.handle(conn);

        let mut response = Vec::new();
        client.read_to_end(&mut response).unwrap();
        assert!(response.starts_with(b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n"));
        assert!(response.ends_with(b"<h1>hi</h1>\n"));
        assert_eq!(stats.snapshot().responses_ok, 1);
        assert_eq!(stats.snapshot().failed, 0);
    }
}
