//! # Cabeceras de respuesta
//!
//! El servidor nunca genera un body propio: las respuestas de error van
//! con `Content-Length: 0` y las 200 van seguidas del contenido del archivo,
//! que se envía aparte.
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: image/png\r\n
//! Content-Length: 5120\r\n
//! \r\n
//! <bytes del archivo>
//! ```

use super::{FileType, StatusCode};

/// Status line + headers de una respuesta
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    status: StatusCode,
    content_type: String,
    content_length: u64,
}

impl ResponseHead {
    /// 200 OK para un archivo de `len` bytes
    ///
    /// # Ejemplo
    /// ```
    /// use httpd::http::{FileType, ResponseHead};
    ///
    /// let head = ResponseHead::ok(FileType::Html, 12);
    /// assert_eq!(
    ///     head.to_bytes(),
    ///     b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 12\r\n\r\n"
    /// );
    /// ```
    pub fn ok(file_type: FileType, len: u64) -> Self {
        Self {
            status: StatusCode::Ok,
            content_type: file_type.mime().to_string(),
            content_length: len,
        }
    }

    /// 403 Forbidden sin body
    pub fn forbidden() -> Self {
        Self::empty(StatusCode::Forbidden)
    }

    /// 404 Not Found sin body
    pub fn not_found() -> Self {
        Self::empty(StatusCode::NotFound)
    }

    fn empty(status: StatusCode) -> Self {
        Self {
            status,
            content_type: mime::TEXT_HTML.to_string(),
            content_length: 0,
        }
    }

    /// Bytes listos para escribir en el socket
    ///
    /// Los headers siempre salen en el mismo orden: Content-Type y luego
    /// Content-Length.
    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
            self.status, self.content_type, self.content_length
        )
        .into_bytes()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}
