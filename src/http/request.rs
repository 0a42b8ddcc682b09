//! # Request Line
//! src/http/request.rs
//!
//! Del request solo interesa la primera línea, y de ella solo el método y
//! el path:
//!
//! ```text
//! GET /index.html HTTP/1.1\r\n
//! Host: localhost\r\n        <- ignorado
//! \r\n
//! ```
//!
//! Los tokens se separan por whitespace ASCII; la versión y los headers se
//! descartan.

use std::borrow::Cow;

/// Método del request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - El único método que el servidor atiende
    Get,

    /// Cualquier otro token (POST, HEAD, basura...)
    Other(String),
}

impl Method {
    /// Comparación exacta, sensible a mayúsculas: "get" no es GET
    fn from_token(token: &[u8]) -> Self {
        if token == b"GET" {
            Method::Get
        } else {
            Method::Other(String::from_utf8_lossy(token).into_owned())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Other(m) => m,
        }
    }
}

/// Primera línea de un request ya tokenizada
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine<'a> {
    method: Method,
    target: Option<Cow<'a, str>>,
}

impl<'a> RequestLine<'a> {
    /// Toma los dos primeros tokens del buffer
    ///
    /// Nunca falla: un buffer sin tokens produce un método vacío (que no es
    /// GET) y un GET sin path produce `target() == None`.
    ///
    /// # Ejemplo
    /// ```
    /// use httpd::http::{Method, RequestLine};
    ///
    /// let line = RequestLine::parse(b"GET /index.html HTTP/1.1\r\n\r\n");
    /// assert_eq!(line.method(), &Method::Get);
    /// assert_eq!(line.target(), Some("/index.html"));
    /// ```
    pub fn parse(buffer: &'a [u8]) -> Self {
        let mut tokens = buffer
            .split(|b| b.is_ascii_whitespace())
            .filter(|token| !token.is_empty());

        let method = Method::from_token(tokens.next().unwrap_or_default());
        let target = tokens.next().map(String::from_utf8_lossy);

        Self { method, target }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::Get
    }

    /// Path tal como lo envió el cliente (sin decodificar)
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }
}
