//! # Módulo HTTP
//!
//! Subconjunto mínimo de HTTP sobre TCP:
//!
//! - Del request solo se lee la primera línea (método y path)
//! - Sin keep-alive: una respuesta por conexión y luego se cierra
//! - Sin chunked, sin query strings, sin POST
//!
//! ### Formato de Request
//!
//! ```text
//! GET /index.html HTTP/1.1\r\n
//! ```
//!
//! ### Respuestas posibles
//!
//! ```text
//! HTTP/1.1 200 OK\r\nContent-Type: <mime>\r\nContent-Length: <n>\r\n\r\n<archivo>
//! HTTP/1.1 403 Forbidden\r\nContent-Type: text/html\r\nContent-Length: 0\r\n\r\n
//! HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\nContent-Length: 0\r\n\r\n
//! ```

pub mod file_type; // Extensión -> tipo / MIME
pub mod request; // Tokenización de la request line
pub mod response; // Cabeceras canned
pub mod status; // Códigos de estado

pub use file_type::FileType;
pub use request::{Method, RequestLine};
pub use response::ResponseHead;
pub use status::StatusCode;
