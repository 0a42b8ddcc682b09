//! # Códigos de Estado HTTP
//!
//! El servidor solo produce tres respuestas:
//!
//! - **200 OK**: el archivo existe y tiene un tipo conocido
//! - **403 Forbidden**: el método no es `GET`
//! - **404 Not Found**: el archivo no existe o su extensión no es soportada

/// Códigos de estado que emite el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200 OK - Se envía el archivo completo
    Ok = 200,

    /// 403 Forbidden - Método distinto de GET
    Forbidden = 403,

    /// 404 Not Found - Archivo inexistente o tipo no soportado
    NotFound = 404,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use httpd::http::StatusCode;
    /// assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Texto de razón (reason phrase) asociado al código
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
        }
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "404 Not Found"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
