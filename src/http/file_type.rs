//! # Tipos de archivo servibles
//! src/http/file_type.rs
//!
//! Conjunto cerrado de tipos. La clasificación busca cada patrón dentro del
//! path en este orden y se queda con el primero que aparece:
//!
//! ```text
//! .html -> text/html
//! .css  -> text/css
//! .js   -> application/javascript
//! .png  -> image/png
//! .jpg  -> image/jpeg
//! ```
//!
//! La búsqueda es por substring, no por sufijo: `app.js.下载` es JS y
//! `page.html.css` es HTML.

use mime::Mime;

/// Tipo de un archivo según su extensión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Html,
    Css,
    Js,
    Jpeg,
    Png,
}

/// Patrones en orden de prioridad
const PATTERNS: [(&str, FileType); 5] = [
    (".html", FileType::Html),
    (".css", FileType::Css),
    (".js", FileType::Js),
    (".png", FileType::Png),
    (".jpg", FileType::Jpeg),
];

impl FileType {
    /// Clasifica un path; `None` si no contiene ninguna extensión conocida
    ///
    /// # Ejemplo
    /// ```
    /// use httpd::http::FileType;
    ///
    /// assert_eq!(FileType::classify("/img/logo.png"), Some(FileType::Png));
    /// assert_eq!(FileType::classify("/notes.txt"), None);
    /// ```
    pub fn classify(path: &str) -> Option<Self> {
        PATTERNS
            .iter()
            .find(|(pattern, _)| path.contains(pattern))
            .map(|(_, file_type)| *file_type)
    }

    pub fn mime(&self) -> Mime {
        match self {
            FileType::Html => mime::TEXT_HTML,
            FileType::Css => mime::TEXT_CSS,
            FileType::Js => mime::APPLICATION_JAVASCRIPT,
            FileType::Jpeg => mime::IMAGE_JPEG,
            FileType::Png => mime::IMAGE_PNG,
        }
    }
}
