//! # Resolución de paths
//! src/server/site.rs
//!
//! El path del archivo es el document root seguido, tal cual, del path del
//! request: `./htdocs` + `/img/a.png` = `./htdocs/img/a.png`.
//!
//! No hay control de contención: `GET /../secret.html` sale del document
//! root. `confine_to_root` (desactivado por defecto) responde 404 a
//! cualquier path con un segmento `..`.
//!
//! ## Sufijo ".下载"
//!
//! Algunos navegadores guardan páginas con scripts llamados `app.js.下载`
//! y luego los piden percent-encoded (`app.js.%E4%B8%8B%E8%BD%BD`). Si lo
//! que sigue al último `.` del path contiene un `%`, se reemplaza entero
//! por el literal `下载`. Es una regla puntual para ese caso y no
//! decodifica nada más.

use crate::config::Config;
use regex::Regex;
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Texto que sustituye al fragmento percent-encoded
pub const DOWNLOAD_SUFFIX: &str = "下载";

/// Todo hasta el último `.` inclusive, y después un tramo sin puntos con `%`
static ENCODED_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<stem>.*\.)[^.]*%[^.]*$").expect("valid regex"));

/// Reglas para convertir el path de un request en un archivo
#[derive(Debug, Clone)]
pub struct Site {
    doc_root: String,
    confine_to_root: bool,
    download_suffix: bool,
}

/// Resultado de resolver un path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// Path del request después de aplicar las reglas
    pub target: Cow<'a, str>,

    /// Archivo en disco
    pub path: PathBuf,
}

impl Site {
    pub fn new(doc_root: impl Into<String>) -> Self {
        Self {
            doc_root: doc_root.into(),
            confine_to_root: false,
            download_suffix: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.doc_root.clone())
            .with_confinement(config.confine_to_root)
            .with_download_suffix(config.download_suffix)
    }

    pub fn with_confinement(mut self, enabled: bool) -> Self {
        self.confine_to_root = enabled;
        self
    }

    pub fn with_download_suffix(mut self, enabled: bool) -> Self {
        self.download_suffix = enabled;
        self
    }

    /// Convierte el path del request en un archivo bajo el document root
    ///
    /// Retorna `None` solo si `confine_to_root` está activo y el path tiene
    /// un segmento `..`.
    ///
    /// # Ejemplo
    /// ```
    /// use httpd::server::Site;
    ///
    /// let site = Site::new("./htdocs");
    /// let resolution = site.resolve("/js/app.js.%E4%B8%8B%E8%BD%BD").unwrap();
    /// assert_eq!(resolution.target, "/js/app.js.下载");
    /// assert_eq!(resolution.path.to_str(), Some("./htdocs/js/app.js.下载"));
    /// ```
    pub fn resolve<'a>(&self, target: &'a str) -> Option<Resolution<'a>> {
        if self.confine_to_root && target.split('/').any(|segment| segment == "..") {
            return None;
        }

        let target = if self.download_suffix {
            rewrite_download_suffix(target)
        } else {
            Cow::Borrowed(target)
        };

        let path = PathBuf::from(format!("{}{}", self.doc_root, target));
        Some(Resolution { target, path })
    }
}

/// Aplica la regla del sufijo ".下载"
pub fn rewrite_download_suffix(target: &str) -> Cow<'_, str> {
    match ENCODED_SUFFIX.captures(target) {
        Some(caps) => Cow::Owned(format!("{}{}", &caps["stem"], DOWNLOAD_SUFFIX)),
        None => Cow::Borrowed(target),
    }
}
