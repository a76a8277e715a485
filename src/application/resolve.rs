//! # Resolución de Paths Estáticos
//! src/application/resolve.rs
//!
//! Traduce el path de un request a un path relativo al directorio de la
//! aplicación:
//!
//! | Request          | Path real               | Extensión |
//! |------------------|-------------------------|-----------|
//! | `/`              | `./index.html`          | `.html`   |
//! | `/test.html`     | `./test.html`           | `.html`   |
//! | `/catalog`       | `./catalog/index.html`  | `.html`   |
//! | `/cgi-bin/h.cgi` | `./cgi-bin/h.cgi`       | `.cgi`    |
//!
//! Los paths con componentes `..` no se resuelven.

use std::path::Path;

/// Path estático resuelto
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Path relativo a la raíz, siempre con prefijo `./`
    pub relative: String,

    /// Extensión con punto inicial (ej: ".html"); vacía si no tiene
    pub extension: String,
}

/// Resuelve el path de un request
///
/// Retorna `None` si el path intenta salir de la raíz.
///
/// ```
/// use frask::application::resolve::real_path;
///
/// let resolved = real_path("/docs/", "index.html").unwrap();
/// assert_eq!(resolved.relative, "./docs/index.html");
/// assert_eq!(resolved.extension, ".html");
///
/// assert!(real_path("/../etc/passwd", "index.html").is_none());
/// ```
pub fn real_path(path: &str, default_access_file: &str) -> Option<ResolvedPath> {
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return None;
    }

    let trimmed = path.trim_end_matches('/');
    let is_directory = path.ends_with('/') || Path::new(trimmed).extension().is_none();

    let relative = if is_directory {
        format!(".{}/{}", trimmed, default_access_file)
    } else {
        format!("./{}", path.trim_matches('/'))
    };

    let extension = Path::new(&relative)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    Some(ResolvedPath {
        relative,
        extension,
    })
}

/// Content-Type según la extensión; `text/plain` si no es conocida
pub fn mime_type(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        ".txt" => "text/plain",
        ".html" | ".htm" => "text/html",
        ".css" => "text/css",
        ".js" => "text/javascript",
        ".json" => "application/json",
        ".xml" => "application/xml",
        ".png" => "image/png",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".gif" => "image/gif",
        ".svg" => "image/svg+xml",
        ".ico" => "image/x-icon",
        _ => "text/plain",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(path: &str) -> (String, String) {
        let resolved = real_path(path, "index.html").unwrap();
        (resolved.relative, resolved.extension)
    }

    #[test]
    fn test_root_resolves_to_default_file() {
        assert_eq!(resolve("/"), ("./index.html".into(), ".html".into()));
    }

    #[test]
    fn test_file_with_extension() {
        assert_eq!(resolve("/test.html"), ("./test.html".into(), ".html".into()));
        assert_eq!(
            resolve("/cgi-bin/h.cgi"),
            ("./cgi-bin/h.cgi".into(), ".cgi".into())
        );
    }

    #[test]
    fn test_directory_without_extension() {
        assert_eq!(
            resolve("/catalog"),
            ("./catalog/index.html".into(), ".html".into())
        );
        assert_eq!(
            resolve("/catalog/"),
            ("./catalog/index.html".into(), ".html".into())
        );
    }

    #[test]
    fn test_last_extension_wins() {
        assert_eq!(
            resolve("/archive.tar.gz"),
            ("./archive.tar.gz".into(), ".gz".into())
        );
    }

    #[test]
    fn test_custom_default_access_file() {
        let resolved = real_path("/docs", "main.htm").unwrap();
        assert_eq!(resolved.relative, "./docs/main.htm");
        assert_eq!(resolved.extension, ".htm");
    }

    #[test]
    fn test_traversal_is_rejected() {
        assert!(real_path("/../secret.txt", "index.html").is_none());
        assert!(real_path("/a/../../b/", "index.html").is_none());
        assert!(real_path("/a/..\\b.txt", "index.html").is_none());
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type(".html"), "text/html");
        assert_eq!(mime_type(".JS"), "text/javascript");
        assert_eq!(mime_type(".png"), "image/png");
        assert_eq!(mime_type(".xml"), "application/xml");
        assert_eq!(mime_type(".unknown"), "text/plain");
        assert_eq!(mime_type(""), "text/plain");
    }
}
