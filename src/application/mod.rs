//! # Aplicación
//! src/application/mod.rs
//!
//! Fachada que convierte un `Request` en una `Response`:
//!
//! ```text
//! Request ──► Router ──► handler ──► IntoResponse ──► Response
//!               │
//!               ├─ NoSuitableMethod ──► 405
//!               └─ PathNotFound ──► archivo estático / script CGI / 404
//! ```
//!
//! `respond` nunca falla ni propaga un panic: cualquier fallo inesperado
//! termina en `502 Bad Gateway`.
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use frask::application::Application;
//! use frask::http::Request;
//!
//! let mut app = Application::new("demo", "./static").unwrap();
//! app.route("/hello", ["GET"], |req: &Request| {
//!     format!("Hello, {}", req.header("User-Agent").unwrap_or("stranger"))
//! })
//! .unwrap();
//! ```

pub mod cgi;
pub mod reply;
pub mod resolve;

pub use reply::IntoResponse;

use crate::config::Config;
use crate::error::ApplicationError;
use crate::http::{Request, Response, StatusCode};
use crate::router::{Handler, Router};
use std::any::Any;
use std::collections::HashSet;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Extensiones ejecutables por defecto
pub const DEFAULT_EXECUTABLES: [&str; 4] = [".cgi", ".py", ".sh", ".pl"];

/// Aplicación web: rutas dinámicas, archivos estáticos y scripts CGI
#[derive(Debug)]
pub struct Application {
    name: String,

    /// Raíz absoluta para archivos estáticos y scripts
    root: PathBuf,

    router: Router,

    /// Archivo servido al acceder a un directorio
    default_access_file: String,

    /// Extensiones que se ejecutan como CGI
    executables: HashSet<String>,

    /// Directorio CGI con prefijo `./` (ej: "./cgi-bin")
    cgi_dir: String,

    cgi_timeout: Duration,
}

impl Application {
    /// Crea una aplicación con raíz en `workdir`
    ///
    /// Falla con `InvalidWorkDir` si `workdir` no es un directorio. El
    /// directorio actual del proceso no se modifica.
    pub fn new(name: &str, workdir: impl AsRef<Path>) -> Result<Self, ApplicationError> {
        let workdir = workdir.as_ref();
        if !workdir.is_dir() {
            return Err(ApplicationError::InvalidWorkDir(workdir.to_path_buf()));
        }
        let root = fs::canonicalize(workdir)
            .map_err(|_| ApplicationError::InvalidWorkDir(workdir.to_path_buf()))?;

        Ok(Self {
            name: name.to_string(),
            root,
            router: Router::new(),
            default_access_file: "index.html".to_string(),
            executables: DEFAULT_EXECUTABLES.iter().map(|s| s.to_string()).collect(),
            cgi_dir: "./cgi-bin".to_string(),
            cgi_timeout: Duration::from_secs(5),
        })
    }

    /// Crea una aplicación con los valores de la configuración
    pub fn from_config(name: &str, config: &Config) -> Result<Self, ApplicationError> {
        Ok(Self::new(name, &config.workdir)?
            .with_default_access_file(&config.default_access_file)
            .with_executables(&config.executable)
            .with_cgi_dir(&config.cgi_dir)
            .with_cgi_timeout(config.cgi_timeout()))
    }

    pub fn with_default_access_file(mut self, file: &str) -> Self {
        self.default_access_file = file.to_string();
        self
    }

    /// Reemplaza el conjunto de extensiones ejecutables
    pub fn with_executables<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.executables = extensions
            .into_iter()
            .map(|ext| ext.as_ref().to_string())
            .collect();
        self
    }

    /// Directorio CGI relativo a la raíz ("cgi-bin" equivale a "./cgi-bin")
    pub fn with_cgi_dir(mut self, dir: &str) -> Self {
        let dir = dir.trim_start_matches("./").trim_matches('/');
        self.cgi_dir = format!("./{}", dir);
        self
    }

    pub fn with_cgi_timeout(mut self, timeout: Duration) -> Self {
        self.cgi_timeout = timeout;
        self
    }

    /// Registra un handler para un path y un conjunto de métodos
    ///
    /// El handler puede retornar cualquier tipo que implemente
    /// [`IntoResponse`].
    pub fn route<I, S, F, R>(
        &mut self,
        path: &str,
        methods: I,
        handler: F,
    ) -> Result<(), ApplicationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&Request) -> R + Send + Sync + 'static,
        R: IntoResponse,
    {
        let handler: Handler = Arc::new(move |request: &Request| handler(request).into_response());
        self.router.add_record(path, methods, handler)
    }

    /// Responde un request; nunca falla ni hace panic
    pub fn respond(&self, request: &Request) -> Response {
        match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(request))) {
            Ok(response) => response,
            Err(payload) => {
                error!(
                    request = %request.request_line(),
                    panic = panic_message(payload.as_ref()),
                    "Handler panicked"
                );
                Response::new(StatusCode::BAD_GATEWAY)
            }
        }
    }

    fn dispatch(&self, request: &Request) -> Response {
        match self.router.match_route(request.path(), request.method()) {
            Ok(handler) => handler(request),
            Err(ApplicationError::NoSuitableMethod { .. }) => {
                Response::new(StatusCode::METHOD_NOT_ALLOWED)
            }
            Err(_) => self.serve_path(request),
        }
    }

    /// Archivo estático o script CGI
    fn serve_path(&self, request: &Request) -> Response {
        let Some(resolved) = resolve::real_path(request.path(), &self.default_access_file) else {
            debug!(path = %request.path(), "Rejected path outside the root");
            return Response::new(StatusCode::NOT_FOUND);
        };

        let full_path = self.root.join(&resolved.relative);
        if !full_path.is_file() {
            return Response::new(StatusCode::NOT_FOUND);
        }

        if self.is_cgi(&resolved) {
            return match cgi::execute(&full_path, &self.root, request.environ(), self.cgi_timeout) {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, script = %resolved.relative, "CGI execution failed");
                    Response::new(StatusCode::BAD_GATEWAY)
                }
            };
        }

        match fs::read(&full_path) {
            Ok(content) => Response::new(StatusCode::OK)
                .with_header("Content-Type", resolve::mime_type(&resolved.extension))
                .with_body_bytes(content),
            Err(e) => {
                error!(error = %e, path = %full_path.display(), "Static file not readable");
                Response::new(StatusCode::BAD_GATEWAY)
            }
        }
    }

    fn is_cgi(&self, resolved: &resolve::ResolvedPath) -> bool {
        self.executables.contains(&resolved.extension)
            && resolved
                .relative
                .strip_prefix(&self.cgi_dir)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn router(&self) -> &Router {
        &self.router
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn get(app: &Application, path: &str) -> Response {
        let raw = format!("GET {} HTTP/1.1\r\nHost: localhost:15014\r\n\r\n", path);
        app.respond(&Request::parse(raw.as_bytes()).unwrap())
    }

    fn site() -> (TempDir, Application) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        fs::write(dir.path().join("notes.txt"), "plain").unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.html"), "docs").unwrap();
        fs::create_dir(dir.path().join("cgi-bin")).unwrap();

        let app = Application::new("test", dir.path()).unwrap();
        (dir, app)
    }

    fn write_script(dir: &TempDir, relative: &str, content: &str) {
        let path = dir.path().join(relative);
        fs::write(&path, content).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_invalid_workdir() {
        let result = Application::new("x", "/definitely/not/here");
        assert!(matches!(result, Err(ApplicationError::InvalidWorkDir(_))));
    }

    #[test]
    fn test_route_string_handler() {
        let (_dir, mut app) = site();
        app.route("/hello", ["GET"], |req: &Request| {
            format!("Hello, {}", req.header("User-Agent").unwrap_or("stranger"))
        })
        .unwrap();

        let response = get(&app, "/hello");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), Some(&b"Hello, stranger"[..]));
    }

    #[test]
    fn test_route_json_handler() {
        let (_dir, mut app) = site();
        app.route("/api", ["GET"], |_req: &Request| json!({"ok": true}))
            .unwrap();

        let response = get(&app, "/api");
        assert_eq!(response.headers().get("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_method_not_allowed() {
        let (_dir, mut app) = site();
        app.route("/hello", ["POST"], |_req: &Request| "ok").unwrap();

        assert_eq!(get(&app, "/hello").status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_unknown_method_in_route() {
        let (_dir, mut app) = site();
        let result = app.route("/x", ["GRAB"], |_req: &Request| "ok");
        assert_eq!(result, Err(ApplicationError::UnknownHttpMethod("GRAB".into())));
        assert!(app.router().is_empty());
    }

    #[test]
    fn test_handler_panic_becomes_bad_gateway() {
        let (_dir, mut app) = site();
        app.route("/boom", ["GET"], |_req: &Request| -> &'static str {
            panic!("handler exploded")
        })
        .unwrap();

        assert_eq!(get(&app, "/boom").status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_static_files() {
        let (_dir, app) = site();

        let response = get(&app, "/");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Content-Type"), Some("text/html"));
        assert_eq!(response.body(), Some(&b"<h1>home</h1>"[..]));

        let response = get(&app, "/notes.txt");
        assert_eq!(response.headers().get("Content-Type"), Some("text/plain"));

        let response = get(&app, "/docs");
        assert_eq!(response.body(), Some(&b"docs"[..]));
    }

    #[test]
    fn test_missing_file_is_404() {
        let (_dir, app) = site();
        assert_eq!(get(&app, "/missing.html").status(), StatusCode::NOT_FOUND);
        assert_eq!(get(&app, "/nodir/").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unreadable_file_is_bad_gateway() {
        let (dir, app) = site();
        let link = dir.path().join("mem.txt");
        std::os::unix::fs::symlink("/proc/self/mem", &link).unwrap();
        assert!(link.is_file());

        assert_eq!(get(&app, "/mem.txt").status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_path_traversal_is_404() {
        let (dir, app) = site();
        let outside = dir.path().parent().unwrap().join("frask-outside.txt");
        let _ = fs::write(&outside, "secret");

        assert_eq!(get(&app, "/../frask-outside.txt").status(), StatusCode::NOT_FOUND);
        let _ = fs::remove_file(outside);
    }

    #[test]
    fn test_cgi_script() {
        let (dir, app) = site();
        write_script(&dir, "cgi-bin/hi.sh", "#!/bin/sh\necho \"cgi $REQUEST_METHOD\"\n");

        let response = get(&app, "/cgi-bin/hi.sh");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), Some(&b"cgi GET\n"[..]));
    }

    #[test]
    fn test_script_outside_cgi_dir_is_static() {
        let (dir, app) = site();
        write_script(&dir, "run.sh", "#!/bin/sh\necho executed\n");

        let response = get(&app, "/run.sh");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(String::from_utf8_lossy(response.body().unwrap()).contains("echo executed"));
    }

    #[test]
    fn test_cgi_failure_is_bad_gateway() {
        let (dir, app) = site();
        write_script(&dir, "cgi-bin/fail.sh", "#!/bin/sh\nexit 1\n");

        assert_eq!(get(&app, "/cgi-bin/fail.sh").status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_custom_cgi_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("scripts")).unwrap();
        write_script(&dir, "scripts/a.cgi", "#!/bin/sh\necho custom\n");

        let app = Application::new("x", dir.path())
            .unwrap()
            .with_cgi_dir("scripts/");

        assert_eq!(get(&app, "/scripts/a.cgi").body(), Some(&b"custom\n"[..]));
    }

    #[test]
    fn test_cgi_dir_prefix_must_be_a_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("cgi-binary")).unwrap();
        write_script(&dir, "cgi-binary/a.sh", "#!/bin/sh\necho no\n");

        let app = Application::new("x", dir.path()).unwrap();
        let response = get(&app, "/cgi-binary/a.sh");
        assert!(String::from_utf8_lossy(response.body().unwrap()).starts_with("#!/bin/sh"));
    }
}
