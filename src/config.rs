//! # Configuración del Servidor
//! src/config.rs
//!
//! Este módulo define la configuración del servidor HTTP con soporte completo
//! para argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./frask --port 8080 \
//!   --workdir ./static \
//!   --cgi-timeout-ms 2000 \
//!   --executable .sh,.py
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! FRASK_PORT=8080 FRASK_HOST=0.0.0.0 FRASK_LOG=debug ./frask
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Configuración del servidor HTTP/1.1
#[derive(Debug, Clone, Parser)]
#[command(name = "frask")]
#[command(about = "Servidor HTTP/1.1 con router, archivos estáticos y CGI")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor (0 = puerto efímero)
    #[arg(short, long, default_value = "15014", env = "FRASK_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "FRASK_HOST")]
    pub host: String,

    /// Tamaño de la cola de conexiones pendientes
    #[arg(long, default_value = "128", env = "FRASK_BACKLOG")]
    pub backlog: i32,

    /// Máximo de bytes leídos por request
    #[arg(
        long = "max-request-size",
        default_value = "8192",
        env = "FRASK_MAX_REQUEST_SIZE"
    )]
    pub max_request_size: usize,

    // === Aplicación ===

    /// Directorio raíz de archivos estáticos y scripts
    #[arg(long, default_value = ".", env = "FRASK_WORKDIR")]
    pub workdir: PathBuf,

    /// Archivo servido al acceder a un directorio
    #[arg(
        long = "default-access-file",
        default_value = "index.html",
        env = "FRASK_DEFAULT_ACCESS_FILE"
    )]
    pub default_access_file: String,

    // === CGI ===

    /// Directorio de scripts CGI, relativo al workdir
    #[arg(long = "cgi-dir", default_value = "./cgi-bin", env = "FRASK_CGI_DIR")]
    pub cgi_dir: String,

    /// Timeout de ejecución de un script CGI en milisegundos
    #[arg(long = "cgi-timeout-ms", default_value = "5000", env = "FRASK_CGI_TIMEOUT_MS")]
    pub cgi_timeout_ms: u64,

    /// Extensiones ejecutables como CGI
    #[arg(
        long,
        default_value = ".cgi,.py,.sh,.pl",
        value_delimiter = ',',
        env = "FRASK_EXECUTABLE"
    )]
    pub executable: Vec<String>,

    // === Logging ===

    /// Nivel de log (RUST_LOG tiene prioridad)
    #[arg(long = "log-level", default_value = "info", env = "FRASK_LOG")]
    pub log_level: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use frask::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:15014");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cgi_timeout(&self) -> Duration {
        Duration::from_millis(self.cgi_timeout_ms)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.backlog <= 0 {
            return Err("Backlog must be >= 1".to_string());
        }
        if self.max_request_size == 0 {
            return Err("Max request size must be >= 1".to_string());
        }
        if self.cgi_timeout_ms == 0 {
            return Err("CGI timeout must be > 0".to_string());
        }
        if self.default_access_file.is_empty() || self.default_access_file.contains('/') {
            return Err("Default access file must be a plain file name".to_string());
        }
        if let Some(ext) = self.executable.iter().find(|ext| !ext.starts_with('.')) {
            return Err(format!("Executable extension must start with '.': {}", ext));
        }
        if !self.workdir.is_dir() {
            return Err(format!("Workdir is not a directory: {}", self.workdir.display()));
        }

        Ok(())
    }

    /// Registra un resumen de la configuración efectiva
    pub fn log_summary(&self) {
        info!(
            address = %self.address(),
            backlog = self.backlog,
            max_request_size = self.max_request_size,
            "Network"
        );
        info!(
            workdir = %self.workdir.display(),
            default_access_file = %self.default_access_file,
            "Static files"
        );
        info!(
            cgi_dir = %self.cgi_dir,
            timeout_ms = self.cgi_timeout_ms,
            executable = %self.executable.join(","),
            "CGI"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 15014,
            host: "127.0.0.1".to_string(),
            backlog: 128,
            max_request_size: 8192,
            workdir: PathBuf::from("."),
            default_access_file: "index.html".to_string(),
            cgi_dir: "./cgi-bin".to_string(),
            cgi_timeout_ms: 5000,
            executable: [".cgi", ".py", ".sh", ".pl"]
                .into_iter()
                .map(String::from)
                .collect(),
            log_level: "info".to_string(),
        }
    }
}
