//! # Frask
//! src/lib.rs
//!
//! Servidor HTTP/1.1 implementado desde cero: un loop de multiplexación
//! con `mio`, un thread por conexión lista, un router por (path, método),
//! archivos estáticos y ejecución de scripts CGI.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Parsing de requests, bodies y construcción de responses
//! - `router`: Mapa (path, método) → handler
//! - `application`: Fachada que responde requests (rutas, estáticos, CGI)
//! - `server`: Socket de escucha, loop de eventos y workers
//! - `metrics`: Recolección de métricas y observabilidad
//! - `config`: Configuración por CLI y variables de entorno
//! - `logging`: Inicialización de `tracing`
//! - `error`: Taxonomía de errores
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use frask::application::Application;
//! use frask::config::Config;
//! use frask::http::Request;
//! use frask::server::HttpServer;
//!
//! let config = Config::default();
//! let mut server = HttpServer::bind(&config).unwrap();
//!
//! let mut app = Application::from_config("demo", &config).unwrap();
//! app.route("/hello", ["GET"], |_req: &Request| "Hello World").unwrap();
//!
//! server.serve(app);
//! server.start().unwrap();
//! ```

pub mod application;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod router;
pub mod server;

pub use error::{Error, Result};
