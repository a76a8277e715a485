//! # Módulo HTTP
//!
//! Este módulo implementa el protocolo HTTP/1.1 desde cero, sin usar
//! librerías de alto nivel. Incluye:
//!
//! - Parsing de requests (request line, headers, cookies, body)
//! - Decodificación de bodies según `Content-Type`
//! - Construcción de responses HTTP
//! - Manejo de status codes y bodies predefinidos
//! - Decodificación de query strings y formularios
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Host: localhost:15014\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 13\r\n
//! \r\n
//! {"ok": true}
//! ```
//!
//! Cada conexión atiende un único request; el servidor siempre cierra el
//! socket después de escribir la respuesta.

pub mod body;      // Bodies decodificados y registro de decoders
pub mod decode;    // Percent-decoding y pares key=value
pub mod fields;    // Mapa ordenado de headers, params y environ
pub mod method;    // Métodos HTTP
pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
// Esto permite usar `http::Request` en vez de `http::request::Request`
pub use body::{Body, BodyRegistry};
pub use fields::FieldMap;
pub use method::Method;
pub use request::Request;
pub use response::Response;
pub use status::StatusCode;

/// Valor del header `Server` y de `SERVER_SOFTWARE`
pub const SERVER_SOFTWARE: &str = concat!("Frask/", env!("CARGO_PKG_VERSION"));

/// Prefijo de las claves internas del environ
///
/// Las claves con este prefijo nunca se exportan al entorno de un script CGI.
pub const ENVIRON_PRIVATE_PREFIX: &str = "frask.";
