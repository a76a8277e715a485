//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un socket no bloqueante con backlog configurable
//! 2. Multiplexa el listener y las conexiones con `mio`
//! 3. Atiende cada conexión lista en un thread propio
//! 4. Lee, parsea, responde y cierra la conexión

pub mod socket;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use tcp::{HttpServer, ServerHandle};
