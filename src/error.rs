//! # Errores del Servidor
//! src/error.rs
//!
//! Taxonomía de errores en tres familias:
//!
//! - [`RequestError`]: bytes mal formados en el cable. En la frontera de la
//!   conexión siempre se convierten en un `501 Not Implemented`.
//! - [`ResponseError`]: error de programación o configuración al construir
//!   una respuesta. Falla en voz alta.
//! - [`ApplicationError`]: condiciones de routing/setup o por request, cada
//!   una mapeada a un código de estado concreto.
//!
//! [`Error`] agrupa los errores de request y de aplicación más los fallos
//! que no son de protocolo (I/O, decodificación). `ResponseError` no entra:
//! se resuelve donde se construye la respuesta.

use std::path::PathBuf;
use thiserror::Error;

/// Errores de parsing del request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Header sin separador `": "` o campo con formato inválido
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// La request line no tiene exactamente `METHOD PATH VERSION`
    #[error("invalid request line: {0:?}")]
    InvalidBasicLine(String),

    /// Método fuera del conjunto aceptado
    #[error("unknown HTTP method: {0}")]
    UnknownHttpMethod(String),
}

/// Errores al construir una respuesta
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    #[error("invalid HTTP response code: {0}")]
    InvalidHttpResponseCode(u16),
}

/// Errores de la capa de aplicación
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationError {
    /// Método desconocido al registrar una ruta
    #[error("unknown HTTP method: {0}")]
    UnknownHttpMethod(String),

    /// El directorio de trabajo no existe o no es un directorio
    #[error("invalid working directory: {}", .0.display())]
    InvalidWorkDir(PathBuf),

    /// El path está registrado pero no para este método
    #[error("no suitable method {method} for {path}")]
    NoSuitableMethod { path: String, method: String },

    /// El path nunca fue registrado
    #[error("path not registered: {0}")]
    PathNotFound(String),

    /// Fallo lanzando o leyendo un script CGI
    #[error("CGI execution failed: {0}")]
    CgiExecuting(String),
}

/// Error de nivel superior del crate
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fallos de decodificación que no son errores de protocolo
    /// (UTF-8 inválido, Content-Length no numérico, body rechazado)
    #[error("decode error: {0}")]
    Decode(String),
}

impl Error {
    /// Indica si el error proviene de bytes mal formados en el cable
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Error::Request(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_classification() {
        let err: Error = RequestError::InvalidBasicLine("GET".into()).into();
        assert!(err.is_protocol_error());

        let err = Error::Decode("bad utf-8".into());
        assert!(!err.is_protocol_error());

        let err: Error = std::io::Error::from(std::io::ErrorKind::AddrInUse).into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_protocol_error());

        let err: Error = ApplicationError::UnknownHttpMethod("GRAB".into()).into();
        assert!(matches!(err, Error::Application(_)));
    }

    #[test]
    fn test_display_messages() {
        let err = ApplicationError::NoSuitableMethod {
            path: "/x".into(),
            method: "POST".into(),
        };
        assert_eq!(err.to_string(), "no suitable method POST for /x");
        assert_eq!(
            ResponseError::InvalidHttpResponseCode(999).to_string(),
            "invalid HTTP response code: 999"
        );
    }
}
