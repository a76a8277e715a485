//! # Códigos de Estado HTTP
//!
//! Este módulo define los códigos de estado HTTP/1.1 reconocidos por el
//! servidor junto con su reason phrase y, para algunos errores, un body
//! HTML predefinido ("canned body").
//!
//! Un `StatusCode` solo puede construirse a partir de un código con reason
//! phrase conocida: [`StatusCode::from_u16`] falla con
//! `InvalidHttpResponseCode` para cualquier otro valor.

use crate::error::ResponseError;

/// Código de estado HTTP reconocido
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const MOVED_PERMANENTLY: StatusCode = StatusCode(301);
    pub const FOUND: StatusCode = StatusCode(302);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const FORBIDDEN: StatusCode = StatusCode(403);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const REQUEST_TIMEOUT: StatusCode = StatusCode(408);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const NOT_IMPLEMENTED: StatusCode = StatusCode(501);
    pub const BAD_GATEWAY: StatusCode = StatusCode(502);
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);

    /// Valida un código numérico
    ///
    /// # Ejemplo
    /// ```
    /// use frask::http::StatusCode;
    ///
    /// assert_eq!(StatusCode::from_u16(404).unwrap(), StatusCode::NOT_FOUND);
    /// assert!(StatusCode::from_u16(299).is_err());
    /// ```
    pub fn from_u16(code: u16) -> Result<Self, ResponseError> {
        if reason_phrase(code).is_some() {
            Ok(StatusCode(code))
        } else {
            Err(ResponseError::InvalidHttpResponseCode(code))
        }
    }

    /// Convierte el código a su valor numérico
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// ```
    /// use frask::http::StatusCode;
    /// assert_eq!(StatusCode::OK.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::BAD_GATEWAY.reason_phrase(), "Bad Gateway");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        // Todo StatusCode se construyó validando el código
        reason_phrase(self.0).unwrap_or("Unknown")
    }

    /// Body HTML predefinido para algunos códigos de error
    pub fn canned_body(&self) -> Option<&'static str> {
        match self.0 {
            401 => Some("<html><body><h1>401 Unauthorized</h1></body></html>"),
            403 => Some("<html><body><h1>403 Forbidden</h1></body></html>"),
            404 => Some("<html><body><h1>404 Not Found</h1></body></html>"),
            405 => Some("<html><body><h1>405 Method Not Allowed</h1></body></html>"),
            408 => Some("<html><body><h1>408 Request Timeout</h1></body></html>"),
            501 => Some("<html><body><h1>501 Not Implemented</h1></body></html>"),
            502 => Some("<html><body><h1>502 Bad Gateway</h1></body></html>"),
            503 => Some("<html><body><h1>503 Service Unavailable</h1></body></html>"),
            _ => None,
        }
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = ResponseError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        StatusCode::from_u16(code)
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

fn reason_phrase(code: u16) -> Option<&'static str> {
    let phrase = match code {
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",
        103 => "Early Hints",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        208 => "Already Reported",
        226 => "IM Used",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        306 => "(Unused)",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Range Not Satisfiable",
        417 => "Expectation Failed",
        421 => "Misdirected Request",
        422 => "Unprocessable Entity",
        423 => "Locked",
        424 => "Failed Dependency",
        425 => "Too Early",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        451 => "Unavailable For Legal Reasons",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        508 => "Loop Detected",
        510 => "Not Extended",
        511 => "Network Authentication Required",
        _ => return None,
    };
    Some(phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_values() {
        assert_eq!(StatusCode::OK.as_u16(), 200);
        assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
        assert_eq!(StatusCode::BAD_GATEWAY.as_u16(), 502);
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        assert_eq!(
            StatusCode::from_u16(999),
            Err(ResponseError::InvalidHttpResponseCode(999))
        );
        assert!(StatusCode::try_from(427).is_err());
    }

    #[test]
    fn test_canned_bodies() {
        assert!(StatusCode::NOT_FOUND.canned_body().unwrap().contains("404 Not Found"));
        assert!(StatusCode::REQUEST_TIMEOUT.canned_body().is_some());
        assert!(StatusCode::OK.canned_body().is_none());
        assert!(StatusCode::BAD_REQUEST.canned_body().is_none());
    }

    #[test]
    fn test_classification() {
        assert!(!StatusCode::METHOD_NOT_ALLOWED.is_server_error());
        assert!(StatusCode::NOT_IMPLEMENTED.is_server_error());
        assert!(!StatusCode::OK.is_server_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::OK.to_string(), "200 OK");
        assert_eq!(StatusCode::REQUEST_TIMEOUT.to_string(), "408 Request Timeout");
    }
}
