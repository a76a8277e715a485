//! # Normalización de Retornos de Handlers
//! src/application/reply.rs
//!
//! Un handler puede retornar cualquier tipo que implemente [`IntoResponse`].
//! Todo lo que no es una `Response` se convierte en un `200 OK` con el valor
//! como body.
//!
//! ```
//! use frask::application::IntoResponse;
//! use frask::http::StatusCode;
//!
//! let response = (201u16, "created").into_response();
//! assert_eq!(response.status(), StatusCode::CREATED);
//!
//! // Un código desconocido termina en 502
//! let response = (299u16, "?").into_response();
//! assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
//! ```

use crate::http::{Response, StatusCode};
use std::fmt::Display;
use tracing::error;

/// Conversión del valor de retorno de un handler a una `Response`
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::new(StatusCode::OK).with_body_bytes(self.into_bytes())
    }
}

impl IntoResponse for &str {
    fn into_response(self) -> Response {
        Response::new(StatusCode::OK).with_body(self)
    }
}

impl IntoResponse for Vec<u8> {
    fn into_response(self) -> Response {
        Response::new(StatusCode::OK).with_body_bytes(self)
    }
}

/// Body vacío
impl IntoResponse for () {
    fn into_response(self) -> Response {
        Response::new(StatusCode::OK).with_body("")
    }
}

impl<B: IntoResponse> IntoResponse for (StatusCode, B) {
    fn into_response(self) -> Response {
        let (status, body) = self;
        body.into_response().with_status(status)
    }
}

impl<B: IntoResponse> IntoResponse for (u16, B) {
    fn into_response(self) -> Response {
        let (code, body) = self;
        match StatusCode::from_u16(code) {
            Ok(status) => (status, body).into_response(),
            Err(e) => {
                error!(error = %e, "Handler returned an unknown status code");
                Response::new(StatusCode::BAD_GATEWAY)
            }
        }
    }
}

impl IntoResponse for serde_json::Value {
    fn into_response(self) -> Response {
        Response::json(&self.to_string())
    }
}

/// `Err` se registra y produce un 502
impl<T, E> IntoResponse for Result<T, E>
where
    T: IntoResponse,
    E: Display,
{
    fn into_response(self) -> Response {
        match self {
            Ok(value) => value.into_response(),
            Err(e) => {
                error!(error = %e, "Handler failed");
                Response::new(StatusCode::BAD_GATEWAY)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_passes_through() {
        let original = Response::new(StatusCode::NO_CONTENT).with_header("X-A", "1");
        assert_eq!(original.clone().into_response(), original);
    }

    #[test]
    fn test_strings_become_200() {
        let response = "hola".into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), Some(&b"hola"[..]));

        let response = String::from("mundo").into_response();
        assert_eq!(response.body(), Some(&b"mundo"[..]));
    }

    #[test]
    fn test_unit_is_empty_200() {
        let response = ().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), Some(&b""[..]));
    }

    #[test]
    fn test_code_and_body_tuple() {
        let response = (404u16, "missing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body(), Some(&b"missing"[..]));

        let response = (StatusCode::CREATED, String::from("ok")).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_invalid_code_becomes_bad_gateway() {
        let response = (999u16, "x").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_json_value() {
        let response = json!({"ok": true}).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Content-Type"), Some("application/json"));
        assert_eq!(response.body(), Some(&br#"{"ok":true}"#[..]));
    }

    #[test]
    fn test_result_err_becomes_bad_gateway() {
        let ok: Result<&str, String> = Ok("fine");
        assert_eq!(ok.into_response().status(), StatusCode::OK);

        let err: Result<&str, String> = Err("boom".into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
