//! # Construcción de Respuestas HTTP
//!
//! Este módulo proporciona una API para construir respuestas HTTP/1.1
//! de forma programática y convertirlas a bytes para enviar al cliente.
//!
//! ## Formato de una respuesta HTTP/1.1
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 2\r\n
//! \r\n
//! hi
//! ```
//!
//! Al serializar:
//! - `Content-Type` se completa con `text/html` si no fue definido.
//! - `Content-Length` siempre refleja el largo exacto del body en bytes.
//! - Si no se definió body y el código tiene un body predefinido
//!   (404, 405, 408, 501, 502...), se usa ese body.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use frask::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::OK).with_body("hi");
//! let text = String::from_utf8(response.to_bytes()).unwrap();
//! assert!(text.contains("Content-Length: 2\r\n"));
//! ```

use super::{FieldMap, StatusCode};
use crate::error::ResponseError;

/// Content-Type por defecto de las respuestas
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// Representa una respuesta HTTP/1.1 completa
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Código de estado HTTP (200, 404, etc.)
    status: StatusCode,

    /// Headers en orden de inserción
    headers: FieldMap,

    /// Cuerpo de la respuesta; `None` si nunca se definió
    body: Option<Vec<u8>>,
}

impl Response {
    /// Crea una nueva respuesta con el código de estado especificado
    ///
    /// Por defecto, la respuesta no tiene headers ni body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: FieldMap::new(),
            body: None,
        }
    }

    /// Crea una respuesta a partir de un código numérico
    ///
    /// Falla con `InvalidHttpResponseCode` si el código no es reconocido.
    ///
    /// ```
    /// use frask::http::Response;
    ///
    /// assert!(Response::from_code(200).is_ok());
    /// assert!(Response::from_code(299).is_err());
    /// ```
    pub fn from_code(code: u16) -> Result<Self, ResponseError> {
        Ok(Self::new(StatusCode::from_u16(code)?))
    }

    /// Cambia el código de estado conservando headers y body
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Agrega un header a la respuesta
    ///
    /// Si el header ya existe, se sobrescribe.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Agrega un header a una respuesta existente (versión mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name, value);
    }

    /// Reemplaza todos los headers
    pub fn with_headers(mut self, headers: FieldMap) -> Self {
        self.headers = headers;
        self
    }

    /// Establece el cuerpo de la respuesta desde un string
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.as_bytes().to_vec());
        self
    }

    /// Establece el cuerpo de la respuesta desde bytes
    ///
    /// Útil para respuestas binarias (imágenes, salida de scripts, etc.)
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Respuesta JSON exitosa (200 OK)
    pub fn json(body: &str) -> Self {
        Self::new(StatusCode::OK)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Body efectivo: el definido, el predefinido del código o vacío
    pub fn effective_body(&self) -> &[u8] {
        match &self.body {
            Some(body) => body,
            None => self
                .status
                .canned_body()
                .map(str::as_bytes)
                .unwrap_or_default(),
        }
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// Genera el formato completo HTTP/1.1:
    /// - Status line: `HTTP/1.1 200 OK\r\n`
    /// - Headers: `Header-Name: Value\r\n`
    /// - Línea vacía: `\r\n`
    /// - Body
    pub fn to_bytes(&self) -> Vec<u8> {
        let body = self.effective_body();
        let headers = self.final_headers(body.len());

        let mut result = Vec::with_capacity(128 + body.len());

        // 1. Status line
        result.extend_from_slice(format!("HTTP/1.1 {}\r\n", self.status).as_bytes());

        // 2. Headers
        for (name, value) in headers.iter() {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        // 3. Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");

        // 4. Body
        result.extend_from_slice(body);

        result
    }

    fn final_headers(&self, body_len: usize) -> FieldMap {
        let mut headers = FieldMap::new();
        let mut has_content_type = false;

        for (name, value) in self.headers.iter() {
            if name.eq_ignore_ascii_case("Content-Length") {
                continue;
            }
            if name.eq_ignore_ascii_case("Content-Type") {
                has_content_type = true;
            }
            headers.insert(name, value);
        }

        if !has_content_type {
            headers.insert("Content-Type", DEFAULT_CONTENT_TYPE);
        }
        headers.insert("Content-Length", body_len.to_string());
        headers
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Obtiene una referencia a los headers definidos por el llamador
    pub fn headers(&self) -> &FieldMap {
        &self.headers
    }

    /// Body definido explícitamente (sin sustituir el predefinido)
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}
