//! # Parsing de Requests HTTP/1.1
//! src/http/request.rs
//!
//! Este módulo implementa un parser HTTP/1.1 desde cero.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /form?lang=es HTTP/1.1\r\n
//! Host: localhost:15014\r\n
//! Content-Type: application/x-www-form-urlencoded\r\n
//! Content-Length: 9\r\n
//! Cookie: session=abc; theme=dark\r\n
//! \r\n
//! name=Ana
//! ```
//!
//! ## Pasos
//!
//! 1. **Request Line**: `METHOD /path?query VERSION`
//! 2. **Query string**: decodificada como pares `key=value`
//! 3. **Headers**: `Name: Value` hasta la línea vacía
//! 4. **Environ**: metadatos estilo CGI derivados del request
//! 5. **Body**: solo para POST, PUT, DELETE y PATCH; decodificado según
//!    `Content-Type` con el [`BodyRegistry`]
//! 6. **Cookies**: header `Cookie` decodificado con separador `"; "`
//!
//! El parsing es de una sola pasada y asume que el request completo llegó
//! en una sola lectura del socket.

use super::body::{Body, BodyRegistry};
use super::decode::{unquote, url_decode};
use super::{FieldMap, Method, ENVIRON_PRIVATE_PREFIX, SERVER_SOFTWARE};
use crate::error::{Error, RequestError, Result};
use std::net::SocketAddr;
use std::sync::OnceLock;

/// Representa un request HTTP parseado
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP
    method: Method,

    /// URL tal como llegó en la request line (ej: "/hello?x=1")
    url: String,

    /// Path decodificado, sin query (ej: "/hello")
    path: String,

    /// Query string cruda (ej: "x=1")
    query: String,

    /// Query parameters decodificados
    query_params: FieldMap,

    /// Cookies decodificadas
    cookies: FieldMap,

    /// Headers con el case con el que llegaron
    headers: FieldMap,

    /// Versión HTTP (ej: "HTTP/1.1")
    version: String,

    /// Body decodificado
    body: Body,

    /// Variables estilo CGI derivadas del request
    environ: FieldMap,

    /// Nombre y puerto del servidor según el header `Host`
    host: Option<(String, u16)>,

    /// Dirección del cliente
    remote: Option<SocketAddr>,
}

impl Request {
    /// Parsea un request usando los decoders de body por defecto
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use frask::http::{Method, Request};
    ///
    /// let raw = b"GET /hello?x=1 HTTP/1.1\r\nHost: h:80\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.method(), Method::GET);
    /// assert_eq!(request.path(), "/hello");
    /// assert_eq!(request.query_param("x"), Some("1"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        static DEFAULT_REGISTRY: OnceLock<BodyRegistry> = OnceLock::new();
        let registry = DEFAULT_REGISTRY.get_or_init(BodyRegistry::default);
        Self::parse_with(buffer, registry, None)
    }

    /// Parsea un request con un registro de decoders y la dirección del peer
    ///
    /// # Errores
    ///
    /// - `Error::Request(..)`: request line, método o headers inválidos
    /// - `Error::Decode(..)`: UTF-8 inválido, `Content-Length` no numérico
    ///   o un decoder de body que rechazó su entrada
    pub fn parse_with(
        buffer: &[u8],
        registry: &BodyRegistry,
        remote: Option<SocketAddr>,
    ) -> Result<Self> {
        let text = std::str::from_utf8(buffer)
            .map_err(|e| Error::Decode(format!("request is not valid UTF-8: {}", e)))?;

        let mut lines = text.trim().split("\r\n");

        // 1. Request line
        let request_line = lines.next().unwrap_or_default();
        let (method, url, version) = Self::parse_request_line(request_line)?;

        // 2. Path y query
        let (raw_path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
        let path = unquote(raw_path);
        if !path.starts_with('/') {
            return Err(RequestError::InvalidBasicLine(request_line.to_string()).into());
        }
        let query = query.to_string();
        let query_params = url_decode(&query, "&");

        // 3. Headers
        let headers = Self::parse_headers(&mut lines)?;
        let host = Self::parse_host(&headers)?;

        let mut request = Request {
            method,
            url,
            path,
            query,
            query_params,
            cookies: FieldMap::new(),
            headers,
            version,
            body: Body::Empty,
            environ: FieldMap::new(),
            host,
            remote,
        };

        // 4. Environ
        request.environ = request.build_environ();

        // 5. Body: el resto de líneas
        let remaining: Vec<&str> = lines.collect();
        request.body = request.parse_body(&remaining.join("\r\n"), registry)?;

        // 6. Cookies
        if let Some(cookie) = request.header("Cookie").filter(|c| !c.is_empty()) {
            request.cookies = url_decode(cookie, "; ");
        }

        Ok(request)
    }

    /// Formato: `METHOD PATH VERSION`
    fn parse_request_line(line: &str) -> Result<(Method, String, String)> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        // Debe tener exactamente 3 partes
        let &[method, url, version] = parts.as_slice() else {
            return Err(RequestError::InvalidBasicLine(line.to_string()).into());
        };

        let method: Method = method.parse()?;
        Ok((method, url.to_string(), version.to_string()))
    }

    /// Consume headers hasta la primera línea vacía
    ///
    /// Cada línea se separa una sola vez en `": "`.
    fn parse_headers<'a, I>(lines: &mut I) -> Result<FieldMap>
    where
        I: Iterator<Item = &'a str>,
    {
        let mut headers = FieldMap::new();

        for line in lines.by_ref() {
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(": ").ok_or_else(|| {
                RequestError::InvalidRequest(format!("malformed header: {:?}", line))
            })?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    /// Extrae nombre y puerto del header `Host`
    ///
    /// Sin puerto se asume 80; un puerto no numérico es un request inválido.
    fn parse_host(headers: &FieldMap) -> Result<Option<(String, u16)>> {
        let Some(host) = headers.get_ignore_case("Host").map(str::trim) else {
            return Ok(None);
        };

        let split = match host.rsplit_once(':') {
            // "[::1]" sin puerto
            Some(_) if host.ends_with(']') => None,
            other => other,
        };

        match split {
            Some((name, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    RequestError::InvalidRequest(format!("invalid port in Host header: {:?}", host))
                })?;
                Ok(Some((name.to_string(), port)))
            }
            None => Ok(Some((host.to_string(), 80))),
        }
    }

    fn parse_body(&self, raw: &str, registry: &BodyRegistry) -> Result<Body> {
        if !self.method.has_body() {
            return Ok(Body::Empty);
        }

        let content_length = match self.header("Content-Length") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|_| Error::Decode(format!("invalid Content-Length: {:?}", value)))?,
            None => raw.len(),
        };

        let mut end = content_length.min(raw.len());
        while !raw.is_char_boundary(end) {
            end -= 1;
        }

        let content_type = self
            .header("Content-Type")
            .unwrap_or("text/plain")
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();

        registry.decode(content_type, &raw[..end])
    }

    /// Variables estilo CGI para handlers y scripts
    fn build_environ(&self) -> FieldMap {
        let mut environ = FieldMap::new();

        // Campos internos, nunca se exportan a procesos hijos
        let private = |key: &str| format!("{}{}", ENVIRON_PRIVATE_PREFIX, key);
        environ.insert(private("version"), env!("CARGO_PKG_VERSION"));
        environ.insert(private("url_scheme"), "http");
        environ.insert(private("multithread"), "true");
        environ.insert(private("multiprocess"), "false");
        environ.insert(private("run_once"), "true");

        let script_name = self.path.rsplit('/').next().unwrap_or_default();

        environ.insert("GATEWAY_INTERFACE", "CGI/1.1");
        environ.insert("REQUEST_METHOD", self.method.as_str());
        environ.insert("SCRIPT_FILENAME", self.path.as_str());
        environ.insert("SCRIPT_NAME", script_name);
        environ.insert("PATH_INFO", path_info(&self.path, script_name));
        environ.insert("QUERY_STRING", self.query.as_str());
        environ.insert(
            "CONTENT_LENGTH",
            self.header("Content-Length").unwrap_or("0"),
        );
        if let Some(content_type) = self.header("Content-Type") {
            environ.insert("CONTENT_TYPE", content_type);
        }
        environ.insert("SERVER_PROTOCOL", self.version.as_str());
        environ.insert("SERVER_SOFTWARE", SERVER_SOFTWARE);

        if let Some((name, port)) = &self.host {
            environ.insert("SERVER_NAME", name.as_str());
            environ.insert("SERVER_PORT", port.to_string());
            environ.insert("HTTP_HOST", format!("{}:{}", name, port));
        }
        if let Some(remote) = self.remote {
            environ.insert("REMOTE_ADDR", remote.ip().to_string());
            environ.insert("REMOTE_PORT", remote.port().to_string());
        }

        environ.insert("HTTP_VERSION", self.version.as_str());
        environ.insert("HTTP_USER_AGENT", self.header("User-Agent").unwrap_or(""));
        environ.insert("HTTP_COOKIE", self.header("Cookie").unwrap_or(""));

        environ
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> Method {
        self.method
    }

    /// URL completa de la request line
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Obtiene el path decodificado del request
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query string sin decodificar
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Obtiene todos los query parameters
    pub fn query_params(&self) -> &FieldMap {
        &self.query_params
    }

    /// Obtiene un query parameter específico
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name)
    }

    pub fn cookies(&self) -> &FieldMap {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name)
    }

    /// Obtiene todos los headers
    pub fn headers(&self) -> &FieldMap {
        &self.headers
    }

    /// Obtiene un header (el nombre no distingue mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get_ignore_case(name)
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Obtiene el body decodificado
    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn environ(&self) -> &FieldMap {
        &self.environ
    }

    /// Nombre y puerto del servidor según el header `Host`
    pub fn host(&self) -> Option<(&str, u16)> {
        self.host.as_ref().map(|(name, port)| (name.as_str(), *port))
    }

    pub fn remote(&self) -> Option<SocketAddr> {
        self.remote
    }

    /// Request line reconstruida, para logs
    pub fn request_line(&self) -> String {
        format!("{} {} {}", self.method, self.url, self.version)
    }
}

/// PATH_INFO: el path sin ninguna aparición del nombre del script
///
/// Es una operación con pérdida cuando el nombre se repite dentro del path
/// (`/a/a` con script `a` produce `//`); se conserva ese comportamiento.
fn path_info(path: &str, script_name: &str) -> String {
    if script_name.is_empty() {
        return path.to_string();
    }
    path.replace(script_name, "")
}
