//! # Métodos HTTP
//! src/http/method.rs

use crate::error::RequestError;
use std::fmt;
use std::str::FromStr;

/// Métodos HTTP aceptados por el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    CONNECT,
    OPTIONS,
    TRACE,
    PATCH,
}

impl Method {
    /// Todos los métodos aceptados
    pub const ALL: [Method; 9] = [
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::CONNECT,
        Method::OPTIONS,
        Method::TRACE,
        Method::PATCH,
    ];

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::CONNECT => "CONNECT",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
            Method::PATCH => "PATCH",
        }
    }

    /// Indica si el método transporta body
    ///
    /// ```
    /// use frask::http::Method;
    /// assert!(Method::POST.has_body());
    /// assert!(!Method::GET.has_body());
    /// ```
    pub fn has_body(&self) -> bool {
        matches!(
            self,
            Method::POST | Method::PUT | Method::DELETE | Method::PATCH
        )
    }
}

impl FromStr for Method {
    type Err = RequestError;

    /// Parsea un método HTTP exacto (sensible a mayúsculas)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| RequestError::UnknownHttpMethod(s.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_methods() {
        for m in Method::ALL {
            assert_eq!(m.as_str().parse::<Method>(), Ok(m));
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!(matches!(
            "get".parse::<Method>(),
            Err(RequestError::UnknownHttpMethod(_))
        ));
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn test_has_body_set() {
        let with_body: Vec<_> = Method::ALL.iter().filter(|m| m.has_body()).collect();
        assert_eq!(
            with_body,
            vec![&Method::POST, &Method::PUT, &Method::DELETE, &Method::PATCH]
        );
    }
}
