//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Este módulo implementa el router que mapea pares (path, método) a handlers.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Router → Handler → Response
//! ```
//!
//! El match es por string exacto del path. El router distingue dos fallos:
//!
//! - `PathNotFound`: el path nunca fue registrado (la aplicación intenta
//!   entonces servir un archivo estático o un script CGI)
//! - `NoSuitableMethod`: el path existe pero no para ese método (405)
//!
//! El router se llena durante el setup y después solo se lee.

use crate::error::ApplicationError;
use crate::http::{Method, Request, Response};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Tipo de función handler
///
/// Un handler recibe un Request y retorna una Response. Se guarda detrás de
/// un `Arc` porque varios métodos de un mismo path comparten el handler.
pub type Handler = Arc<dyn Fn(&Request) -> Response + Send + Sync>;

/// Router que mapea (path, método) a handlers
#[derive(Default, Clone)]
pub struct Router {
    /// Métodos registrados por path
    paths: HashMap<String, HashSet<Method>>,

    /// Handler por par (path, método)
    handlers: HashMap<(String, Method), Handler>,
}

impl Router {
    /// Crea un nuevo router vacío
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un handler para cada método indicado
    ///
    /// Un par (path, método) ya existente se sobrescribe. Si algún método no
    /// es válido no se registra nada.
    ///
    /// # Ejemplo
    /// ```
    /// use std::sync::Arc;
    /// use frask::router::Router;
    /// use frask::http::{Method, Request, Response, StatusCode};
    ///
    /// let mut router = Router::new();
    /// router
    ///     .add_record("/hello", ["GET", "HEAD"], Arc::new(|_req: &Request| {
    ///         Response::new(StatusCode::OK).with_body("hi")
    ///     }))
    ///     .unwrap();
    ///
    /// assert!(router.match_route("/hello", Method::GET).is_ok());
    /// assert!(router.add_record("/x", ["FETCH"], Arc::new(|_req: &Request| {
    ///     Response::new(StatusCode::OK)
    /// })).is_err());
    /// ```
    pub fn add_record<I, S>(
        &mut self,
        path: &str,
        methods: I,
        handler: Handler,
    ) -> Result<(), ApplicationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // Validar todo antes de tocar el router
        let methods = methods
            .into_iter()
            .map(|m| {
                m.as_ref()
                    .parse::<Method>()
                    .map_err(|_| ApplicationError::UnknownHttpMethod(m.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for method in methods {
            self.paths.entry(path.to_string()).or_default().insert(method);
            self.handlers
                .insert((path.to_string(), method), Arc::clone(&handler));
        }

        Ok(())
    }

    /// Busca el handler de un par (path, método)
    pub fn match_route(&self, path: &str, method: Method) -> Result<&Handler, ApplicationError> {
        let methods = self
            .paths
            .get(path)
            .ok_or_else(|| ApplicationError::PathNotFound(path.to_string()))?;

        if !methods.contains(&method) {
            return Err(ApplicationError::NoSuitableMethod {
                path: path.to_string(),
                method: method.to_string(),
            });
        }

        self.handlers
            .get(&(path.to_string(), method))
            .ok_or_else(|| ApplicationError::PathNotFound(path.to_string()))
    }

    /// Métodos registrados para un path, ordenados
    pub fn methods_for(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .paths
            .get(path)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        methods.sort();
        methods
    }

    /// Cantidad de pares (path, método) registrados
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<_> = self.paths.keys().collect();
        paths.sort();
        f.debug_struct("Router").field("paths", &paths).finish()
    }
}
