//! # Bodies de Request
//! src/http/body.rs
//!
//! El body de un request se decodifica según su `Content-Type` usando un
//! registro `content-type → decoder`. El registro se llena durante el setup
//! y se comparte como solo-lectura entre los workers.
//!
//! Registros por defecto:
//!
//! | Content-Type                        | Resultado       |
//! |-------------------------------------|-----------------|
//! | `text/html`, `text/plain`, `text/css`, `text/javascript` | `Body::Text` |
//! | `application/x-www-form-urlencoded` | `Body::Form`    |
//! | `application/json`                  | `Body::Json`    |
//!
//! Un content-type sin decoder registrado pasa el texto sin cambios.

use super::decode::url_decode;
use super::FieldMap;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Body decodificado de un request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// El método no transporta body
    #[default]
    Empty,

    /// Texto sin transformar
    Text(String),

    /// Pares `key=value` de un formulario
    Form(FieldMap),

    /// Documento JSON
    Json(serde_json::Value),
}

impl Body {
    /// Representación textual si el body es texto plano
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_form(&self) -> Option<&FieldMap> {
        match self {
            Body::Form(form) => Some(form),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

impl PartialEq<&str> for Body {
    fn eq(&self, other: &&str) -> bool {
        self.as_text() == Some(*other)
    }
}

/// Función que decodifica el texto de un body
pub type BodyDecoder = Arc<dyn Fn(&str) -> Result<Body> + Send + Sync>;

/// Decoder que deja el texto intacto
pub fn text_decoder(raw: &str) -> Result<Body> {
    Ok(Body::Text(raw.to_string()))
}

/// Decoder de formularios `application/x-www-form-urlencoded`
pub fn form_decoder(raw: &str) -> Result<Body> {
    Ok(Body::Form(url_decode(raw, "&")))
}

/// Decoder JSON basado en `serde_json`
pub fn json_decoder(raw: &str) -> Result<Body> {
    serde_json::from_str(raw)
        .map(Body::Json)
        .map_err(|e| Error::Decode(format!("invalid JSON body: {}", e)))
}

/// Registro content-type → decoder
#[derive(Clone)]
pub struct BodyRegistry {
    decoders: HashMap<String, BodyDecoder>,
}

impl BodyRegistry {
    /// Registro vacío: todos los bodies pasan como texto
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Agrega o reemplaza el decoder de un content-type
    pub fn register<F>(&mut self, content_type: &str, decoder: F)
    where
        F: Fn(&str) -> Result<Body> + Send + Sync + 'static,
    {
        self.decoders
            .insert(content_type.to_string(), Arc::new(decoder));
    }

    pub fn contains(&self, content_type: &str) -> bool {
        self.decoders.contains_key(content_type)
    }

    /// Decodifica un body según su content-type (sin parámetros)
    pub fn decode(&self, content_type: &str, raw: &str) -> Result<Body> {
        match self.decoders.get(content_type) {
            Some(decoder) => decoder(raw),
            None => text_decoder(raw),
        }
    }
}

impl Default for BodyRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for content_type in ["text/html", "text/plain", "text/css", "text/javascript"] {
            registry.register(content_type, text_decoder);
        }
        registry.register("application/x-www-form-urlencoded", form_decoder);
        registry.register("application/json", json_decoder);
        registry
    }
}

impl fmt::Debug for BodyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.decoders.keys().collect();
        types.sort();
        f.debug_struct("BodyRegistry").field("content_types", &types).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_type_passes_text() {
        let registry = BodyRegistry::default();
        let body = registry.decode("application/octet-stream", "raw").unwrap();
        assert_eq!(body, Body::Text("raw".into()));
    }

    #[test]
    fn test_form_decoder() {
        let registry = BodyRegistry::default();
        let body = registry
            .decode("application/x-www-form-urlencoded", "name=Ana%20Mora&age=30")
            .unwrap();
        let form = body.as_form().unwrap();
        assert_eq!(form.get("name"), Some("Ana Mora"));
        assert_eq!(form.get("age"), Some("30"));
    }

    #[test]
    fn test_json_decoder_rejects_invalid_input() {
        let registry = BodyRegistry::default();
        let ok = registry.decode("application/json", r#"{"a": 1}"#).unwrap();
        assert_eq!(ok.as_json().unwrap()["a"], 1);

        let err = registry.decode("application/json", "{oops").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_register_overrides_existing() {
        let mut registry = BodyRegistry::default();
        registry.register("text/plain", |raw| Ok(Body::Text(raw.to_uppercase())));
        let body = registry.decode("text/plain", "hola").unwrap();
        assert_eq!(body, "HOLA");
    }
}
