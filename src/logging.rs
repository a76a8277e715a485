//! # Logging
//! src/logging.rs
//!
//! Inicializa `tracing-subscriber` con un `EnvFilter` y la capa `fmt`.
//! `RUST_LOG`, si está definido, tiene prioridad sobre el nivel configurado.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Instala el subscriber global
///
/// Llamadas posteriores no tienen efecto (útil en tests).
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("frask={}", level)))
        .unwrap_or_else(|_| EnvFilter::new("frask=info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init("debug");
        init("not a level");
        tracing::info!("logging initialised");
    }
}
