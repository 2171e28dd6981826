//! # Logging
//! src/logging.rs
//!
//! Instala el subscriber de `tracing` para el binario. La librería solo emite
//! eventos; nunca instala un subscriber por su cuenta.
//!
//! `RUST_LOG` tiene prioridad sobre el filtro configurado.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Instala un subscriber global con salida formateada
///
/// `filter` usa la sintaxis de `RUST_LOG` (ej: `"minihttpd=debug"`). Si no
/// es válido se usa `info`.
///
/// # Errores
///
/// Falla si ya había un subscriber global instalado.
pub fn init_logging(filter: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(build_filter(filter))
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .try_init()
}

fn build_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
