//! # Errores del Servidor
//! src/error.rs
//!
//! Un único tipo de error para toda la librería. Cada variante pertenece a
//! una categoría (`ErrorKind`) que decide la política de recuperación:
//!
//! - **Setup**: fallos antes de empezar a servir (IP inválida, bind, regex).
//!   Fatales, nunca se reintentan.
//! - **Accept**: el socket de escucha se rompió. Fatal para `serve_forever`.
//! - **Connection**: problemas de una sola conexión (request malformado,
//!   envío fallido, handler con error). Se registran y se cierra el socket.
//! - **Misuse**: errores de programación (semáforo invalidado, pool cerrado).

use crate::http::parser::ParseError;
use std::io;
use thiserror::Error;

/// Categoría de un error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Setup,
    Accept,
    Connection,
    Misuse,
}

/// Errores que puede producir el servidor
#[derive(Debug, Error)]
pub enum HttpError {
    /// La dirección de bind no es una IPv4 válida
    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(String),

    /// No se pudo crear el socket de escucha
    #[error("opening socket failed: {0}")]
    SocketOpen(#[source] io::Error),

    /// No se pudo hacer bind/listen del socket
    #[error("binding socket failed: {0}")]
    SocketBind(#[source] io::Error),

    /// Patrón de ruta que no compila como regex
    #[error("invalid route pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// No se pudo lanzar un thread worker
    #[error("spawning worker thread failed: {0}")]
    WorkerSpawn(#[source] io::Error),

    /// Fallo en accept(); el loop de aceptación no puede continuar
    #[error("accepting connection failed: {0}")]
    Accept(#[source] io::Error),

    /// El head del request no se pudo parsear
    #[error("bad request: {0}")]
    BadRequest(#[from] ParseError),

    /// Escritura incompleta o error del sistema operativo al enviar
    #[error("transmission failed: {0}")]
    TransmissionFailed(#[source] io::Error),

    /// Error reportado por un handler de usuario
    #[error("handler failed: {0}")]
    HandlerFailed(String),

    /// `submit` después de `shutdown`
    #[error("pool closed: can't add task after shutdown")]
    PoolClosed,

    /// Operación sobre un semáforo cuyo estado fue movido
    #[error("semaphore used after invalidation")]
    SemaphoreInvalidated,
}

impl HttpError {
    /// Retorna la categoría del error
    pub fn kind(&self) -> ErrorKind {
        match self {
            HttpError::InvalidAddress(_)
            | HttpError::SocketOpen(_)
            | HttpError::SocketBind(_)
            | HttpError::InvalidPattern { .. }
            | HttpError::WorkerSpawn(_) => ErrorKind::Setup,
            HttpError::Accept(_) => ErrorKind::Accept,
            HttpError::BadRequest(_)
            | HttpError::TransmissionFailed(_)
            | HttpError::HandlerFailed(_) => ErrorKind::Connection,
            HttpError::PoolClosed | HttpError::SemaphoreInvalidated => ErrorKind::Misuse,
        }
    }

    /// Indica si el error solo afecta a una conexión
    pub fn is_connection_local(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(HttpError::InvalidAddress("x".into()).kind(), ErrorKind::Setup);
        assert_eq!(
            HttpError::Accept(io::Error::from(io::ErrorKind::Other)).kind(),
            ErrorKind::Accept
        );
        assert_eq!(
            HttpError::TransmissionFailed(io::Error::from(io::ErrorKind::BrokenPipe)).kind(),
            ErrorKind::Connection
        );
        assert_eq!(HttpError::PoolClosed.kind(), ErrorKind::Misuse);
        assert_eq!(HttpError::SemaphoreInvalidated.kind(), ErrorKind::Misuse);
    }

    #[test]
    fn test_bad_request_from_parse_error() {
        let err: HttpError = ParseError::InvalidRequestLine.into();
        assert!(err.is_connection_local());
        assert!(err.to_string().contains("Invalid request line"));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            HttpError::SemaphoreInvalidated.to_string(),
            "semaphore used after invalidation"
        );
        assert!(HttpError::InvalidAddress("300.1.1.1".into())
            .to_string()
            .contains("300.1.1.1"));
    }
}
