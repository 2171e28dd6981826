//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto (socket2, backlog configurable)
//! 2. Acepta conexiones y las encola en el pool de workers
//! 3. Lee y parsea un request por conexión
//! 4. Evalúa las rutas y cierra el socket

pub mod connection;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use connection::{handle_connection, ConnectionOutcome};
pub use tcp::{BoundServer, HttpServer};
