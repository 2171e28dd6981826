//! # Módulo HTTP
//!
//! Implementa el subconjunto de HTTP/1.x que necesita el servidor, sin usar
//! librerías de alto nivel. Incluye:
//!
//! - Lectura y parsing del head del request
//! - Mapa de headers case-insensitive
//! - Construcción y envío de responses
//! - Status codes con nombre
//! - Handlers listos para servir archivos estáticos
//!
//! Cada conexión atiende un solo request: no hay keep-alive, chunked
//! encoding ni pipelining.
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html; charset=utf-8\r\n
//! Content-Length: 13\r\n
//! \r\n
//! <h1>hola</h1>
//! ```

pub mod headers;   // Headers y mapa case-insensitive
pub mod parser;    // Lectura y parsing del head
pub mod request;   // Request parseado
pub mod response;  // Construcción de HTTP responses
pub mod service;   // Handlers de archivos estáticos
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
// Esto permite usar `http::Request` en vez de `http::request::Request`
pub use headers::{HeaderMap, HttpHeader};
pub use parser::ParseError;
pub use request::Request;
pub use response::Response;
pub use status::StatusCode;
