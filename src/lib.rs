//! # minihttpd
//! src/lib.rs
//!
//! Servidor HTTP/1.1 embebible: un thread acepta conexiones y un pool fijo
//! de workers las atiende, un request por conexión. Las rutas se comparan
//! por regex, prefijo, igualdad o "match any" (middleware).
//!
//! ## Arquitectura
//!
//! - `sync`: Semáforo contador (mutex + condvar)
//! - `pool`: Cola FIFO de tareas y pool de workers con backlog acotado
//! - `http`: Headers, parser del head, request, response y archivos estáticos
//! - `router`: Tabla ordenada de rutas con encadenamiento `Continue` / `End`
//! - `server`: Socket de escucha, loop de aceptación y manejo de conexiones
//! - `config`: Configuración por CLI y variables de entorno
//! - `logging`: Subscriber de `tracing` para el binario
//! - `error`: Tipo de error único con categorías
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use minihttpd::router::{MatchStrategy, RouteHandling};
//! use minihttpd::server::HttpServer;
//!
//! let mut server = HttpServer::new(8081, "0.0.0.0").unwrap();
//! server.route("/echo/(\\w+)", MatchStrategy::Regex, |req, res| {
//!     let body = format!("Echo:  {}", req.match_group(1).unwrap_or(""));
//!     res.send_all(body.as_bytes())?;
//!     Ok(RouteHandling::End)
//! }).unwrap();
//!
//! server.serve_forever().expect("Error al iniciar servidor");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod pool;
pub mod router;
pub mod server;
pub mod sync;

pub use error::{ErrorKind, HttpError};
pub use http::{HeaderMap, HttpHeader, Request, Response, StatusCode};
pub use router::{MatchStrategy, Route, RouteHandling, Router};
pub use server::{BoundServer, HttpServer};
