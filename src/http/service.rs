//! # Archivos estáticos
//! src/http/service.rs
//!
//! Constructores de rutas que sirven un archivo del disco.
//!
//! - `serve_file`: abre el archivo en cada request y lo envía en bloques
//! - `serve_file_cached`: lee el archivo una sola vez al crear la ruta y
//!   agrega un `ETag` con el SHA-256 del contenido
//!
//! Si el archivo no existe se responde el 404 por defecto.

use super::headers::names;
use super::HttpHeader;
use crate::error::HttpError;
use crate::router::{MatchStrategy, Route, RouteHandling};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tamaño de bloque para enviar archivos
const CHUNK_SIZE: usize = 4096;

/// Ruta que sirve un archivo leyéndolo en cada request
///
/// # Ejemplo
/// ```no_run
/// use minihttpd::http::service::serve_file;
/// use minihttpd::router::{MatchStrategy, Router};
///
/// let mut router = Router::new();
/// router.add_route(
///     serve_file("/example.html", "static/example.html", "text/html", MatchStrategy::Exact, Vec::new()).unwrap(),
/// );
/// ```
pub fn serve_file(
    pattern: &str,
    path: impl AsRef<Path>,
    content_type: &str,
    strategy: MatchStrategy,
    extra_headers: Vec<HttpHeader>,
) -> Result<Route, HttpError> {
    let path: PathBuf = path.as_ref().to_path_buf();
    let content_type = content_type.to_string();

    Route::new(pattern, strategy, move |_req, res| {
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Archivo no disponible");
                res.send_default_404()?;
                return Ok(RouteHandling::End);
            }
        };

        let size = file
            .metadata()
            .map_err(|e| HttpError::HandlerFailed(format!("{}: {}", path.display(), e)))?
            .len();

        res.set_header(names::CONTENT_TYPE, &content_type);
        res.set_header(names::CONTENT_LENGTH, &size.to_string());
        for header in &extra_headers {
            res.headers_mut().set_header(header.clone());
        }
        res.send_headers()?;

        let mut buffer = [0u8; CHUNK_SIZE];
        loop {
            let n = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(HttpError::HandlerFailed(format!("{}: {}", path.display(), e)));
                }
            };
            res.send_body(&buffer[..n])?;
        }

        Ok(RouteHandling::End)
    })
}

/// Ruta que sirve un archivo cargado en memoria
///
/// El contenido se lee una sola vez; cambios posteriores en el disco no se
/// ven. Si el archivo no existe al crear la ruta, todas las requests
/// reciben el 404 por defecto.
pub fn serve_file_cached(
    pattern: &str,
    path: impl AsRef<Path>,
    content_type: &str,
    strategy: MatchStrategy,
    extra_headers: Vec<HttpHeader>,
) -> Result<Route, HttpError> {
    let path = path.as_ref();
    let data = match fs::read(path) {
        Ok(data) => Some(data),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "No se pudo cargar el archivo para cache");
            None
        }
    };

    let etag = data.as_deref().map(content_etag);
    let content_type = content_type.to_string();

    Route::new(pattern, strategy, move |_req, res| {
        let (Some(data), Some(etag)) = (&data, &etag) else {
            res.send_default_404()?;
            return Ok(RouteHandling::End);
        };

        res.set_header(names::CONTENT_TYPE, &content_type);
        res.set_header(names::CONTENT_LENGTH, &data.len().to_string());
        res.set_header(names::ETAG, etag);
        for header in &extra_headers {
            res.headers_mut().set_header(header.clone());
        }
        res.send_headers()?;
        res.send_body(data)?;

        Ok(RouteHandling::End)
    })
}

/// ETag fuerte: SHA-256 del contenido en hexadecimal, entre comillas
fn content_etag(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("\"{:x}\"", hasher.finalize())
}
