//! # Respuestas HTTP
//! src/http/response.rs
//!
//! La respuesta está atada a la conexión: el status y los headers se
//! acumulan en memoria y se escriben al llamar `send_headers()`. Después el
//! body se puede enviar en uno o varios `send_body()`.
//!
//! ## Formato en el wire
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html; charset=utf-8\r\n
//! Content-Length: 13\r\n
//! \r\n
//! Echo:  Hello
//! ```
//!
//! Modificar headers después de `send_headers()` no tiene efecto en el wire;
//! evitarlo es responsabilidad del handler.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use minihttpd::http::Response;
//!
//! let mut wire = Vec::new();
//! let mut response = Response::new(&mut wire);
//! response.headers_mut().set("Content-Type", "text/plain");
//! response.send_all(b"hola").unwrap();
//!
//! let text = String::from_utf8(wire).unwrap();
//! assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
//! assert!(text.ends_with("\r\n\r\nhola"));
//! ```

use super::headers::names;
use super::{HeaderMap, StatusCode};
use crate::error::HttpError;
use std::io::Write;

/// Content-Type con el que arranca toda respuesta
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Versión por defecto de la status line
pub const DEFAULT_VERSION: &str = "HTTP/1.1";

/// Respuesta fija para heads malformados
pub const BAD_REQUEST_RESPONSE: &[u8] = b"HTTP/1.1 400 Bad Request\r\n\r\n";

/// Body del 404 por defecto
const NOT_FOUND_BODY: &[u8] = b"404 Not found";

/// Escribe todos los bytes o falla con `TransmissionFailed`
pub(crate) fn write_fully(conn: &mut dyn Write, data: &[u8]) -> Result<(), HttpError> {
    conn.write_all(data)
        .and_then(|_| conn.flush())
        .map_err(HttpError::TransmissionFailed)
}

/// Respuesta HTTP asociada a una conexión
pub struct Response<'a> {
    /// Conexión sobre la que se escribe
    conn: &'a mut dyn Write,

    /// Código de estado (200 por defecto)
    status: u16,

    /// Reason phrase ("OK" por defecto)
    phrase: String,

    /// Versión HTTP de la status line
    version: String,

    /// Headers a enviar
    headers: HeaderMap,

    /// `true` después del primer `send_headers()`
    headers_sent: bool,

    /// Bytes de body enviados hasta ahora
    body_bytes: usize,
}

impl<'a> Response<'a> {
    /// Crea una respuesta 200 OK con el Content-Type por defecto
    pub fn new(conn: &'a mut dyn Write) -> Self {
        let mut headers = HeaderMap::new();
        headers.set(names::CONTENT_TYPE, DEFAULT_CONTENT_TYPE);

        Self {
            conn,
            status: StatusCode::Ok.as_u16(),
            phrase: StatusCode::Ok.reason_phrase().to_string(),
            version: DEFAULT_VERSION.to_string(),
            headers,
            headers_sent: false,
            body_bytes: 0,
        }
    }

    /// Cambia el código y la reason phrase
    pub fn set_status(&mut self, code: u16, phrase: &str) {
        self.status = code;
        self.phrase = phrase.to_string();
    }

    /// Cambia el status usando un código con nombre
    ///
    /// # Ejemplo
    /// ```
    /// use minihttpd::http::{Response, StatusCode};
    ///
    /// let mut sink = Vec::new();
    /// let mut response = Response::new(&mut sink);
    /// response.set_status_code(StatusCode::NotFound);
    ///
    /// assert_eq!(response.status(), 404);
    /// assert_eq!(response.phrase(), "Not Found");
    /// ```
    pub fn set_status_code(&mut self, status: StatusCode) {
        self.set_status(status.as_u16(), status.reason_phrase());
    }

    /// Cambia la versión HTTP de la status line
    pub fn set_version(&mut self, version: &str) {
        self.version = version.to_string();
    }

    /// Código de estado actual
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Reason phrase actual
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Versión HTTP actual
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Headers a enviar
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Headers a enviar (mutable)
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Atajo para `headers_mut().set(name, value)`
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.set(name, value);
    }

    /// Indica si el head ya fue escrito en la conexión
    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// Bytes de body enviados
    pub fn body_bytes(&self) -> usize {
        self.body_bytes
    }

    /// Serializa status line + headers + línea vacía
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut head = format!("{} {} {}\r\n", self.version, self.status, self.phrase);

        for header in self.headers.iter() {
            head.push_str(header.name());
            head.push_str(": ");
            head.push_str(header.value());
            head.push_str("\r\n");
        }

        head.push_str("\r\n");
        head.into_bytes()
    }

    /// Escribe el head completo en la conexión
    pub fn send_headers(&mut self) -> Result<(), HttpError> {
        let head = self.head_bytes();
        write_fully(self.conn, &head)?;
        self.headers_sent = true;
        Ok(())
    }

    /// Escribe bytes de body. Se puede llamar varias veces.
    pub fn send_body(&mut self, body: &[u8]) -> Result<(), HttpError> {
        write_fully(self.conn, body)?;
        self.body_bytes += body.len();
        Ok(())
    }

    /// Envía head y body de una vez
    ///
    /// Si el handler no fijó `Content-Length`, se agrega con el largo del
    /// body.
    pub fn send_all(&mut self, body: &[u8]) -> Result<(), HttpError> {
        if !self.headers.contains(names::CONTENT_LENGTH) {
            self.headers.set(names::CONTENT_LENGTH, &body.len().to_string());
        }
        self.send_headers()?;
        self.send_body(body)
    }

    /// Envía el 404 por defecto
    pub fn send_default_404(&mut self) -> Result<(), HttpError> {
        self.set_status(404, "Not found");
        self.headers.set(names::CONTENT_TYPE, "text/plain; charset=utf-8");
        self.headers.unset(names::CONTENT_LENGTH);
        self.send_all(NOT_FOUND_BODY)
    }
}
