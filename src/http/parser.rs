//! # Parser del Head HTTP
//! src/http/parser.rs
//!
//! Lee del socket hasta encontrar el fin del head (`\r\n\r\n`) y lo
//! convierte en un `Request`.
//!
//! ## Formato
//!
//! ```text
//! GET /echo/Hello HTTP/1.1\r\n
//! Host: localhost:8081\r\n
//! User-Agent: curl/8.0\r\n
//! \r\n
//! <body...>
//! ```
//!
//! ## Pasos
//!
//! 1. **Acumular**: leer bloques de tamaño fijo hasta ver `\r\n\r\n` o hasta
//!    que la conexión se cierre
//! 2. **Separar**: los bytes que vinieron después del terminador en el mismo
//!    read se guardan como prefijo del body
//! 3. **Request line**: `METHOD SP URI SP VERSION`
//! 4. **Headers**: una línea `Nombre: Valor` por header

use super::Request;
use std::io::{self, Read};
use thiserror::Error;
use tracing::debug;

/// Marca el fin del head
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Tamaño por defecto del buffer de lectura
pub const DEFAULT_READ_BUFFER: usize = 4096;

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// El head no contiene ni siquiera una línea completa
    #[error("Incomplete request head")]
    IncompleteHead,

    /// El head no es UTF-8 válido
    #[error("Request head is not valid UTF-8")]
    InvalidEncoding,

    /// Falta método, URI o versión en la request line
    #[error("Invalid request line format")]
    InvalidRequestLine,

    /// Línea de header sin separador `": "`
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Head crudo leído del socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHead {
    /// Request line + headers, terminando en un único `\r\n`
    pub head: Vec<u8>,

    /// Bytes del body leídos de más
    pub body_prefix: Vec<u8>,
}

impl RawHead {
    /// Parsea el head y construye el `Request` del peer indicado
    pub fn into_request(self, ip: &str, port: u16) -> Result<Request, ParseError> {
        let text = String::from_utf8(self.head).map_err(|_| ParseError::InvalidEncoding)?;
        let mut request = parse_head(&text, ip, port)?;
        request.body_prefix = self.body_prefix;
        Ok(request)
    }
}

/// Lee del stream hasta encontrar el fin del head
///
/// Retorna `None` si la conexión se cierra (read de 0 bytes o error) antes
/// de ver `\r\n\r\n`.
///
/// # Ejemplo
/// ```
/// use minihttpd::http::parser::read_head;
///
/// let mut input: &[u8] = b"GET / HTTP/1.1\r\nHost: x\r\n\r\nbody";
/// let raw = read_head(&mut input, 4096).unwrap();
///
/// assert_eq!(raw.head, b"GET / HTTP/1.1\r\nHost: x\r\n");
/// assert_eq!(raw.body_prefix, b"body");
/// ```
pub fn read_head<R: Read>(reader: &mut R, buffer_size: usize) -> Option<RawHead> {
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut accumulated: Vec<u8> = Vec::new();

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => return None,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Lectura fallida, conexión tratada como cerrada: {}", e);
                return None;
            }
        };

        // El terminador puede haber quedado partido entre dos reads
        let search_from = accumulated.len().saturating_sub(HEAD_TERMINATOR.len() - 1);
        accumulated.extend_from_slice(&buffer[..bytes_read]);

        if let Some(pos) = find_terminator(&accumulated[search_from..]) {
            let head_end = search_from + pos;
            let body_prefix = accumulated.split_off(head_end + HEAD_TERMINATOR.len());
            // Se deja un \r\n para que cada header termine en \r\n
            accumulated.truncate(head_end + 2);
            return Some(RawHead {
                head: accumulated,
                body_prefix,
            });
        }
    }
}

fn find_terminator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
}

/// Parsea un head completo (request line + headers)
///
/// # Ejemplo
/// ```
/// use minihttpd::http::parser::parse_head;
///
/// let request = parse_head("GET /echo/Hello HTTP/1.1\r\nHost: x\r\n", "127.0.0.1", 4000).unwrap();
///
/// assert_eq!(request.method(), "GET");
/// assert_eq!(request.uri(), "/echo/Hello");
/// assert_eq!(request.header("host"), Some("x"));
/// ```
pub fn parse_head(head: &str, ip: &str, port: u16) -> Result<Request, ParseError> {
    let mut request = Request::new(ip, port);
    parse_request_line(head, &mut request)?;
    parse_headers(head, &mut request)?;
    Ok(request)
}

/// Parsea la request line (primera línea del head)
///
/// Formato: `METHOD SP URI SP VERSION`
pub fn parse_request_line(head: &str, request: &mut Request) -> Result<(), ParseError> {
    let line_end = head.find("\r\n").ok_or(ParseError::IncompleteHead)?;
    let line = &head[..line_end];

    let (method, rest) = line.split_once(' ').ok_or(ParseError::InvalidRequestLine)?;
    let (uri, version) = rest.split_once(' ').ok_or(ParseError::InvalidRequestLine)?;

    if method.is_empty() || uri.is_empty() || version.is_empty() {
        return Err(ParseError::InvalidRequestLine);
    }

    request.method = method.to_string();
    request.uri = uri.to_string();
    request.version = version.to_string();
    Ok(())
}

/// Parsea los headers que siguen a la request line
///
/// Cada línea debe tener formato `Nombre: Valor`. Si un nombre se repite,
/// gana el último.
pub fn parse_headers(head: &str, request: &mut Request) -> Result<(), ParseError> {
    let line_end = head.find("\r\n").ok_or(ParseError::IncompleteHead)?;

    for line in head[line_end + 2..].split("\r\n") {
        // La línea vacía marca el fin de los headers
        if line.is_empty() {
            break;
        }

        match line.split_once(": ") {
            Some((name, value)) if !name.is_empty() => request.headers.set(name, value),
            _ => return Err(ParseError::InvalidHeader(line.to_string())),
        }
    }

    Ok(())
}
