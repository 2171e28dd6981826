//! # Request HTTP
//! src/http/request.rs
//!
//! Representa un request ya parseado. El parser y el router lo llenan
//! (campos `pub(crate)`), los handlers solo lo leen.
//!
//! ## Componentes
//!
//! 1. **Peer**: IP y puerto del cliente
//! 2. **Request Line**: `METHOD URI VERSION`
//! 3. **Headers**: mapa case-insensitive
//! 4. **Matches**: grupos capturados por la ruta regex (índice 0 = todo)
//! 5. **Body prefix**: bytes del body que llegaron junto con el head

use super::HeaderMap;

/// Request HTTP de una conexión
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// IP del cliente (ej: "127.0.0.1")
    pub(crate) ip: String,

    /// Puerto del cliente
    pub(crate) port: u16,

    /// Método HTTP tal como llegó (ej: "GET")
    pub(crate) method: String,

    /// URI completa de la request line (ej: "/echo/Hello")
    pub(crate) uri: String,

    /// Versión HTTP (ej: "HTTP/1.1")
    pub(crate) version: String,

    /// Headers del request
    pub(crate) headers: HeaderMap,

    /// Grupos capturados por la última ruta regex que hizo match
    pub(crate) matches: Vec<String>,

    /// Bytes leídos después de `\r\n\r\n` en el mismo read
    pub(crate) body_prefix: Vec<u8>,
}

impl Request {
    /// Crea un request vacío asociado a un peer
    pub fn new(ip: &str, port: u16) -> Self {
        Self {
            ip: ip.to_string(),
            port,
            ..Self::default()
        }
    }

    /// IP del cliente
    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// Puerto del cliente
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Método HTTP
    pub fn method(&self) -> &str {
        &self.method
    }

    /// URI del request
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Headers del request
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Obtiene un header específico
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Grupos capturados por la ruta regex
    ///
    /// # Ejemplo
    /// ```
    /// use minihttpd::http::parser::parse_head;
    ///
    /// let request = parse_head("GET /prime/100 HTTP/1.1\r\n\r\n", "127.0.0.1", 5000).unwrap();
    /// assert!(request.matches().is_empty());
    /// ```
    pub fn matches(&self) -> &[String] {
        &self.matches
    }

    /// Grupo capturado por índice (0 = match completo)
    pub fn match_group(&self, index: usize) -> Option<&str> {
        self.matches.get(index).map(|s| s.as_str())
    }

    /// Bytes del body que ya se leyeron junto con el head
    ///
    /// No es el body completo: el servidor no lee más allá del head.
    pub fn body_prefix(&self) -> &[u8] {
        &self.body_prefix
    }
}
