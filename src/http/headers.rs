//! # Headers HTTP
//! src/http/headers.rs
//!
//! Mapa de headers case-insensitive. La clave se normaliza a minúsculas pero
//! se conserva el nombre original para escribirlo en el wire. Si el mismo
//! nombre se asigna dos veces, gana el último valor.
//!
//! Los headers se serializan en orden de inserción.

/// Nombres de headers comunes
///
/// Ver <https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers>
pub mod names {
    pub const AUTHORIZATION: &str = "Authorization";
    pub const CONNECTION: &str = "Connection";
    pub const KEEP_ALIVE: &str = "Keep-Alive";
    pub const ACCEPT: &str = "Accept";
    pub const ACCEPT_CHARSET: &str = "Accept-Charset";
    pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
    pub const COOKIE: &str = "Cookie";
    pub const SET_COOKIE: &str = "Set-Cookie";
    pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_ENCODING: &str = "Content-Encoding";
    pub const CONTENT_LANGUAGE: &str = "Content-Language";
    pub const CONTENT_LOCATION: &str = "Content-Location";
    pub const LOCATION: &str = "Location";
    pub const HOST: &str = "Host";
    pub const REFERER: &str = "Referer";
    pub const USER_AGENT: &str = "User-Agent";
    pub const ALLOW: &str = "Allow";
    pub const SERVER: &str = "Server";
    pub const ACCEPT_RANGES: &str = "Accept-Ranges";
    pub const RANGE: &str = "Range";
    pub const CONTENT_RANGE: &str = "Content-Range";
    pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";
    pub const DATE: &str = "Date";
    pub const ETAG: &str = "ETag";
}

/// Header vacío que se retorna para claves no presentes
static UNSET_HEADER: HttpHeader = HttpHeader {
    set: false,
    name: String::new(),
    value: String::new(),
};

/// Un header individual
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpHeader {
    set: bool,
    name: String,
    value: String,
}

impl HttpHeader {
    /// Crea un header presente
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            set: true,
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// `false` para el valor centinela de un header ausente
    pub fn is_set(&self) -> bool {
        self.set
    }

    /// Nombre tal como fue asignado (mayúsculas originales)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Valor del header (vacío si no está presente)
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Mapa de headers con claves case-insensitive
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    /// (clave en minúsculas, header)
    entries: Vec<(String, HttpHeader)>,
}

impl HeaderMap {
    /// Crea un mapa vacío
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        let key = name.to_ascii_lowercase();
        self.entries.iter().position(|(k, _)| *k == key)
    }

    /// Asigna un header. Si ya existía (sin importar mayúsculas) se
    /// reemplaza conservando su posición.
    ///
    /// # Ejemplo
    /// ```
    /// use minihttpd::http::HeaderMap;
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.set("Content-Type", "text/plain");
    /// headers.set("content-type", "text/html");
    ///
    /// assert_eq!(headers.len(), 1);
    /// assert_eq!(headers.value_or_empty("CONTENT-TYPE"), "text/html");
    /// ```
    pub fn set(&mut self, name: &str, value: &str) {
        let header = HttpHeader::new(name, value);
        match self.position(name) {
            Some(idx) => self.entries[idx].1 = header,
            None => self.entries.push((name.to_ascii_lowercase(), header)),
        }
    }

    /// Asigna un header ya construido
    pub fn set_header(&mut self, header: HttpHeader) {
        if header.is_set() {
            self.set(&header.name, &header.value);
        }
    }

    /// Obtiene un header. Si no existe retorna un centinela con
    /// `is_set() == false`.
    pub fn header(&self, name: &str) -> &HttpHeader {
        self.position(name)
            .map(|idx| &self.entries[idx].1)
            .unwrap_or(&UNSET_HEADER)
    }

    /// Obtiene el valor de un header si existe
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.entries[idx].1.value())
    }

    /// Obtiene el valor de un header o `""` si no existe
    pub fn value_or_empty(&self, name: &str) -> &str {
        self.header(name).value()
    }

    /// Verifica si el header existe
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Elimina un header
    pub fn unset(&mut self, name: &str) {
        if let Some(idx) = self.position(name) {
            self.entries.remove(idx);
        }
    }

    /// Itera los headers en orden de inserción
    pub fn iter(&self) -> impl Iterator<Item = &HttpHeader> {
        self.entries.iter().map(|(_, h)| h)
    }

    /// Número de headers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Verifica si no hay headers
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let mut headers = HeaderMap::new();
        headers.set("Content-Type", "x");

        assert_eq!(headers.get("content-type"), Some("x"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("x"));
        assert!(headers.contains("cOnTeNt-TyPe"));
    }

    #[test]
    fn test_last_write_wins() {
        let mut headers = HeaderMap::new();
        headers.set("X-Custom", "first");
        headers.set("x-custom", "second");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("X-Custom"), Some("second"));
        // El nombre original es el de la última asignación
        assert_eq!(headers.header("X-CUSTOM").name(), "x-custom");
    }

    #[test]
    fn test_missing_header_sentinel() {
        let headers = HeaderMap::new();
        let header = headers.header(names::USER_AGENT);

        assert!(!header.is_set());
        assert_eq!(header.value(), "");
        assert_eq!(headers.value_or_empty("Host"), "");
        assert_eq!(headers.get("Host"), None);
    }

    #[test]
    fn test_unset() {
        let mut headers = HeaderMap::new();
        headers.set("A", "1");
        headers.set("B", "2");
        headers.unset("a");

        assert!(!headers.contains("A"));
        assert_eq!(headers.len(), 1);
        headers.unset("missing");
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_insertion_order() {
        let mut headers = HeaderMap::new();
        headers.set("B", "2");
        headers.set("A", "1");
        headers.set("C", "3");
        headers.set("b", "22");

        let names: Vec<&str> = headers.iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["b", "A", "C"]);
    }

    #[test]
    fn test_set_header_struct() {
        let mut headers = HeaderMap::new();
        headers.set_header(HttpHeader::new("Cache-Control", "no-cache"));
        headers.set_header(UNSET_HEADER.clone());

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("cache-control"), Some("no-cache"));
    }
}
