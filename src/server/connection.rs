//! # Manejo de una conexión
//! src/server/connection.rs
//!
//! Cada conexión atiende exactamente un request:
//!
//! 1. Leer el head (`read_head`)
//! 2. Parsear; si falla, responder `400 Bad Request` y abandonar
//! 3. Evaluar las rutas con una `Response` atada al stream
//!
//! El cierre del socket queda a cargo de quien es dueño del stream.

use crate::error::HttpError;
use crate::http::parser::read_head;
use crate::http::response::{write_fully, BAD_REQUEST_RESPONSE};
use crate::http::Response;
use crate::router::Router;
use std::io::{Read, Write};
use std::net::SocketAddr;
use tracing::{debug, warn};

/// Cómo terminó una conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// El peer cerró (o falló la lectura) antes de completar el head
    Closed,

    /// Head malformado; se envió el 400
    BadRequest,

    /// El request pasó por el router
    Handled,
}

/// Atiende un request sobre el stream
///
/// Genérico sobre `Read + Write` para poder probarlo sin sockets.
///
/// # Errores
///
/// Errores de envío (`TransmissionFailed`) o de handlers. Todos son locales
/// a la conexión.
pub fn handle_connection<S: Read + Write>(
    stream: &mut S,
    peer: SocketAddr,
    router: &Router,
    read_buffer_size: usize,
) -> Result<ConnectionOutcome, HttpError> {
    let Some(raw) = read_head(stream, read_buffer_size) else {
        debug!(%peer, "Conexión cerrada antes de completar el head");
        return Ok(ConnectionOutcome::Closed);
    };

    let mut request = match raw.into_request(&peer.ip().to_string(), peer.port()) {
        Ok(request) => request,
        Err(e) => {
            warn!(%peer, error = %e, "Request malformado");
            write_fully(&mut *stream, BAD_REQUEST_RESPONSE)?;
            return Ok(ConnectionOutcome::BadRequest);
        }
    };

    debug!(%peer, method = request.method(), uri = request.uri(), "Request recibido");

    let mut response = Response::new(&mut *stream);
    let dispatch = router.dispatch(&mut request, &mut response)?;

    debug!(
        %peer,
        status = response.status(),
        routes = dispatch.matched,
        default = dispatch.default_used,
        "Request atendido"
    );

    Ok(ConnectionOutcome::Handled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{MatchStrategy, Route, RouteHandling};
    use std::io::{self, Cursor};
    use std::net::{Ipv4Addr, SocketAddrV4, TcpListener, TcpStream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    /// Stream en memoria: lee de `input`, escribe en `output`
    struct MemoryStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl MemoryStream {
        fn new(input: &[u8]) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                output: Vec::new(),
            }
        }

        fn output_text(&self) -> String {
            String::from_utf8_lossy(&self.output).to_string()
        }
    }

    impl Read for MemoryStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MemoryStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn peer() -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 40000))
    }

    fn echo_router() -> Router {
        let mut router = Router::new();
        router.add_route(
            Route::new("/echo/(\\w+)/?", MatchStrategy::Regex, |req, res| {
                let body = format!("Echo:  {}", req.match_group(1).unwrap_or(""));
                res.send_all(body.as_bytes())?;
                Ok(RouteHandling::End)
            })
            .unwrap(),
        );
        router
    }

    #[test]
    fn test_handle_connection_echo() {
        let mut stream = MemoryStream::new(b"GET /echo/Hello HTTP/1.1\r\nHost: x\r\n\r\n");
        let outcome = handle_connection(&mut stream, peer(), &echo_router(), 4096).unwrap();

        assert_eq!(outcome, ConnectionOutcome::Handled);
        let text = stream.output_text();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("Echo:  Hello"));
    }

    #[test]
    fn test_handle_connection_small_buffer() {
        let mut stream = MemoryStream::new(b"GET /echo/Hello HTTP/1.1\r\nHost: x\r\n\r\n");
        let outcome = handle_connection(&mut stream, peer(), &echo_router(), 3).unwrap();

        assert_eq!(outcome, ConnectionOutcome::Handled);
        assert!(stream.output_text().ends_with("Echo:  Hello"));
    }

    #[test]
    fn test_handle_connection_not_found() {
        let mut stream = MemoryStream::new(b"GET /nope HTTP/1.1\r\n\r\n");
        handle_connection(&mut stream, peer(), &echo_router(), 4096).unwrap();

        let text = stream.output_text();
        assert!(text.starts_with("HTTP/1.1 404 Not found\r\n"));
        assert!(text.ends_with("404 Not found"));
    }

    #[test]
    fn test_handle_connection_bad_request_skips_routes() {
        let evaluated = Arc::new(AtomicUsize::new(0));
        let mut router = Router::new();
        let counter = Arc::clone(&evaluated);
        router.add_route(
            Route::new("", MatchStrategy::Any, move |_req, _res| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(RouteHandling::Continue)
            })
            .unwrap(),
        );

        let mut stream = MemoryStream::new(b"GARBAGE\r\n\r\n");
        let outcome = handle_connection(&mut stream, peer(), &router, 4096).unwrap();

        assert_eq!(outcome, ConnectionOutcome::BadRequest);
        assert_eq!(stream.output, BAD_REQUEST_RESPONSE);
        assert_eq!(evaluated.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handle_connection_incomplete_head() {
        let mut stream = MemoryStream::new(b"GET / HTTP/1.1\r\nHost: x\r\n");
        let outcome = handle_connection(&mut stream, peer(), &echo_router(), 4096).unwrap();

        assert_eq!(outcome, ConnectionOutcome::Closed);
        assert!(stream.output.is_empty());
    }

    #[test]
    fn test_handle_connection_peer_ip() {
        let mut router = Router::new();
        router.add_route(
            Route::new("/whoami", MatchStrategy::Exact, |req, res| {
                res.send_all(format!("{}:{}", req.ip(), req.port()).as_bytes())?;
                Ok(RouteHandling::End)
            })
            .unwrap(),
        );

        let mut stream = MemoryStream::new(b"GET /whoami HTTP/1.1\r\n\r\n");
        handle_connection(&mut stream, peer(), &router, 4096).unwrap();

        assert!(stream.output_text().ends_with("127.0.0.1:40000"));
    }

    #[test]
    fn test_handle_connection_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let t = thread::spawn(move || {
            let (mut stream, peer) = listener.accept().unwrap();
            handle_connection(&mut stream, peer, &echo_router(), 4096).unwrap()
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"GET /echo/World HTTP/1.1\r\n\r\n").unwrap();

        let outcome = t.join().unwrap();
        // El servidor suelta el stream al terminar el thread
        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        let text = String::from_utf8_lossy(&buf);

        assert_eq!(outcome, ConnectionOutcome::Handled);
        assert!(text.ends_with("Echo:  World"));
    }

    #[test]
    fn test_handle_connection_peer_closed_immediately() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let t = thread::spawn(move || {
            let (mut stream, peer) = listener.accept().unwrap();
            handle_connection(&mut stream, peer, &Router::new(), 4096).unwrap()
        });

        drop(TcpStream::connect(addr).unwrap());

        assert_eq!(t.join().unwrap(), ConnectionOutcome::Closed);
    }
}
