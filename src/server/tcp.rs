//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! El thread que llama `serve_forever` solo acepta conexiones. Cada socket
//! aceptado se convierte en una tarea del `WorkerPool`, que lee el request,
//! evalúa las rutas y cierra el socket al terminar.
//!
//! ```text
//! accept() ──► [cola FIFO acotada] ──► worker 0..N ──► handle_connection
//! ```
//!
//! Si la cola está llena, el loop de aceptación se bloquea y las conexiones
//! nuevas esperan en el backlog del kernel (`listen_backlog`).

use super::connection::{handle_connection, ConnectionOutcome};
use crate::config::Config;
use crate::error::HttpError;
use crate::http::parser::DEFAULT_READ_BUFFER;
use crate::http::{Request, Response};
use crate::pool::WorkerPool;
use crate::router::{HandlerResult, MatchStrategy, Route, Router};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Backlog de listen() por defecto
pub const DEFAULT_LISTEN_BACKLOG: i32 = 5;

/// Conexiones aceptadas que pueden esperar un worker
pub const DEFAULT_QUEUE_BACKLOG: usize = 5;

/// Parámetros de ejecución compartidos por `HttpServer` y `BoundServer`
#[derive(Debug, Clone)]
struct ServeOptions {
    workers: usize,
    queue_backlog: usize,
    listen_backlog: i32,
    read_buffer_size: usize,
    read_timeout: Option<Duration>,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            workers: WorkerPool::AUTO_WORKERS,
            queue_backlog: DEFAULT_QUEUE_BACKLOG,
            listen_backlog: DEFAULT_LISTEN_BACKLOG,
            read_buffer_size: DEFAULT_READ_BUFFER,
            read_timeout: None,
        }
    }
}

/// Servidor HTTP en configuración
///
/// Las rutas se registran antes de servir; después la tabla es inmutable.
#[derive(Debug)]
pub struct HttpServer {
    address: SocketAddrV4,
    router: Router,
    options: ServeOptions,
}

impl HttpServer {
    /// Crea un servidor para `bind_address:port`
    ///
    /// # Errores
    ///
    /// `HttpError::InvalidAddress` si `bind_address` no es una IPv4.
    ///
    /// # Ejemplo
    /// ```
    /// use minihttpd::server::HttpServer;
    ///
    /// assert!(HttpServer::new(8081, "0.0.0.0").is_ok());
    /// assert!(HttpServer::new(8081, "not-an-ip").is_err());
    /// ```
    pub fn new(port: u16, bind_address: &str) -> Result<Self, HttpError> {
        let ip: Ipv4Addr = bind_address
            .parse()
            .map_err(|_| HttpError::InvalidAddress(bind_address.to_string()))?;

        Ok(Self {
            address: SocketAddrV4::new(ip, port),
            router: Router::new(),
            options: ServeOptions::default(),
        })
    }

    /// Crea un servidor a partir de la configuración
    pub fn from_config(config: &Config) -> Result<Self, HttpError> {
        let server = Self::new(config.port, &config.host)?
            .with_workers(config.workers)
            .with_queue_backlog(config.queue_backlog)
            .with_listen_backlog(config.listen_backlog)
            .with_read_buffer(config.read_buffer)
            .with_read_timeout(config.read_timeout());
        Ok(server)
    }

    /// Número de workers (0 = automático)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.options.workers = workers;
        self
    }

    /// Conexiones aceptadas en espera (0 = sin límite)
    pub fn with_queue_backlog(mut self, backlog: usize) -> Self {
        self.options.queue_backlog = backlog;
        self
    }

    /// Backlog de listen()
    pub fn with_listen_backlog(mut self, backlog: i32) -> Self {
        self.options.listen_backlog = backlog.max(1);
        self
    }

    /// Tamaño del buffer de lectura del head
    pub fn with_read_buffer(mut self, size: usize) -> Self {
        self.options.read_buffer_size = size.max(1);
        self
    }

    /// Timeout de lectura por conexión
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.read_timeout = timeout;
        self
    }

    /// Dirección configurada
    pub fn address(&self) -> SocketAddrV4 {
        self.address
    }

    /// Tabla de rutas registrada hasta ahora
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Agrega una ruta al final de la tabla
    pub fn add_route(&mut self, route: Route) {
        self.router.add_route(route);
    }

    /// Crea y agrega una ruta
    pub fn route<F>(&mut self, pattern: &str, strategy: MatchStrategy, handler: F) -> Result<(), HttpError>
    where
        F: Fn(&Request, &mut Response<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.router.add_route(Route::new(pattern, strategy, handler)?);
        Ok(())
    }

    /// Reemplaza el handler para requests que ninguna ruta terminó
    pub fn set_default_handler<F>(&mut self, handler: F)
    where
        F: Fn(&Request, &mut Response<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.router.set_default_handler(handler);
    }

    /// Abre el socket, hace bind y listen
    ///
    /// # Errores
    ///
    /// `SocketOpen` si no se puede crear el socket, `SocketBind` si falla
    /// bind o listen.
    pub fn bind(self) -> Result<BoundServer, HttpError> {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
            .map_err(HttpError::SocketOpen)?;
        socket.set_reuse_address(true).map_err(HttpError::SocketOpen)?;

        let address = SocketAddr::V4(self.address);
        socket.bind(&address.into()).map_err(HttpError::SocketBind)?;
        socket
            .listen(self.options.listen_backlog)
            .map_err(HttpError::SocketBind)?;

        let listener: TcpListener = socket.into();
        let local_addr = listener.local_addr().map_err(HttpError::SocketBind)?;
        info!("Servidor escuchando en {}", local_addr);

        Ok(BoundServer {
            listener,
            local_addr,
            router: self.router,
            options: self.options,
        })
    }

    /// Hace bind y atiende conexiones hasta que accept() falle
    pub fn serve_forever(self) -> Result<(), HttpError> {
        self.bind()?.serve_forever()
    }
}

/// Servidor con el socket ya escuchando
#[derive(Debug)]
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
    options: ServeOptions,
}

impl BoundServer {
    /// Dirección real del socket (útil con puerto 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Loop de aceptación
    ///
    /// Solo retorna con error: un fallo de `accept()` apaga el pool, espera
    /// a los workers y retorna `HttpError::Accept`.
    pub fn serve_forever(self) -> Result<(), HttpError> {
        let router = Arc::new(self.router);
        let mut pool = WorkerPool::new(self.options.workers, self.options.queue_backlog)?;
        info!(
            "Atendiendo con {} workers (cola: {})",
            pool.worker_count(),
            pool.backlog()
        );

        loop {
            let (stream, peer) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("Error al aceptar conexión: {}", e);
                    pool.shutdown();
                    pool.join_all();
                    return Err(HttpError::Accept(e));
                }
            };

            debug!(%peer, queued = pool.queued(), "Conexión aceptada");

            let router = Arc::clone(&router);
            let options = self.options.clone();
            let submitted = pool.submit(move || serve_connection(stream, peer, &router, &options));

            if let Err(e) = submitted {
                // Solo pasa si el pool se cerró; la conexión se descarta
                warn!(%peer, error = %e, "No se pudo encolar la conexión");
            }
        }
    }
}

/// Tarea de un worker: atiende la conexión y la cierra al salir
fn serve_connection(mut stream: TcpStream, peer: SocketAddr, router: &Router, options: &ServeOptions) {
    if let Err(e) = stream.set_read_timeout(options.read_timeout) {
        warn!(%peer, error = %e, "No se pudo configurar el timeout de lectura");
    }

    match handle_connection(&mut stream, peer, router, options.read_buffer_size) {
        Ok(ConnectionOutcome::Handled) => {}
        Ok(outcome) => debug!(%peer, ?outcome, "Conexión terminada sin request válido"),
        Err(e) => warn!(%peer, error = %e, "Error atendiendo conexión"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::RouteHandling;
    use std::io::{Read, Write};
    use std::thread;

    fn start(server: HttpServer) -> SocketAddr {
        let bound = server.bind().unwrap();
        let addr = bound.local_addr();
        thread::spawn(move || bound.serve_forever());
        addr
    }

    fn get(addr: SocketAddr, raw: &[u8]) -> String {
        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(raw).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    #[test]
    fn test_invalid_address() {
        let result = HttpServer::new(8081, "256.0.0.1");
        assert!(matches!(result, Err(HttpError::InvalidAddress(_))));
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.host = "127.0.0.1".to_string();
        config.port = 0;
        config.read_timeout_ms = 100;

        let server = HttpServer::from_config(&config).unwrap();
        assert_eq!(server.address().ip(), &Ipv4Addr::LOCALHOST);
        assert_eq!(server.options.read_timeout, Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_invalid_route_pattern() {
        let mut server = HttpServer::new(0, "127.0.0.1").unwrap();
        let result = server.route("/(", MatchStrategy::Regex, |_req, _res| Ok(RouteHandling::End));

        assert!(matches!(result, Err(HttpError::InvalidPattern { .. })));
        assert!(server.router().is_empty());
    }

    #[test]
    fn test_bind_ephemeral_port() {
        let bound = HttpServer::new(0, "127.0.0.1").unwrap().bind().unwrap();
        assert_ne!(bound.local_addr().port(), 0);
    }

    #[test]
    fn test_bind_port_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let result = HttpServer::new(port, "127.0.0.1").unwrap().bind();
        assert!(matches!(result, Err(HttpError::SocketBind(_))));
    }

    #[test]
    fn test_serve_echo_and_404() {
        let mut server = HttpServer::new(0, "127.0.0.1").unwrap().with_workers(2);
        server
            .route("/echo/(\\w+)", MatchStrategy::Regex, |req, res| {
                res.send_all(req.match_group(1).unwrap_or("").as_bytes())?;
                Ok(RouteHandling::End)
            })
            .unwrap();
        let addr = start(server);

        let text = get(addr, b"GET /echo/Hello HTTP/1.1\r\n\r\n");
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("Hello"));

        let text = get(addr, b"GET /missing HTTP/1.1\r\n\r\n");
        assert!(text.starts_with("HTTP/1.1 404 Not found\r\n"));
    }

    #[test]
    fn test_serve_bad_request() {
        let addr = start(HttpServer::new(0, "127.0.0.1").unwrap().with_workers(1));

        let text = get(addr, b"GARBAGE\r\n\r\n");
        assert_eq!(text, "HTTP/1.1 400 Bad Request\r\n\r\n");
    }

    #[test]
    fn test_read_timeout_closes_idle_connection() {
        let server = HttpServer::new(0, "127.0.0.1")
            .unwrap()
            .with_workers(1)
            .with_read_timeout(Some(Duration::from_millis(50)));
        let addr = start(server);

        // Head incompleto: el servidor cierra sin responder
        let text = get(addr, b"GET / HTTP/1.1\r\n");
        assert!(text.is_empty());
    }
}
