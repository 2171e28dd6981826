//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor con soporte para argumentos CLI y variables de
//! entorno. El CLI tiene prioridad sobre el entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./minihttpd --port 8080 \
//!   --workers 4 \
//!   --queue 16 \
//!   --read-timeout-ms 5000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 WORKERS=4 LOG_FILTER=debug ./minihttpd
//! ```

use clap::Parser;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Configuración del servidor HTTP
#[derive(Debug, Clone, Parser)]
#[command(name = "minihttpd")]
#[command(about = "Servidor HTTP/1.1 con pool de workers y rutas por regex")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8081", env = "HTTP_PORT")]
    pub port: u16,

    /// IPv4 en la que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HTTP_HOST")]
    pub host: String,

    // === Pool ===

    /// Número de workers (0 = la mitad de los CPUs, mínimo 1)
    #[arg(short, long, default_value = "0", env = "WORKERS")]
    pub workers: usize,

    /// Conexiones aceptadas que pueden esperar en cola (0 = sin límite)
    #[arg(long = "queue", default_value = "5", env = "QUEUE_BACKLOG")]
    pub queue_backlog: usize,

    // === Sockets ===

    /// Backlog de listen() del kernel
    #[arg(long = "listen-backlog", default_value = "5", env = "LISTEN_BACKLOG")]
    pub listen_backlog: i32,

    /// Tamaño del buffer de lectura del head en bytes
    #[arg(long = "read-buffer", default_value = "4096", env = "READ_BUFFER")]
    pub read_buffer: usize,

    /// Timeout de lectura por conexión en milisegundos (0 = sin timeout)
    #[arg(long = "read-timeout-ms", default_value = "0", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    // === Aplicación ===

    /// Directorio con los archivos estáticos de la aplicación de ejemplo
    #[arg(long = "static-dir", default_value = "./static", env = "STATIC_DIR")]
    pub static_dir: PathBuf,

    /// Filtro de logging (sintaxis de `RUST_LOG`)
    #[arg(long = "log", default_value = "info", env = "LOG_FILTER")]
    pub log_filter: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use minihttpd::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:8081");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Timeout de lectura, si está configurado
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.host.parse::<Ipv4Addr>().is_err() {
            return Err(format!("Host must be an IPv4 address: {}", self.host));
        }

        if self.read_buffer == 0 {
            return Err("Read buffer must be >= 1".to_string());
        }

        if self.listen_backlog < 1 {
            return Err("Listen backlog must be >= 1".to_string());
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn print_summary(&self) {
        let workers = if self.workers == 0 {
            "auto".to_string()
        } else {
            self.workers.to_string()
        };
        let queue = if self.queue_backlog == 0 {
            "unbounded".to_string()
        } else {
            self.queue_backlog.to_string()
        };

        info!("Configuración del servidor");
        info!("   Address:        {}", self.address());
        info!("   Workers:        {}", workers);
        info!("   Queue backlog:  {}", queue);
        info!("   Listen backlog: {}", self.listen_backlog);
        info!("   Read buffer:    {} bytes", self.read_buffer);
        match self.read_timeout() {
            Some(timeout) => info!("   Read timeout:   {} ms", timeout.as_millis()),
            None => info!("   Read timeout:   disabled"),
        }
        info!("   Static dir:     {}", self.static_dir.display());
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8081,
            host: "0.0.0.0".to_string(),
            workers: 0,
            queue_backlog: 5,
            listen_backlog: 5,
            read_buffer: 4096,
            read_timeout_ms: 0,
            static_dir: PathBuf::from("./static"),
            log_filter: "info".to_string(),
        }
    }
}
