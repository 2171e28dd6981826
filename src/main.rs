//! # minihttpd - Entry Point
//! src/main.rs
//!
//! Aplicación de ejemplo: registra algunas rutas de demostración y atiende
//! conexiones hasta que el socket de escucha falle.

use minihttpd::config::Config;
use minihttpd::http::service::{serve_file, serve_file_cached};
use minihttpd::http::{HttpHeader, Request, Response, StatusCode};
use minihttpd::logging::init_logging;
use minihttpd::router::{HandlerResult, MatchStrategy, RouteHandling};
use minihttpd::server::HttpServer;
use minihttpd::HttpError;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Límite de `/prime/N` para que un request no acapare un worker
const MAX_PRIMES: usize = 100_000;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>minihttpd</title>
</head>
<body>
    <h1><a href="/example.html">example.html</a></h1>
    <h1><a href="/cached/example.html">cached example.html</a></h1>
    <h1><a href="/prime/100">first 100 primes</a></h1>
    <h1><a href="/echo/Hello">echo hello</a></h1>
    <h1><a href="/status">status</a></h1>
</body>
</html>
"#;

/// Respuesta de `/status`
#[derive(Debug, Serialize)]
struct StatusReport {
    server: &'static str,
    version: &'static str,
    uptime_secs: u64,
    requests: usize,
    workers: String,
    queue_backlog: usize,
}

fn main() {
    let config = Config::new();

    if let Err(e) = init_logging(&config.log_filter) {
        eprintln!("No se pudo inicializar el logging: {}", e);
    }

    if let Err(e) = config.validate() {
        error!("Configuración inválida: {}", e);
        std::process::exit(1);
    }

    config.print_summary();

    if let Err(e) = run(&config) {
        error!("Error fatal: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), HttpError> {
    let mut server = HttpServer::from_config(config)?;
    let requests = Arc::new(AtomicUsize::new(0));
    let started = Instant::now();

    // Middleware de access log
    let counter = Arc::clone(&requests);
    server.route("", MatchStrategy::Any, move |req, _res| {
        counter.fetch_add(1, Ordering::Relaxed);
        info!(
            "Request: {} => {} (agent: {})",
            req.ip(),
            req.uri(),
            req.headers().header("User-Agent").value()
        );
        Ok(RouteHandling::Continue)
    })?;

    server.route("/(index.html)?", MatchStrategy::Regex, |_req, res| {
        res.send_all(INDEX_HTML.as_bytes())?;
        Ok(RouteHandling::End)
    })?;

    let example = config.static_dir.join("example.html");
    server.add_route(serve_file(
        "/example.html",
        &example,
        "text/html; charset=utf-8",
        MatchStrategy::Exact,
        Vec::new(),
    )?);

    // Se carga en memoria al arrancar
    server.add_route(serve_file_cached(
        "/cached/example.html",
        &example,
        "text/html; charset=utf-8",
        MatchStrategy::Exact,
        vec![HttpHeader::new("Cache-Control", "max-age=60")],
    )?);

    server.route("/prime/(\\d+)", MatchStrategy::Regex, handle_prime)?;
    server.route("/echo/([a-zA-Z0-9_\\-.]+)/?", MatchStrategy::Regex, handle_echo)?;

    let workers = if config.workers == 0 {
        "auto".to_string()
    } else {
        config.workers.to_string()
    };
    let queue_backlog = config.queue_backlog;
    server.route("/status", MatchStrategy::Exact, move |_req, res| {
        let report = StatusReport {
            server: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: started.elapsed().as_secs(),
            requests: requests.load(Ordering::Relaxed),
            workers: workers.clone(),
            queue_backlog,
        };
        let body = serde_json::to_string_pretty(&report)
            .map_err(|e| HttpError::HandlerFailed(e.to_string()))?;

        res.set_header("Content-Type", "application/json");
        res.send_all(body.as_bytes())?;
        Ok(RouteHandling::End)
    })?;

    server.serve_forever()
}

/// `/echo/<texto>`
fn handle_echo(req: &Request, res: &mut Response<'_>) -> HandlerResult {
    let body = format!("Echo:  {}", req.match_group(1).unwrap_or(""));
    res.send_all(body.as_bytes())?;
    Ok(RouteHandling::End)
}

/// `/prime/<n>`: los primeros n números primos separados por espacios
fn handle_prime(req: &Request, res: &mut Response<'_>) -> HandlerResult {
    let count = match req.match_group(1).and_then(|n| n.parse::<usize>().ok()) {
        Some(n) if n <= MAX_PRIMES => n,
        _ => {
            res.set_status_code(StatusCode::BadRequest);
            res.send_all(format!("n must be between 0 and {}", MAX_PRIMES).as_bytes())?;
            return Ok(RouteHandling::End);
        }
    };

    let body = first_primes(count)
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    res.set_header("Content-Type", "text/plain; charset=utf-8");
    res.send_all(body.as_bytes())?;
    Ok(RouteHandling::End)
}

/// Primeros `count` primos por división de prueba
fn first_primes(count: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(count);
    let mut candidate = 2u64;

    while primes.len() < count {
        let is_prime = primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0);
        if is_prime {
            primes.push(candidate);
        }
        candidate += 1;
    }

    primes
}
