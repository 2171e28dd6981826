//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Tabla ordenada de rutas. Para cada request se recorren las rutas en orden
//! de registro y se ejecuta el handler de cada una que haga match.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → [ruta 1] → [ruta 2] → ... → [default handler]
//!              │           │
//!           Continue      End (corta la cadena)
//! ```
//!
//! Un handler que retorna `Continue` funciona como middleware (ej: logging):
//! la evaluación sigue con las rutas siguientes. El primer `End` termina el
//! request. Si ninguna ruta retorna `End`, corre el default handler
//! (404 Not found por defecto).
//!
//! La tabla se arma antes de servir y después se comparte sin locks.

use crate::error::HttpError;
use crate::http::{Request, Response};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Qué hacer después de que un handler termina
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteHandling {
    /// El request quedó atendido, no evaluar más rutas
    End,

    /// Seguir evaluando las rutas siguientes
    Continue,
}

/// Cómo se compara el patrón con la URI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Regex anclada a toda la URI; los grupos quedan en `Request::matches`
    Regex,

    /// La URI empieza con el patrón
    Prefix,

    /// La URI es exactamente el patrón
    Exact,

    /// Siempre hace match (middleware)
    Any,
}

/// Resultado de un handler
pub type HandlerResult = Result<RouteHandling, HttpError>;

/// Tipo de función handler
///
/// Un handler recibe el Request (solo lectura) y la Response de la conexión.
pub type Handler = Arc<dyn Fn(&Request, &mut Response<'_>) -> HandlerResult + Send + Sync>;

/// Handler por defecto: 404 Not found
fn default_not_found(_req: &Request, res: &mut Response<'_>) -> HandlerResult {
    res.send_default_404()?;
    Ok(RouteHandling::End)
}

/// Una ruta registrada
#[derive(Clone)]
pub struct Route {
    pattern: String,
    strategy: MatchStrategy,
    /// Solo para `MatchStrategy::Regex`
    matcher: Option<Regex>,
    handler: Handler,
}

impl Route {
    /// Crea una ruta
    ///
    /// # Errores
    ///
    /// `HttpError::InvalidPattern` si la estrategia es `Regex` y el patrón
    /// no compila.
    ///
    /// # Ejemplo
    /// ```
    /// use minihttpd::router::{MatchStrategy, Route, RouteHandling};
    ///
    /// let route = Route::new("/prime/(\\d+)", MatchStrategy::Regex, |_req, res| {
    ///     res.send_all(b"2 3 5")?;
    ///     Ok(RouteHandling::End)
    /// }).unwrap();
    ///
    /// assert_eq!(route.pattern(), "/prime/(\\d+)");
    /// ```
    pub fn new<F>(pattern: &str, strategy: MatchStrategy, handler: F) -> Result<Self, HttpError>
    where
        F: Fn(&Request, &mut Response<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        Self::with_handler(pattern, strategy, Arc::new(handler))
    }

    /// Crea una ruta a partir de un handler ya compartido
    pub fn with_handler(
        pattern: &str,
        strategy: MatchStrategy,
        handler: Handler,
    ) -> Result<Self, HttpError> {
        let matcher = match strategy {
            MatchStrategy::Regex => {
                let anchored = format!("^(?:{})$", pattern);
                let regex = Regex::new(&anchored).map_err(|source| HttpError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })?;
                Some(regex)
            }
            _ => None,
        };

        Ok(Self {
            pattern: pattern.to_string(),
            strategy,
            matcher,
            handler,
        })
    }

    /// Patrón tal como se registró
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Estrategia de comparación
    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Verifica si la ruta atiende la URI del request
    ///
    /// Con `Regex`, si hay match los grupos reemplazan a los de la ruta
    /// anterior. Los grupos opcionales sin match quedan como `""`.
    fn try_match(&self, request: &mut Request) -> bool {
        match self.strategy {
            MatchStrategy::Any => true,
            MatchStrategy::Exact => request.uri == self.pattern,
            MatchStrategy::Prefix => request.uri.starts_with(&self.pattern),
            MatchStrategy::Regex => {
                let Some(matcher) = &self.matcher else {
                    return false;
                };
                let Some(captures) = matcher.captures(&request.uri) else {
                    return false;
                };
                let groups = captures
                    .iter()
                    .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                request.matches = groups;
                true
            }
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Resumen de la evaluación de un request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    /// Rutas cuyo handler se ejecutó
    pub matched: usize,

    /// `true` si ninguna ruta retornó `End` y corrió el default handler
    pub default_used: bool,
}

/// Tabla ordenada de rutas
#[derive(Clone)]
pub struct Router {
    routes: Vec<Route>,
    default_handler: Handler,
}

impl Router {
    /// Crea un router vacío con el 404 por defecto
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            default_handler: Arc::new(default_not_found),
        }
    }

    /// Agrega una ruta al final de la tabla
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Reemplaza el handler que corre cuando ninguna ruta termina el request
    pub fn set_default_handler<F>(&mut self, handler: F)
    where
        F: Fn(&Request, &mut Response<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.default_handler = Arc::new(handler);
    }

    /// Rutas registradas, en orden
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Número de rutas
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Verifica si no hay rutas
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Evalúa las rutas para un request
    ///
    /// # Ejemplo
    /// ```
    /// use minihttpd::http::{parser::parse_head, Response};
    /// use minihttpd::router::Router;
    ///
    /// let router = Router::new();
    /// let mut request = parse_head("GET /missing HTTP/1.1\r\n", "127.0.0.1", 1).unwrap();
    /// let mut wire = Vec::new();
    /// let mut response = Response::new(&mut wire);
    ///
    /// let dispatch = router.dispatch(&mut request, &mut response).unwrap();
    /// assert!(dispatch.default_used);
    /// assert_eq!(response.status(), 404);
    /// ```
    pub fn dispatch(
        &self,
        request: &mut Request,
        response: &mut Response<'_>,
    ) -> Result<Dispatch, HttpError> {
        let mut matched = 0;

        for route in &self.routes {
            if !route.try_match(request) {
                continue;
            }

            matched += 1;
            if (route.handler)(request, response)? == RouteHandling::End {
                return Ok(Dispatch {
                    matched,
                    default_used: false,
                });
            }
        }

        (self.default_handler)(request, response)?;
        Ok(Dispatch {
            matched,
            default_used: true,
        })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("routes", &self.routes).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::parser::parse_head;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(uri: &str) -> Request {
        parse_head(&format!("GET {} HTTP/1.1\r\n", uri), "127.0.0.1", 1).unwrap()
    }

    /// Ejecuta el router y retorna (dispatch, request, texto escrito)
    fn run(router: &Router, uri: &str) -> (Dispatch, Request, String) {
        let mut req = request(uri);
        let mut wire = Vec::new();
        let dispatch = {
            let mut res = Response::new(&mut wire);
            router.dispatch(&mut req, &mut res).unwrap()
        };
        (dispatch, req, String::from_utf8(wire).unwrap())
    }

    fn body_handler(body: &'static str) -> impl Fn(&Request, &mut Response<'_>) -> HandlerResult {
        move |_req, res| {
            res.send_all(body.as_bytes())?;
            Ok(RouteHandling::End)
        }
    }

    fn counting_route(pattern: &str, strategy: MatchStrategy, counter: &Arc<AtomicUsize>, handling: RouteHandling) -> Route {
        let counter = Arc::clone(counter);
        Route::new(pattern, strategy, move |_req, _res| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(handling)
        })
        .unwrap()
    }

    #[test]
    fn test_router_creation() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_exact_match() {
        let mut router = Router::new();
        router.add_route(Route::new("/a", MatchStrategy::Exact, body_handler("A")).unwrap());

        let (dispatch, _, text) = run(&router, "/a");
        assert!(!dispatch.default_used);
        assert!(text.ends_with("A"));

        let (dispatch, _, text) = run(&router, "/a/b");
        assert!(dispatch.default_used);
        assert!(text.starts_with("HTTP/1.1 404 Not found"));
    }

    #[test]
    fn test_prefix_match() {
        let mut router = Router::new();
        router.add_route(Route::new("/static/", MatchStrategy::Prefix, body_handler("S")).unwrap());

        assert!(!run(&router, "/static/css/main.css").0.default_used);
        assert!(run(&router, "/stat").0.default_used);
    }

    #[test]
    fn test_regex_capture() {
        let mut router = Router::new();
        router.add_route(Route::new("/prime/(\\d+)", MatchStrategy::Regex, body_handler("P")).unwrap());

        let (dispatch, req, _) = run(&router, "/prime/100");
        assert_eq!(dispatch.matched, 1);
        assert_eq!(req.match_group(0), Some("/prime/100"));
        assert_eq!(req.match_group(1), Some("100"));
    }

    #[test]
    fn test_regex_is_anchored() {
        let mut router = Router::new();
        router.add_route(Route::new("/prime/(\\d+)", MatchStrategy::Regex, body_handler("P")).unwrap());

        assert!(run(&router, "/prime/100/extra").0.default_used);
        assert!(run(&router, "/x/prime/100").0.default_used);
    }

    #[test]
    fn test_regex_optional_group() {
        let mut router = Router::new();
        router.add_route(Route::new("/(index.html)?", MatchStrategy::Regex, body_handler("I")).unwrap());

        let (dispatch, req, _) = run(&router, "/");
        assert!(!dispatch.default_used);
        assert_eq!(req.matches(), &["/".to_string(), String::new()]);

        let (_, req, _) = run(&router, "/index.html");
        assert_eq!(req.match_group(1), Some("index.html"));
    }

    #[test]
    fn test_regex_matches_replaced_by_later_route() {
        let mut router = Router::new();
        router.add_route(
            Route::new("/echo/(.*)", MatchStrategy::Regex, |_req, _res| Ok(RouteHandling::Continue)).unwrap(),
        );
        router.add_route(Route::new("/echo/(\\w+)/?", MatchStrategy::Regex, body_handler("E")).unwrap());

        let (dispatch, req, _) = run(&router, "/echo/hi/");
        assert_eq!(dispatch.matched, 2);
        assert_eq!(req.matches().len(), 2);
        assert_eq!(req.match_group(1), Some("hi"));
    }

    #[test]
    fn test_invalid_regex() {
        let result = Route::new("/bad/(", MatchStrategy::Regex, body_handler("x"));
        assert!(matches!(result, Err(HttpError::InvalidPattern { .. })));
    }

    #[test]
    fn test_precedence_end_stops_chain() {
        let h1 = Arc::new(AtomicUsize::new(0));
        let h2 = Arc::new(AtomicUsize::new(0));

        let mut router = Router::new();
        router.add_route(counting_route("/a", MatchStrategy::Exact, &h1, RouteHandling::End));
        router.add_route(counting_route("", MatchStrategy::Any, &h2, RouteHandling::Continue));

        run(&router, "/a");
        assert_eq!(h1.load(Ordering::SeqCst), 1);
        assert_eq!(h2.load(Ordering::SeqCst), 0);

        let (dispatch, _, _) = run(&router, "/b");
        assert_eq!(h1.load(Ordering::SeqCst), 1);
        assert_eq!(h2.load(Ordering::SeqCst), 1);
        assert!(dispatch.default_used);
    }

    #[test]
    fn test_continue_chains_middleware() {
        let logger = Arc::new(AtomicUsize::new(0));

        let mut router = Router::new();
        router.add_route(counting_route("", MatchStrategy::Any, &logger, RouteHandling::Continue));
        router.add_route(Route::new("/hello", MatchStrategy::Exact, body_handler("hi")).unwrap());

        let (dispatch, _, text) = run(&router, "/hello");
        assert_eq!(logger.load(Ordering::SeqCst), 1);
        assert_eq!(dispatch.matched, 2);
        assert!(!dispatch.default_used);
        assert!(text.ends_with("hi"));
    }

    #[test]
    fn test_custom_default_handler() {
        let mut router = Router::new();
        router.set_default_handler(|req, res| {
            res.set_status(410, "Gone");
            res.send_all(req.uri().as_bytes())?;
            Ok(RouteHandling::End)
        });

        let (dispatch, _, text) = run(&router, "/old");
        assert!(dispatch.default_used);
        assert!(text.starts_with("HTTP/1.1 410 Gone\r\n"));
        assert!(text.ends_with("/old"));
    }

    #[test]
    fn test_handler_error_propagates() {
        let mut router = Router::new();
        router.add_route(
            Route::new("/fail", MatchStrategy::Exact, |_req, _res| {
                Err(HttpError::HandlerFailed("boom".to_string()))
            })
            .unwrap(),
        );

        let mut req = request("/fail");
        let mut wire = Vec::new();
        let mut res = Response::new(&mut wire);
        let result = router.dispatch(&mut req, &mut res);

        assert!(matches!(result, Err(HttpError::HandlerFailed(_))));
    }
}
