//! # Sistema de Routing
//! src/router/mod.rs
//!
//! ```text
//! Request → Router → Handler → Response
//! ```
//!
//! Cada ruta se registra con un método y un patrón:
//!
//! - **Exacto**: `/metrics` sólo coincide consigo mismo.
//! - **Prefijo**: `/api/count/` coincide con `/api/count/<resto>`; el
//!   handler recibe `<resto>` (que puede contener `/`, ej: una URL).
//!
//! Si el path coincide pero el método no, responde 405. Si nada coincide,
//! 404.

use crate::http::{Method, Request, Response, StatusCode};

/// Un handler recibe el request y la parte del path que sigue al prefijo
pub type Handler = Box<dyn Fn(&Request, &str) -> Response + Send + Sync>;

/// Etiqueta usada para requests sin ruta registrada
pub const UNMATCHED_ROUTE: &str = "unmatched";

enum Pattern {
    Exact(String),
    Prefix(String),
}

impl Pattern {
    /// Retorna el resto del path si coincide
    fn matches<'a>(&self, path: &'a str) -> Option<&'a str> {
        match self {
            Pattern::Exact(exact) => (path == exact).then_some(""),
            Pattern::Prefix(prefix) => path.strip_prefix(prefix.as_str()),
        }
    }

    fn label(&self) -> &str {
        match self {
            Pattern::Exact(path) | Pattern::Prefix(path) => path,
        }
    }
}

struct Route {
    methods: Vec<Method>,
    pattern: Pattern,
    handler: Handler,
}

/// Router que mapea (método, path) a handlers
pub struct Router {
    routes: Vec<Route>,
    server_name: String,
}

impl Router {
    /// Crea un router vacío que firma sus respuestas con `server_name`
    pub fn new(server_name: &str) -> Self {
        Self {
            routes: Vec::new(),
            server_name: server_name.to_string(),
        }
    }

    /// Registra una ruta de path exacto
    ///
    /// # Ejemplo
    /// ```
    /// use serde_json::json;
    /// use wordcount_server::http::{Method, Request, Response};
    /// use wordcount_server::router::Router;
    ///
    /// let mut router = Router::new("test");
    /// router.exact(&[Method::GET], "/hello", |_req, _rest| {
    ///     Response::json(&json!({"message": "hello"}))
    /// });
    /// ```
    pub fn exact<F>(&mut self, methods: &[Method], path: &str, handler: F)
    where
        F: Fn(&Request, &str) -> Response + Send + Sync + 'static,
    {
        self.push(methods, Pattern::Exact(path.to_string()), Box::new(handler));
    }

    /// Registra una ruta por prefijo
    pub fn prefix<F>(&mut self, methods: &[Method], prefix: &str, handler: F)
    where
        F: Fn(&Request, &str) -> Response + Send + Sync + 'static,
    {
        self.push(methods, Pattern::Prefix(prefix.to_string()), Box::new(handler));
    }

    fn push(&mut self, methods: &[Method], pattern: Pattern, handler: Handler) {
        self.routes.push(Route {
            methods: methods.to_vec(),
            pattern,
            handler,
        });
    }

    /// Encuentra y ejecuta el handler apropiado para un request
    ///
    /// Retorna la respuesta junto con la etiqueta de la ruta (el patrón
    /// registrado), útil para métricas sin la parte variable del path.
    pub fn route(&self, request: &Request) -> (Response, &str) {
        let path = request.path();
        let mut path_matched = false;

        for route in &self.routes {
            let Some(rest) = route.pattern.matches(path) else {
                continue;
            };

            if !route.methods.contains(&request.method()) {
                path_matched = true;
                continue;
            }

            let mut response = (route.handler)(request, rest);
            self.add_common_headers(&mut response);
            return (response, route.pattern.label());
        }

        let mut response = if path_matched {
            Response::error(
                StatusCode::MethodNotAllowed,
                &format!("Method {} not allowed for {}", request.method().as_str(), path),
            )
        } else {
            Response::error(StatusCode::NotFound, &format!("Route not found: {}", path))
        };
        self.add_common_headers(&mut response);
        (response, UNMATCHED_ROUTE)
    }

    /// Agrega headers comunes a todas las respuestas
    pub fn add_common_headers(&self, response: &mut Response) {
        response.add_header("Server", &self.server_name);
        response.add_header("Connection", "close");
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
