//! Request routing and path matching.
//!
//! Routes map a method and a path template to a [`Target`]. Templates use
//! `{name}` segments to capture path parameters, which the dispatcher later
//! exposes to handlers.
//!
//! # Example
//!
//! ```rust
//! use hermes_core::{Handler, Reply};
//! use hermes_middleware::Target;
//! use hermes_server::{RouteResult, Router};
//! use http::Method;
//!
//! let info = Handler::plain("info", |_request, body| async move { Ok(Reply::json(body)) });
//!
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/info/{info_id}", info);
//!
//! let RouteResult::Matched(m) = router.match_route(&Method::GET, "/info/42") else {
//!     panic!("route should match");
//! };
//! assert_eq!(m.param("info_id"), Some("42"));
//!
//! assert!(matches!(
//!     router.match_route(&Method::POST, "/info/42"),
//!     RouteResult::MethodNotAllowed { .. }
//! ));
//! assert!(matches!(router.match_route(&Method::GET, "/nope"), RouteResult::NotFound));
//! ```

use std::borrow::Cow;
use std::collections::HashMap;

use hermes_middleware::Target;
use http::Method;

/// A matched route with its extracted path parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    target: Target,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Returns the route target.
    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Returns the extracted path parameters.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Returns one path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Splits the match into target and parameters.
    #[must_use]
    pub fn into_parts(self) -> (Target, HashMap<String, String>) {
        (self.target, self.params)
    }
}

/// Outcome of routing a request.
#[derive(Debug, Clone)]
pub enum RouteResult {
    /// A route matched method and path.
    Matched(RouteMatch),
    /// The path is known but not for this method.
    MethodNotAllowed {
        /// Methods registered for the path.
        allowed: Vec<Method>,
    },
    /// No route has this path.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<PathSegment>,
    pattern: String,
    target: Target,
}

impl Route {
    fn new(method: Method, pattern: &str, target: Target) -> Self {
        Self {
            method,
            segments: Self::parse_segments(pattern),
            pattern: pattern.to_string(),
            target,
        }
    }

    fn parse_segments(pattern: &str) -> Vec<PathSegment> {
        pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => PathSegment::Param(name.to_string()),
                None => PathSegment::Literal(s.to_string()),
            })
            .collect()
    }

    fn match_path(&self, path: &[&str]) -> Option<HashMap<String, String>> {
        if path.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, actual) in self.segments.iter().zip(path) {
            match segment {
                PathSegment::Literal(expected) if expected != actual => return None,
                PathSegment::Literal(_) => {}
                PathSegment::Param(name) => {
                    params.insert(name.clone(), (*actual).to_string());
                }
            }
        }
        Some(params)
    }
}

/// Percent-decodes one path segment. Segments that do not decode to UTF-8
/// are matched as sent.
fn decode_segment(segment: &str) -> Cow<'_, str> {
    urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment))
}

/// HTTP request router.
///
/// Routes are checked in registration order; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Adds a route.
    pub fn add_route(&mut self, method: Method, pattern: impl AsRef<str>, target: impl Into<Target>) {
        self.routes
            .push(Route::new(method, pattern.as_ref(), target.into()));
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Returns `(method, pattern)` for every route.
    pub fn patterns(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes.iter().map(|r| (&r.method, r.pattern.as_str()))
    }

    /// Routes a request.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> RouteResult {
        let decoded: Vec<Cow<'_, str>> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode_segment)
            .collect();
        let segments: Vec<&str> = decoded.iter().map(AsRef::as_ref).collect();
        let mut allowed = Vec::new();

        for route in &self.routes {
            let Some(params) = route.match_path(&segments) else {
                continue;
            };
            if route.method == *method {
                return RouteResult::Matched(RouteMatch {
                    target: route.target.clone(),
                    params,
                });
            }
            if !allowed.contains(&route.method) {
                allowed.push(route.method.clone());
            }
        }

        if allowed.is_empty() {
            RouteResult::NotFound
        } else {
            RouteResult::MethodNotAllowed { allowed }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{Handler, Reply};

    fn target(name: &str) -> Target {
        Target::handler(Handler::plain(name, |_request, body| async move {
            Ok(Reply::json(body))
        }))
    }

    fn matched(result: RouteResult) -> RouteMatch {
        match result {
            RouteResult::Matched(m) => m,
            other => panic!("expected a match, got {other:?}"),
        }
    }

    fn name(m: &RouteMatch) -> String {
        match m.target() {
            Target::Handler(h) => h.name().to_string(),
            Target::Passthrough(_) => "passthrough".to_string(),
        }
    }

    #[test]
    fn test_match_simple_path() {
        let mut router = Router::new();
        router.add_route(Method::POST, "/create", target("create"));

        let m = matched(router.match_route(&Method::POST, "/create"));
        assert_eq!(name(&m), "create");
        assert!(m.params().is_empty());
    }

    #[test]
    fn test_match_with_params() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/users/{user_id}/posts/{post_id}", target("post"));

        let m = matched(router.match_route(&Method::GET, "/users/7/posts/9"));
        assert_eq!(m.param("user_id"), Some("7"));
        assert_eq!(m.param("post_id"), Some("9"));
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/info/{info_id}", target("info"));
        router.add_route(Method::GET, "/people/{name}", target("person"));

        let m = matched(router.match_route(&Method::GET, "/info/%35"));
        assert_eq!(m.param("info_id"), Some("5"));

        let m = matched(router.match_route(&Method::GET, "/people/Ada%20Lovelace"));
        assert_eq!(m.param("name"), Some("Ada Lovelace"));

        let m = matched(router.match_route(&Method::GET, "/people/%FF"));
        assert_eq!(m.param("name"), Some("%FF"));
    }

    #[test]
    fn test_literal_segments_match_decoded_path() {
        let mut router = Router::new();
        router.add_route(Method::POST, "/create", target("create"));
        assert!(matches!(router.match_route(&Method::POST, "/cr%65ate"), RouteResult::Matched(_)));
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        let mut router = Router::new();
        router.add_route(Method::POST, "/read", target("read"));
        assert!(matches!(router.match_route(&Method::POST, "/read/"), RouteResult::Matched(_)));
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let mut router = Router::new();
        router.add_route(Method::POST, "/create", target("create"));
        router.add_route(Method::PUT, "/create", target("replace"));

        match router.match_route(&Method::GET, "/create") {
            RouteResult::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::POST, Method::PUT]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_not_found() {
        let mut router = Router::new();
        router.add_route(Method::POST, "/create", target("create"));
        assert!(matches!(router.match_route(&Method::POST, "/create/1"), RouteResult::NotFound));
        assert!(matches!(router.match_route(&Method::POST, "/"), RouteResult::NotFound));
    }

    #[test]
    fn test_first_match_wins() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/info/{id}", target("first"));
        router.add_route(Method::GET, "/info/{other}", target("second"));
        assert_eq!(name(&matched(router.match_route(&Method::GET, "/info/1"))), "first");
        assert_eq!(router.route_count(), 2);
    }
}
