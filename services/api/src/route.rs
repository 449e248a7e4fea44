//! Route table and path matcher.
//!
//! Patterns are `/`-delimited segment lists. A `:name` segment binds exactly
//! one non-empty path segment; every other segment matches literally, and a
//! pattern only matches paths with the same number of segments. Within one
//! method, patterns are tried in registration order and the first match wins.
//! The `*` pattern is a method-wide fallback, tried after every other pattern
//! of that method.

use std::fmt;

use axum::http::Method;

/// Path parameters bound by a matched pattern, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// One `/`-delimited piece of a [`RoutePattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route pattern such as `/register`, `/delete/:id` or `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    Wildcard,
    Path { raw: String, segments: Vec<Segment> },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("route pattern `{0}` must start with `/`")]
    MissingLeadingSlash(String),
    #[error("route pattern `{0}` has an unnamed parameter")]
    EmptyParamName(String),
    #[error("route pattern `{pattern}` binds `{name}` more than once")]
    DuplicateParam { pattern: String, name: String },
    #[error("route {method} `{pattern}` is registered twice")]
    DuplicateRoute { method: Method, pattern: String },
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if raw == "*" {
            return Ok(Self::Wildcard);
        }
        let rest = raw
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(raw.to_owned()))?;

        let mut segments = Vec::new();
        for part in rest.split('/') {
            let segment = match part.strip_prefix(':') {
                Some("") => return Err(PatternError::EmptyParamName(raw.to_owned())),
                Some(name) => {
                    let taken = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Param(existing) if existing == name));
                    if taken {
                        return Err(PatternError::DuplicateParam {
                            pattern: raw.to_owned(),
                            name: name.to_owned(),
                        });
                    }
                    Segment::Param(name.to_owned())
                }
                None => Segment::Literal(part.to_owned()),
            };
            segments.push(segment);
        }

        Ok(Self::Path {
            raw: raw.to_owned(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Wildcard => "*",
            Self::Path { raw, .. } => raw,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Literal prefix before the first parameter segment: `/delete/:id` → `/delete`.
    ///
    /// This is the key under which requests are logged, so every id hitting a
    /// parameterized route collapses onto one endpoint. `None` for `*`.
    pub fn base_path(&self) -> Option<String> {
        let Self::Path { segments, .. } = self else {
            return None;
        };
        let literals: Vec<&str> = segments
            .iter()
            .map_while(|s| match s {
                Segment::Literal(lit) => Some(lit.as_str()),
                Segment::Param(_) => None,
            })
            .collect();
        Some(format!("/{}", literals.join("/")))
    }

    /// Match a request path (no query string), returning bound parameters.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let segments = match self {
            Self::Wildcard => return Some(PathParams::default()),
            Self::Path { segments, .. } => segments,
        };
        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() != segments.len() {
            return None;
        }

        let mut params = Vec::new();
        for (segment, part) in segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if part.is_empty() => return None,
                Segment::Param(name) => params.push((name.clone(), part.to_owned())),
            }
        }
        Some(PathParams(params))
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered pattern and its handler.
#[derive(Debug)]
pub struct Route<H> {
    pub method: Method,
    pub pattern: RoutePattern,
    pub handler: H,
}

#[derive(Debug)]
struct MethodRoutes<H> {
    method: Method,
    routes: Vec<Route<H>>,
    fallback: Option<Route<H>>,
}

/// Result of looking up `(method, path)`.
#[derive(Debug)]
pub enum RouteMatch<'a, H> {
    Found {
        route: &'a Route<H>,
        params: PathParams,
    },
    /// The method has routes, but none matches the path.
    NotFound,
    /// No route at all is registered for the method.
    MethodNotRecognized,
}

/// Immutable-after-build routing table, `method → ordered patterns → handler`.
#[derive(Debug)]
pub struct RouteTable<H> {
    methods: Vec<MethodRoutes<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self {
            methods: Vec::new(),
        }
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` + `pattern`. Registration order is match order.
    pub fn route(mut self, method: Method, pattern: &str, handler: H) -> Result<Self, PatternError> {
        let pattern = RoutePattern::parse(pattern)?;
        let entry = match self.methods.iter().position(|m| m.method == method) {
            Some(idx) => &mut self.methods[idx],
            None => {
                self.methods.push(MethodRoutes {
                    method: method.clone(),
                    routes: Vec::new(),
                    fallback: None,
                });
                let last = self.methods.len() - 1;
                &mut self.methods[last]
            }
        };

        let duplicate = if pattern.is_wildcard() {
            entry.fallback.is_some()
        } else {
            entry.routes.iter().any(|r| r.pattern == pattern)
        };
        if duplicate {
            return Err(PatternError::DuplicateRoute {
                method,
                pattern: pattern.as_str().to_owned(),
            });
        }

        let route = Route {
            method,
            pattern,
            handler,
        };
        if route.pattern.is_wildcard() {
            entry.fallback = Some(route);
        } else {
            entry.routes.push(route);
        }
        Ok(self)
    }

    pub fn find(&self, method: &Method, path: &str) -> RouteMatch<'_, H> {
        let Some(entry) = self.methods.iter().find(|m| &m.method == method) else {
            return RouteMatch::MethodNotRecognized;
        };
        entry
            .routes
            .iter()
            .chain(entry.fallback.iter())
            .find_map(|route| {
                route
                    .pattern
                    .matches(path)
                    .map(|params| RouteMatch::Found { route, params })
            })
            .unwrap_or(RouteMatch::NotFound)
    }

    /// All registered routes, grouped by method in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route<H>> {
        self.methods
            .iter()
            .flat_map(|m| m.routes.iter().chain(m.fallback.iter()))
    }
}
