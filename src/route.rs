//! Route pattern compilation.
//!
//! A pattern is a `/`-separated list of segments. `:name` segments capture
//! one path segment into a parameter; anything else must appear literally.
//!
//! | Pattern | Compiled matcher |
//! |---|---|
//! | `/` | `(?i)^/?$` |
//! | `/user/:uid` | `(?i)^/user/([^/]+?)/?$` |
//! | `/page/:pid/user/:uid` | `(?i)^/page/([^/]+?)/user/([^/]+?)/?$` |
//! | `/index.html` | `(?i)^/index\.html/?$` |
//!
//! Matching ignores case, including non-ASCII letters, and allows one
//! trailing `/`.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;

use crate::error::Error;
use crate::handler::BoxedMiddleware;
use crate::method::MethodSet;

/// One compiled route: a method set, a path matcher and the handler bound to
/// them.
pub struct RouteLayer {
    methods: MethodSet,
    pattern: String,
    matcher: Regex,
    param_names: Vec<String>,
    pub(crate) handler: BoxedMiddleware,
}

impl RouteLayer {
    /// Compiles `pattern` into a layer answering `methods`.
    ///
    /// Literal segments are escaped and parameters become plain capture
    /// groups, so the only way compilation fails is a matcher larger than the
    /// regex engine's size limit. That is reported as [`Error::InvalidRoute`].
    pub fn compile(
        methods: impl Into<MethodSet>,
        pattern: &str,
        handler: BoxedMiddleware,
    ) -> Result<Self, Error> {
        let (source, param_names) = translate(pattern);
        let matcher = Regex::new(&source).map_err(|e| Error::InvalidRoute {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })?;
        debug_assert_eq!(matcher.captures_len() - 1, param_names.len());

        Ok(Self {
            methods: methods.into(),
            pattern: pattern.to_owned(),
            matcher,
            param_names,
            handler,
        })
    }

    pub fn methods(&self) -> MethodSet { self.methods }
    pub fn pattern(&self) -> &str { &self.pattern }

    /// Parameter names in declaration order.
    pub fn param_names(&self) -> &[String] { &self.param_names }

    /// Whether the path portion of `url` (before any `?`) matches this route.
    pub fn matches(&self, url: &str) -> bool {
        self.matcher.is_match(path_of(url))
    }

    /// Whether this layer handles requests with method token `method`.
    pub fn accepts(&self, method: &str) -> bool {
        self.methods.accepts(method)
    }

    /// Binds each declared parameter to the segment it captured in `url`.
    ///
    /// Empty if the route declares no parameters or `url` does not match.
    pub fn extract_params(&self, url: &str) -> HashMap<String, String> {
        if self.param_names.is_empty() {
            return HashMap::new();
        }
        let Some(caps) = self.matcher.captures(path_of(url)) else {
            return HashMap::new();
        };

        self.param_names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                caps.get(i + 1).map(|m| (name.clone(), m.as_str().to_owned()))
            })
            .collect()
    }
}

impl fmt::Debug for RouteLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteLayer")
            .field("methods", &self.methods)
            .field("pattern", &self.pattern)
            .field("matcher", &self.matcher.as_str())
            .field("param_names", &self.param_names)
            .finish_non_exhaustive()
    }
}

fn path_of(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}

/// Turns a route pattern into regex source plus its parameter names.
fn translate(pattern: &str) -> (String, Vec<String>) {
    let mut source = String::from("(?i)^");
    let mut names = Vec::new();

    for segment in pattern.split('/').filter(|s| !s.is_empty()) {
        source.push('/');
        match param_name(segment) {
            Some(name) => {
                source.push_str("([^/]+?)");
                names.push(name.to_owned());
            }
            None => source.push_str(&regex::escape(segment)),
        }
    }

    source.push_str("/?$");
    (source, names)
}

/// `:name` where name is one or more ASCII word characters.
fn param_name(segment: &str) -> Option<&str> {
    let name = segment.strip_prefix(':')?;
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    (!name.is_empty() && name.chars().all(is_word)).then_some(name)
}
