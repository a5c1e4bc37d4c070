//! Composable request predicates used by [`Route`](super::Route).
//!
//! # Examples
//!
//! ```
//! use micro_httpd::handler::filter::{all_filter, get_method, header, path_prefix};
//!
//! let mut api = all_filter();
//! api.and(get_method()).and(path_prefix("/api/")).and(header("Accept", "application/json"));
//! ```

use crate::protocol::{Method, Request};

/// Predicate over a request.
///
/// Filters are shared by every connection thread, hence `Send + Sync`.
pub trait Filter: Send + Sync {
    fn matches(&self, req: &Request) -> bool;
}

impl<T: Filter + ?Sized> Filter for Box<T> {
    fn matches(&self, req: &Request) -> bool {
        (**self).matches(req)
    }
}

/// A filter that wraps a closure.
struct FnFilter<F: Fn(&Request) -> bool>(F);

impl<F: Fn(&Request) -> bool + Send + Sync> Filter for FnFilter<F> {
    fn matches(&self, req: &Request) -> bool {
        (self.0)(req)
    }
}

/// Creates a new filter from a closure.
///
/// ```
/// use micro_httpd::handler::filter::fn_filter;
///
/// let has_body = fn_filter(|req| !req.body().is_empty());
/// ```
pub fn fn_filter<F>(f: F) -> impl Filter
where
    F: Fn(&Request) -> bool + Send + Sync,
{
    FnFilter(f)
}

pub fn true_filter() -> TrueFilter {
    TrueFilter
}

pub fn false_filter() -> FalseFilter {
    FalseFilter
}

#[derive(Debug, Clone, Copy)]
pub struct TrueFilter;

impl Filter for TrueFilter {
    #[inline]
    fn matches(&self, _req: &Request) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FalseFilter;

impl Filter for FalseFilter {
    #[inline]
    fn matches(&self, _req: &Request) -> bool {
        false
    }
}

/// Creates a new OR-composed filter chain.
pub fn any_filter() -> AnyFilter {
    AnyFilter::new()
}

/// Succeeds when any inner filter does. An empty chain succeeds.
pub struct AnyFilter {
    filters: Vec<Box<dyn Filter>>,
}

impl AnyFilter {
    fn new() -> Self {
        Self { filters: vec![] }
    }

    pub fn or<F: Filter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl Filter for AnyFilter {
    fn matches(&self, req: &Request) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|filter| filter.matches(req))
    }
}

/// Creates a new AND-composed filter chain.
pub fn all_filter() -> AllFilter {
    AllFilter::new()
}

/// Succeeds when every inner filter does. An empty chain succeeds.
pub struct AllFilter {
    filters: Vec<Box<dyn Filter>>,
}

impl AllFilter {
    fn new() -> Self {
        Self { filters: vec![] }
    }

    pub fn and<F: Filter + 'static>(&mut self, filter: F) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl Filter for AllFilter {
    fn matches(&self, req: &Request) -> bool {
        self.filters.iter().all(|filter| filter.matches(req))
    }
}

impl std::fmt::Debug for AnyFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnyFilter").field("len", &self.filters.len()).finish()
    }
}

impl std::fmt::Debug for AllFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllFilter").field("len", &self.filters.len()).finish()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MethodFilter(Method);

impl Filter for MethodFilter {
    fn matches(&self, req: &Request) -> bool {
        self.0 == req.method()
    }
}

macro_rules! method_filter {
    ($method:ident, $variant:ident) => {
        #[doc = concat!("Creates a filter that matches ", stringify!($variant), " requests.")]
        #[inline]
        pub fn $method() -> MethodFilter {
            MethodFilter(Method::$variant)
        }
    };
}

method_filter!(get_method, Get);
method_filter!(post_method, Post);
method_filter!(put_method, Put);
method_filter!(head_method, Head);

/// Matches the path, query string excluded, exactly.
#[derive(Debug, Clone)]
pub struct PathFilter(String);

pub fn path(path: impl Into<String>) -> PathFilter {
    PathFilter(path.into())
}

impl Filter for PathFilter {
    fn matches(&self, req: &Request) -> bool {
        req.path_without_query() == self.0
    }
}

/// Matches paths starting with the given prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixFilter(String);

pub fn path_prefix(prefix: impl Into<String>) -> PathPrefixFilter {
    PathPrefixFilter(prefix.into())
}

impl Filter for PathPrefixFilter {
    fn matches(&self, req: &Request) -> bool {
        req.path_without_query().starts_with(&self.0)
    }
}

/// Matches a header by exact name and value.
#[derive(Debug, Clone)]
pub struct HeaderFilter(String, String);

pub fn header(name: impl Into<String>, value: impl Into<String>) -> HeaderFilter {
    HeaderFilter(name.into(), value.into())
}

impl Filter for HeaderFilter {
    fn matches(&self, req: &Request) -> bool {
        req.header(&self.0).is_some_and(|value| value == self.1)
    }
}
