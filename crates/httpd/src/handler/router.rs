use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use http::StatusCode;
use tracing::{debug, error, warn};

use super::filter::{self, AllFilter, Filter};
use super::{Handler, HandlerResult};
use crate::protocol::{Request, Response};

/// Replaces the request before dispatch, or returns `None` to keep it.
pub type RequestCallback = Box<dyn Fn(&Request) -> Option<Request> + Send + Sync>;

/// Gets the dispatched request and the current response, and returns the
/// response to continue with. Passing it through unchanged is a no-op.
pub type ResponseCallback = Box<dyn Fn(&Request, Response) -> Response + Send + Sync>;

/// A handler already bound to whatever a [`PathMatcher`] extracted from the
/// request.
pub type BoundHandler<'a> = Box<dyn FnOnce(&Request) -> HandlerResult + 'a>;

/// Decides whether it serves a request, usually from its method and path.
///
/// Returning `Some` claims the request; path handlers are tried in
/// registration order and the first claim wins.
pub trait PathMatcher: Send + Sync {
    fn bind(&self, request: &Request) -> Option<BoundHandler<'_>>;
}

/// A [`PathMatcher`] built from a closure, see [`fn_matcher`].
pub struct FnMatcher<F>(F);

impl<F> fmt::Debug for FnMatcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMatcher").finish_non_exhaustive()
    }
}

impl<F> PathMatcher for FnMatcher<F>
where
    F: Fn(&Request) -> Option<BoundHandler<'static>> + Send + Sync,
{
    fn bind(&self, request: &Request) -> Option<BoundHandler<'_>> {
        (self.0)(request)
    }
}

/// Builds a matcher that extracts values from the path and captures them in
/// the handler it returns.
///
/// ```
/// use http::StatusCode;
/// use micro_httpd::handler::{fn_matcher, BoundHandler};
/// use micro_httpd::protocol::{Request, Response};
///
/// let user = fn_matcher(|request| {
///     let id: u32 = request.path_without_query().strip_prefix("/users/")?.parse().ok()?;
///     let handler: BoundHandler<'static> =
///         Box::new(move |_: &Request| Ok(Response::make_raw(StatusCode::OK, format!("user {id}"))));
///     Some(handler)
/// });
/// ```
pub fn fn_matcher<F>(f: F) -> FnMatcher<F>
where
    F: Fn(&Request) -> Option<BoundHandler<'static>> + Send + Sync,
{
    FnMatcher(f)
}

/// A handler guarded by a filter.
pub struct Route {
    filters: AllFilter,
    handler: Box<dyn Handler>,
}

impl Route {
    pub fn new<F: Filter + 'static, H: Handler + 'static>(filter: F, handler: H) -> Self {
        let mut filters = filter::all_filter();
        filters.and(filter);
        Self { filters, handler: Box::new(handler) }
    }

    /// Adds another filter that must match too.
    pub fn with<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filters.and(filter);
        self
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").field("filters", &self.filters).finish_non_exhaustive()
    }
}

impl PathMatcher for Route {
    fn bind(&self, request: &Request) -> Option<BoundHandler<'_>> {
        if !self.filters.matches(request) {
            return None;
        }
        Some(Box::new(move |request: &Request| self.handler.call(request)))
    }
}

macro_rules! method_route {
    ($method:ident, $method_filter:ident) => {
        #[doc = concat!("A [`Route`] for `", stringify!($method), "` requests on exactly `path`.")]
        pub fn $method<H: Handler + 'static>(path: impl Into<String>, handler: H) -> Route {
            Route::new(filter::$method_filter(), handler).with(filter::path(path))
        }
    };
}

method_route!(get, get_method);
method_route!(post, post_method);
method_route!(put, put_method);
method_route!(head, head_method);

/// The frozen dispatch table shared by every connection.
pub struct Router {
    request_callbacks: Vec<RequestCallback>,
    response_callbacks: Vec<ResponseCallback>,
    path_handlers: Vec<Box<dyn PathMatcher>>,
    default_handler: Option<Box<dyn Handler>>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("request_callbacks", &self.request_callbacks.len())
            .field("response_callbacks", &self.response_callbacks.len())
            .field("path_handlers", &self.path_handlers.len())
            .field("default_handler", &self.default_handler.is_some())
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        RouterBuilder::new().build()
    }
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Runs `request` through callbacks and handlers and returns the response
    /// to send.
    ///
    /// Never panics on behalf of user code: a failing or panicking callback or
    /// handler yields a `500` response carrying the failure text.
    pub fn dispatch(&self, request: Request) -> Response {
        let mut request = request;
        let mut failure = None;

        for callback in &self.request_callbacks {
            match catch_unwind(AssertUnwindSafe(|| callback(&request))) {
                Ok(Some(replaced)) => request = replaced,
                Ok(None) => {}
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(cause = %message, "request callback panicked");
                    failure = Some(internal_error(message));
                    break;
                }
            }
        }

        let mut response = match failure {
            Some(response) => response,
            None => self.handle(&request),
        };

        for callback in &self.response_callbacks {
            let current = response;
            response = match catch_unwind(AssertUnwindSafe(|| callback(&request, current))) {
                Ok(response) => response,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(cause = %message, "response callback panicked");
                    internal_error(message)
                }
            };
        }

        response
    }

    fn handle(&self, request: &Request) -> Response {
        let result = catch_unwind(AssertUnwindSafe(|| {
            for matcher in &self.path_handlers {
                if let Some(bound) = matcher.bind(request) {
                    debug!(path = request.path(), "path handler matched");
                    return bound(request);
                }
            }

            match &self.default_handler {
                Some(handler) => handler.call(request),
                None => Ok(Response::fail(StatusCode::NOT_FOUND, "Not Found")),
            }
        }));

        match result {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(cause = %e, path = request.path(), "handler failed");
                internal_error(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(cause = %message, path = request.path(), "handler panicked");
                internal_error(message)
            }
        }
    }
}

fn internal_error(message: String) -> Response {
    Response::fail(StatusCode::INTERNAL_SERVER_ERROR, message)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_owned()
    }
}

/// Collects callbacks and handlers in registration order.
#[derive(Default)]
pub struct RouterBuilder {
    request_callbacks: Vec<RequestCallback>,
    response_callbacks: Vec<ResponseCallback>,
    path_handlers: Vec<Box<dyn PathMatcher>>,
    default_handler: Option<Box<dyn Handler>>,
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder").field("path_handlers", &self.path_handlers.len()).finish_non_exhaustive()
    }
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Request) -> Option<Request> + Send + Sync + 'static,
    {
        self.request_callbacks.push(Box::new(callback));
        self
    }

    pub fn response_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Request, Response) -> Response + Send + Sync + 'static,
    {
        self.response_callbacks.push(Box::new(callback));
        self
    }

    pub fn path_handler<M: PathMatcher + 'static>(mut self, matcher: M) -> Self {
        self.path_handlers.push(Box::new(matcher));
        self
    }

    pub fn route(self, route: Route) -> Self {
        self.path_handler(route)
    }

    /// Replaces the handler used when no path handler claims a request.
    pub fn default_handler<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.default_handler = Some(Box::new(handler));
        self
    }

    pub fn build(self) -> Router {
        Router {
            request_callbacks: self.request_callbacks,
            response_callbacks: self.response_callbacks,
            path_handlers: self.path_handlers,
            default_handler: self.default_handler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::make_handler;
    use crate::handler::filter::header;
    use crate::protocol::{Headers, Method};
    use std::convert::Infallible;

    fn text(body: &'static str) -> impl Handler {
        make_handler(move |_: &Request| Ok::<_, Infallible>(Response::make_raw(StatusCode::OK, body)))
    }

    fn request(method: Method, path: &str) -> Request {
        Request::new(method, path, Headers::new(), "")
    }

    fn body_of(response: &Response) -> &[u8] {
        response.body().as_bytes().unwrap()
    }

    #[test]
    fn first_match_wins() {
        let router = Router::builder()
            .route(get("/", text("first")).with(header("X-Skip", "1")))
            .route(get("/", text("second")))
            .route(get("/", text("third")))
            .route(post("/", text("post")))
            .build();

        assert_eq!(body_of(&router.dispatch(request(Method::Get, "/"))), b"second");
        assert_eq!(body_of(&router.dispatch(request(Method::Post, "/"))), b"post");
        assert_eq!(body_of(&router.dispatch(request(Method::Get, "/").with_header("X-Skip", "1"))), b"first");
    }

    #[test]
    fn default_handler_and_not_found() {
        let router = Router::builder().route(get("/a", text("a"))).build();
        assert_eq!(router.dispatch(request(Method::Get, "/b")).code(), StatusCode::NOT_FOUND);

        let router = Router::builder().default_handler(text("fallback")).build();
        assert_eq!(body_of(&router.dispatch(request(Method::Put, "/b"))), b"fallback");
    }

    #[test]
    fn matcher_extracts_from_path() {
        let router = Router::builder()
            .path_handler(fn_matcher(|request| {
                let id: u32 = request.path_without_query().strip_prefix("/users/")?.parse().ok()?;
                let handler: BoundHandler<'static> =
                    Box::new(move |_: &Request| Ok(Response::make_raw(StatusCode::OK, format!("user {id}"))));
                Some(handler)
            }))
            .build();

        assert_eq!(body_of(&router.dispatch(request(Method::Get, "/users/42"))), b"user 42");
        assert_eq!(router.dispatch(request(Method::Get, "/users/me")).code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn callbacks_run_in_order() {
        let router = Router::builder()
            .request_callback(|request| Some(request.clone().with_path("/rewritten")))
            .request_callback(|_| None)
            .response_callback(|request, response| response.with_header("X-Path", request.path()))
            .response_callback(|_, response| response)
            .default_handler(make_handler(|request: &Request| {
                Ok::<_, Infallible>(Response::make_raw(StatusCode::OK, request.path().to_owned()))
            }))
            .build();

        let response = router.dispatch(request(Method::Get, "/legacy"));
        assert_eq!(body_of(&response), b"/rewritten");
        assert_eq!(response.headers().get("X-Path"), Some("/rewritten"));
    }

    #[test]
    fn handler_error_is_500() {
        let router = Router::builder()
            .default_handler(make_handler(|_: &Request| Err::<Response, _>("disk on fire")))
            .build();

        let response = router.dispatch(request(Method::Get, "/"));
        assert_eq!(response.code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(&response), b"disk on fire");
    }

    #[test]
    fn panics_are_500() {
        let router = Router::builder()
            .route(get("/boom", make_handler(|_: &Request| -> Result<Response, Infallible> { panic!("boom") })))
            .request_callback(|request| if request.path() == "/cb" { panic!("callback failed") } else { None })
            .response_callback(|_, response| response.with_header("X-Seen", "yes"))
            .build();

        let response = router.dispatch(request(Method::Get, "/boom"));
        assert_eq!(response.code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(&response), b"boom");

        let response = router.dispatch(request(Method::Get, "/cb"));
        assert_eq!(response.code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers().get("X-Seen"), Some("yes"));
    }
}
