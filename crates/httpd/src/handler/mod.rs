//! Request handlers and the router dispatching to them.
//!
//! A [`Handler`] turns a fully read [`Request`] into a [`Response`]. The
//! [`Router`] runs the request callbacks, picks the first [`PathMatcher`] that
//! binds the request (or the default handler), then runs the response
//! callbacks. Errors and panics from user code become `500` responses.

use std::error::Error;
use std::marker::PhantomData;

use crate::protocol::{Request, Response};

pub mod filter;
mod router;

pub use router::{BoundHandler, FnMatcher, PathMatcher, RequestCallback, ResponseCallback, Route, Router, RouterBuilder};
pub use router::{fn_matcher, get, head, post, put};

/// Error type handlers may fail with
pub type BoxError = Box<dyn Error + Send + Sync>;

pub type HandlerResult = Result<Response, BoxError>;

pub trait Handler: Send + Sync {
    fn call(&self, request: &Request) -> HandlerResult;
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn call(&self, request: &Request) -> HandlerResult {
        (**self).call(request)
    }
}

impl<H: Handler + ?Sized> Handler for std::sync::Arc<H> {
    fn call(&self, request: &Request) -> HandlerResult {
        (**self).call(request)
    }
}

/// A [`Handler`] built from a function, see [`make_handler`].
pub struct HandlerFn<F, E> {
    f: F,
    _error: PhantomData<fn() -> E>,
}

impl<F, E> std::fmt::Debug for HandlerFn<F, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

impl<F, E> Handler for HandlerFn<F, E>
where
    F: Fn(&Request) -> Result<Response, E> + Send + Sync,
    E: Into<BoxError>,
{
    fn call(&self, request: &Request) -> HandlerResult {
        (self.f)(request).map_err(Into::into)
    }
}

/// Wraps a function returning `Result<Response, E>` as a [`Handler`].
///
/// ```
/// use http::StatusCode;
/// use micro_httpd::handler::{make_handler, Handler};
/// use micro_httpd::protocol::{Headers, Method, Request, Response};
/// use std::convert::Infallible;
///
/// let handler = make_handler(|request: &Request| {
///     Ok::<_, Infallible>(Response::make_raw(StatusCode::OK, format!("you asked for {}", request.path())))
/// });
///
/// let request = Request::new(Method::Get, "/a", Headers::new(), "");
/// assert_eq!(handler.call(&request).unwrap().code(), StatusCode::OK);
/// ```
pub fn make_handler<F, E>(f: F) -> HandlerFn<F, E>
where
    F: Fn(&Request) -> Result<Response, E> + Send + Sync,
    E: Into<BoxError>,
{
    HandlerFn { f, _error: PhantomData }
}
