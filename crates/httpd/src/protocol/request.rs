//! Request head and full request types.

use crate::protocol::{Headers, Method};
use bytes::Bytes;
use std::str::Utf8Error;

/// The request line and headers of a request, before its body is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    method: Method,
    path: String,
    headers: Headers,
}

impl RequestHead {
    pub fn new(method: Method, path: impl Into<String>, headers: Headers) -> Self {
        Self { method, path: path.into(), headers }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Attaches the materialized body, producing the full [`Request`].
    pub fn body(self, body: Bytes) -> Request {
        Request { method: self.method, path: self.path, headers: self.headers, body }
    }
}

/// A fully read request, as handed to callbacks and handlers.
///
/// `path` is the raw request target including any query string; no URL
/// decoding happens. The body has been read completely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    path: String,
    headers: Headers,
    body: Bytes,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self { method, path: path.into(), headers, body: body.into() }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path up to, not including, the first `?`
    pub fn path_without_query(&self) -> &str {
        self.path.split_once('?').map_or(self.path.as_str(), |(path, _)| path)
    }

    /// The raw query string after the first `?`, if any
    pub fn query(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, query)| query)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn body_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}
