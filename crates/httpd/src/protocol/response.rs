//! Response type and its body variants.

use crate::io::{Input, SliceInput, Writer};
use crate::protocol::Headers;
use bytes::Bytes;
use http::StatusCode;
use std::fmt;

/// Reason phrase written on the status line for `code`.
pub fn reason_phrase(code: StatusCode) -> &'static str {
    code.canonical_reason().unwrap_or("Unknown")
}

/// The body of a [`Response`].
pub enum ResponseBody {
    /// Fully materialized bytes, written verbatim
    Full(Bytes),
    /// Pull-style producer; each read becomes one chunk, a 0-byte read ends it
    Stream(Box<dyn Input + Send>),
    /// Push-style producer writing into a chunk-encoding sink
    Writer(Box<dyn Writer>),
}

impl ResponseBody {
    pub fn is_full(&self) -> bool {
        matches!(self, ResponseBody::Full(_))
    }

    /// The materialized bytes, for a `Full` body
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseBody::Full(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Full(bytes) => f.debug_tuple("Full").field(bytes).finish(),
            ResponseBody::Stream(_) => f.write_str("Stream(..)"),
            ResponseBody::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        ResponseBody::Full(bytes)
    }
}

#[derive(Debug)]
pub struct Response {
    code: StatusCode,
    headers: Headers,
    body: ResponseBody,
}

impl Response {
    pub fn new(code: StatusCode, headers: Headers, body: ResponseBody) -> Self {
        Self { code, headers, body }
    }

    /// A response with a materialized body and a matching `Content-Length`.
    pub fn make_raw(code: StatusCode, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let mut headers = Headers::new();
        headers.set(CONTENT_LENGTH, body.len().to_string());
        Self { code, headers, body: ResponseBody::Full(body) }
    }

    /// Same bytes as [`Response::make_raw`], but sent with chunked framing.
    pub fn make_raw_chunked(code: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::make_stream(code, SliceInput::new(body.into()))
    }

    /// A response whose body is pulled from `input` until it is exhausted.
    pub fn make_stream<I: Input + Send + 'static>(code: StatusCode, input: I) -> Self {
        Self::chunked(code, ResponseBody::Stream(Box::new(input)))
    }

    /// A response whose body is pushed by `writer`.
    pub fn make_writer<W: Writer + 'static>(code: StatusCode, writer: W) -> Self {
        Self::chunked(code, ResponseBody::Writer(Box::new(writer)))
    }

    /// `200` with the body on success, the given error code and message otherwise.
    pub fn make_string<B: Into<Bytes>>(result: Result<B, (StatusCode, String)>) -> Self {
        match result {
            Ok(body) => Self::make_raw(StatusCode::OK, body),
            Err((code, message)) => Self::fail(code, message),
        }
    }

    /// An error response carrying `message` as its body.
    pub fn fail(code: StatusCode, message: impl Into<String>) -> Self {
        Self::make_raw(code, message.into())
    }

    fn chunked(code: StatusCode, body: ResponseBody) -> Self {
        let mut headers = Headers::new();
        headers.set(TRANSFER_ENCODING, "chunked");
        Self { code, headers, body }
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub fn into_parts(self) -> (StatusCode, Headers, ResponseBody) {
        (self.code, self.headers, self.body)
    }

    pub fn with_code(mut self, code: StatusCode) -> Self {
        self.code = code;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }
}

pub(crate) const CONTENT_LENGTH: &str = "Content-Length";
pub(crate) const TRANSFER_ENCODING: &str = "Transfer-Encoding";
