//! Request head decoder.
//!
//! Parses the request line and header fields with `httparse`, then picks the
//! body framing from `Content-Length` and `Transfer-Encoding`.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum head size: 8KB
//! - Only `HTTP/1.1` is accepted

use bytes::BytesMut;
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;

use crate::protocol::{CONTENT_LENGTH, Headers, Method, ParseError, PayloadSize, RequestHead, TRANSFER_ENCODING};

/// Maximum number of headers allowed in a request
pub const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire head section
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decoder for request heads, yielding the [`RequestHead`] and the
/// [`PayloadSize`] announced by its headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderDecoder;

impl Decoder for HeaderDecoder {
    type Item = (RequestHead, PayloadSize);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut req = httparse::Request::new(&mut headers);

        let parsed_result = req.parse(src).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            Error::Version => ParseError::InvalidVersion(None),
            Error::Token | Error::NewLine => ParseError::invalid_request_line(e),
            e => ParseError::invalid_header(e),
        });

        match parsed_result? {
            Status::Complete(body_offset) => {
                trace!(head_size = body_offset, "parsed request head");
                ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

                ensure!(req.version == Some(1), ParseError::InvalidVersion(req.version));

                let method = req.method.ok_or_else(|| ParseError::invalid_request_line("missing method"))?.parse::<Method>()?;
                let path = req.path.ok_or_else(|| ParseError::invalid_request_line("missing path"))?.to_owned();

                let mut fields = Headers::with_capacity(req.headers.len());
                for header in req.headers.iter() {
                    let value = std::str::from_utf8(header.value)
                        .map_err(|_| ParseError::invalid_header(format!("value of {} is not utf-8", header.name)))?;
                    fields.append(header.name, value);
                }

                let _ = src.split_to(body_offset);

                let payload_size = parse_payload(&fields)?;
                Ok(Some((RequestHead::new(method, path, fields), payload_size)))
            }
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                Ok(None)
            }
        }
    }

    /// A stream that ends between requests, possibly after stray line breaks,
    /// is a clean close. Ending inside a head is not.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.iter().all(|b| matches!(b, b'\r' | b'\n')) {
            src.clear();
            return Ok(None);
        }

        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None => Err(ParseError::invalid_request_line("connection closed inside request head")),
        }
    }
}

/// Picks the body framing announced by `headers`.
///
/// `Content-Length` wins over `Transfer-Encoding`. A length of zero means no
/// body. The only transfer coding understood is exactly `chunked`, anything
/// else fails with `500`.
pub fn parse_payload(headers: &Headers) -> Result<PayloadSize, ParseError> {
    if let Some(cl_value) = headers.get_ignore_case(CONTENT_LENGTH) {
        let length = cl_value
            .trim()
            .parse::<u64>()
            .map_err(|_| ParseError::invalid_content_length(format!("value {cl_value} is not u64")))?;

        return Ok(if length == 0 { PayloadSize::Empty } else { PayloadSize::Length(length) });
    }

    match headers.get_ignore_case(TRANSFER_ENCODING) {
        Some(te_value) if te_value.trim() == "chunked" => Ok(PayloadSize::Chunked),
        Some(te_value) => Err(ParseError::unsupported_transfer_encoding(te_value.trim())),
        None => Ok(PayloadSize::Empty),
    }
}
