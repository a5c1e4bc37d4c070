//! Client side serialization of a [`Request`].
//!
//! The server never sends requests; this encoder exists for tests, benches
//! and embedding programs that want to talk to a server over a channel.

use crate::protocol::{CONTENT_LENGTH, Request, SendError};
use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

/// Writes `METHOD PATH HTTP/1.1`, the headers in order, then the body.
///
/// A non-empty body without a `Content-Length` header gets one appended so the
/// peer can frame it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestEncoder;

impl Encoder<&Request> for RequestEncoder {
    type Error = SendError;

    fn encode(&mut self, request: &Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let body = request.body();
        dst.reserve(request.path().len() + body.len() + 64);

        dst.put_slice(request.method().as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(request.path().as_bytes());
        dst.put_slice(b" HTTP/1.1\r\n");

        for (name, value) in request.headers().iter() {
            dst.put_slice(name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        if !body.is_empty() && request.headers().get_ignore_case(CONTENT_LENGTH).is_none() {
            dst.put_slice(format!("{CONTENT_LENGTH}: {}\r\n", body.len()).as_bytes());
        }
        dst.put_slice(b"\r\n");
        dst.put_slice(body);
        Ok(())
    }
}
