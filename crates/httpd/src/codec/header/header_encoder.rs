//! Response head encoder.
//!
//! Writes `HTTP/1.1 CODE REASON\r\n`, each header as `NAME: VALUE\r\n` in list
//! order, then the blank line. Headers are written exactly as the response
//! carries them; framing headers are set by the response constructors.

use crate::protocol::{Headers, SendError, reason_phrase};

use bytes::{BufMut, BytesMut};

use http::StatusCode;
use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl Encoder<(StatusCode, &Headers)> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (StatusCode, &Headers), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (status, headers) = item;

        dst.reserve(INIT_HEADER_SIZE);
        write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", status.as_str(), reason_phrase(status))?;

        for (name, value) in headers.iter() {
            dst.put_slice(name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_and_headers_in_order() {
        let headers: Headers = [("Content-Length", "2"), ("X-Tag", "a"), ("X-Tag", "b")].into_iter().collect();
        let mut dst = BytesMut::new();

        HeaderEncoder.encode((StatusCode::OK, &headers), &mut dst).unwrap();

        assert_eq!(&dst[..], b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nX-Tag: a\r\nX-Tag: b\r\n\r\n");
    }

    #[test]
    fn unknown_reason() {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode((StatusCode::from_u16(599).unwrap(), &Headers::new()), &mut dst).unwrap();
        assert_eq!(&dst[..], b"HTTP/1.1 599 Unknown\r\n\r\n");
    }
}
