//! Response serialization onto an [`Output`].
//!
//! The head goes through [`HeaderEncoder`]. The body is written according to
//! its variant:
//!
//! - `Full`: the bytes verbatim, no write at all when empty
//! - `Stream`: pulled in pieces of up to [`STREAM_PULL_SIZE`] bytes, each piece
//!   framed as one chunk, ending with the empty chunk
//! - `Writer`: pushed through a [`ChunkEncoding`] wrapper that is closed, but
//!   whose inner output stays open
//!
//! The output is flushed once the whole response is written.

use crate::codec::body::ChunkedEncoder;
use crate::codec::header::HeaderEncoder;
use crate::io::{ChunkEncoding, Input, Output, Writer};
use crate::protocol::{PayloadItem, Response, ResponseBody, SendError};
use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::{trace, warn};

/// Largest piece pulled from a `Stream` body per chunk
pub const STREAM_PULL_SIZE: usize = 4096;

const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

#[derive(Debug)]
pub struct ResponseEncoder {
    header_encoder: HeaderEncoder,
    dst: BytesMut,
    pull: Box<[u8]>,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Writes the interim `100 Continue` response and flushes it.
    pub fn write_continue<O: Output + ?Sized>(&mut self, out: &mut O) -> Result<(), SendError> {
        out.output(CONTINUE)?;
        out.flush()?;
        Ok(())
    }

    /// Writes `response` completely, then flushes `out`.
    pub fn write_response<O: Output + ?Sized>(&mut self, response: Response, out: &mut O) -> Result<(), SendError> {
        let (code, headers, body) = response.into_parts();
        trace!(code = code.as_u16(), "write response");

        self.dst.clear();
        self.header_encoder.encode((code, &headers), &mut self.dst)?;
        out.output(&self.dst)?;
        self.dst.clear();

        match body {
            ResponseBody::Full(bytes) => {
                if !bytes.is_empty() {
                    out.output(&bytes)?;
                }
            }
            ResponseBody::Stream(input) => self.write_stream(input, out)?,
            ResponseBody::Writer(writer) => write_chunked(writer, out)?,
        }

        out.flush()?;
        Ok(())
    }

    fn write_stream<O: Output + ?Sized>(&mut self, mut input: Box<dyn Input + Send>, out: &mut O) -> Result<(), SendError> {
        let mut encoder = ChunkedEncoder::new();
        let result = loop {
            let n = match input.input(&mut self.pull) {
                Ok(n) => n,
                Err(e) => break Err(SendError::io(e)),
            };

            let item = if n == 0 { PayloadItem::Eof } else { PayloadItem::Chunk(&self.pull[..n]) };
            encoder.encode(item, &mut self.dst)?;
            let written = out.output(&self.dst);
            self.dst.clear();
            if let Err(e) = written {
                break Err(SendError::io(e));
            }

            if encoder.is_finish() {
                break Ok(());
            }
        };

        if let Err(e) = input.close() {
            warn!(cause = %e, "failed to close response stream");
        }
        result
    }
}

fn write_chunked<O: Output + ?Sized>(writer: Box<dyn Writer>, out: &mut O) -> Result<(), SendError> {
    let mut chunked = ChunkEncoding::new(out, false);
    writer.write_to(&mut chunked)?;
    chunked.close()?;
    Ok(())
}

impl Default for ResponseEncoder {
    fn default() -> Self {
        Self {
            header_encoder: HeaderEncoder,
            dst: BytesMut::with_capacity(1024),
            pull: vec![0; STREAM_PULL_SIZE].into_boxed_slice(),
        }
    }
}
