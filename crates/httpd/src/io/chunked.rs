use crate::buffer::ByteBuffer;
use crate::codec::ChunkedEncoder;
use crate::io::Output;
use crate::protocol::PayloadItem;
use bytes::BytesMut;
use std::io;
use tokio_util::codec::Encoder;

/// Accumulated size at which [`ChunkEncoding`] emits a chunk on its own
pub const CHUNK_THRESHOLD: usize = 4096;

/// Decorates an [`Output`] so that writes leave it as HTTP chunks.
///
/// Writes accumulate until [`CHUNK_THRESHOLD`] bytes are pending, then go out
/// as one `SIZE\r\n payload \r\n` chunk. `flush` emits whatever is pending.
/// `close` emits the pending chunk and the `0\r\n\r\n` terminator exactly once,
/// flushes the inner sink, and closes it only when `close_inner` was requested.
#[derive(Debug)]
pub struct ChunkEncoding<O> {
    inner: O,
    pending: ByteBuffer,
    frame: BytesMut,
    encoder: ChunkedEncoder,
    close_inner: bool,
    closed: bool,
}

impl<O: Output> ChunkEncoding<O> {
    pub fn new(inner: O, close_inner: bool) -> Self {
        Self {
            inner,
            pending: ByteBuffer::with_capacity(CHUNK_THRESHOLD),
            frame: BytesMut::with_capacity(CHUNK_THRESHOLD + 16),
            encoder: ChunkedEncoder::new(),
            close_inner,
            closed: false,
        }
    }

    pub fn into_inner(self) -> O {
        self.inner
    }

    fn emit(&mut self, item: PayloadItem<&[u8]>) -> io::Result<()> {
        self.encoder.encode(item, &mut self.frame).map_err(io::Error::other)?;
        let result = self.inner.output(&self.frame);
        self.frame.clear();
        result
    }

    fn emit_pending(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        // the frame is built from the pending bytes, then the same buffer is reused
        self.encoder.encode(PayloadItem::Chunk(self.pending.as_slice()), &mut self.frame).map_err(io::Error::other)?;
        self.pending.clear();
        let result = self.inner.output(&self.frame);
        self.frame.clear();
        result
    }
}

impl<O: Output> Output for ChunkEncoding<O> {
    fn output_char(&mut self, byte: u8) -> io::Result<()> {
        self.pending.push(byte);
        if self.pending.len() >= CHUNK_THRESHOLD {
            self.emit_pending()?;
        }
        Ok(())
    }

    fn output(&mut self, src: &[u8]) -> io::Result<()> {
        self.pending.extend_from_slice(src);
        if self.pending.len() >= CHUNK_THRESHOLD {
            self.emit_pending()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit_pending()?;
        self.inner.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.emit_pending()?;
        self.emit(PayloadItem::Eof)?;
        self.inner.flush()?;
        if self.close_inner {
            self.inner.close()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ChunkedDecoder;
    use crate::io::BufferOutput;
    use tokio_util::codec::Decoder;

    fn decode_all(encoded: &[u8]) -> Vec<u8> {
        let mut src = BytesMut::from(encoded);
        let mut decoder = ChunkedDecoder::new();
        let mut body = Vec::new();
        loop {
            match decoder.decode(&mut src).unwrap().unwrap() {
                PayloadItem::Chunk(bytes) => body.extend_from_slice(&bytes),
                PayloadItem::Eof => break,
            }
        }
        assert!(src.is_empty());
        body
    }

    #[test]
    fn small_writes_wait_for_flush() {
        let mut sink = BufferOutput::new();
        let mut chunked = ChunkEncoding::new(&mut sink, false);

        chunked.output(b"ab").unwrap();
        chunked.output_char(b'c').unwrap();
        assert!(chunked.inner.as_slice().is_empty());

        chunked.flush().unwrap();
        assert_eq!(chunked.inner.as_slice(), b"3\r\nabc\r\n");

        // nothing pending, flush emits nothing
        chunked.flush().unwrap();
        assert_eq!(chunked.inner.as_slice(), b"3\r\nabc\r\n");
    }

    #[test]
    fn threshold_emits_chunk() {
        let mut sink = BufferOutput::new();
        let mut chunked = ChunkEncoding::new(&mut sink, false);

        chunked.output(&[b'x'; CHUNK_THRESHOLD - 1]).unwrap();
        assert!(chunked.inner.as_slice().is_empty());

        chunked.output_char(b'y').unwrap();
        let written = chunked.inner.as_slice();
        assert!(written.starts_with(b"1000\r\n"));
        assert_eq!(written.len(), 6 + CHUNK_THRESHOLD + 2);
    }

    #[test]
    fn close_writes_terminator_once() {
        let mut sink = BufferOutput::new();
        {
            let mut chunked = ChunkEncoding::new(&mut sink, false);
            chunked.close().unwrap();
            chunked.close().unwrap();
        }

        assert_eq!(sink.as_slice(), b"0\r\n\r\n");
        assert_eq!(sink.flushes(), 1);
        assert!(!sink.is_closed());
    }

    #[test]
    fn close_inner_when_requested() {
        let mut chunked = ChunkEncoding::new(BufferOutput::new(), true);
        chunked.output(b"hello").unwrap();
        chunked.close().unwrap();

        let sink = chunked.into_inner();
        assert!(sink.is_closed());
        assert_eq!(sink.as_slice(), b"5\r\nhello\r\n0\r\n\r\n");
    }

    #[test]
    fn encode_then_decode_is_identity() {
        for size in [0, 1, CHUNK_THRESHOLD - 1, CHUNK_THRESHOLD, CHUNK_THRESHOLD + 1, 3 * CHUNK_THRESHOLD + 17] {
            let body: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();

            let mut chunked = ChunkEncoding::new(BufferOutput::new(), false);
            // uneven write sizes so chunk boundaries fall anywhere
            for piece in body.chunks(1000) {
                chunked.output(piece).unwrap();
            }
            chunked.close().unwrap();

            let encoded = chunked.into_inner().into_bytes();
            assert_eq!(decode_all(&encoded), body, "size {size}");
        }
    }
}
