use crate::io::Input;
use bytes::BytesMut;
use std::io;
use tokio_util::codec::Decoder;
use tracing::trace;

/// Default read size for [`FramedInput`]
pub const DEFAULT_READ_CAPACITY: usize = 8 * 1024;

/// Drives [`Decoder`]s over a blocking [`Input`].
///
/// Bytes are read into one buffer that outlives each frame, so whatever a
/// decoder leaves behind (the start of a pipelined request, unread trailers)
/// is seen by the next call. Different decoders may be used in turn over the
/// same buffer.
#[derive(Debug)]
pub struct FramedInput<I> {
    input: I,
    buffer: BytesMut,
    capacity: usize,
    eof: bool,
}

impl<I: Input> FramedInput<I> {
    pub fn new(input: I) -> Self {
        Self::with_capacity(input, DEFAULT_READ_CAPACITY)
    }

    pub fn with_capacity(input: I, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { input, buffer: BytesMut::with_capacity(capacity), capacity, eof: false }
    }

    /// Decodes the next frame, reading more input as long as the decoder asks
    /// for it.
    ///
    /// Once the input has ended the decoder sees the rest of the buffer through
    /// [`Decoder::decode_eof`]; `Ok(None)` then means a clean end of stream.
    pub fn next_frame<D>(&mut self, decoder: &mut D) -> Result<Option<D::Item>, D::Error>
    where
        D: Decoder,
        D::Error: From<io::Error>,
    {
        loop {
            if self.eof {
                return decoder.decode_eof(&mut self.buffer);
            }

            if let Some(frame) = decoder.decode(&mut self.buffer)? {
                return Ok(Some(frame));
            }

            self.fill()?;
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        let len = self.buffer.len();
        self.buffer.resize(len + self.capacity, 0);

        match self.input.input(&mut self.buffer[len..]) {
            Ok(0) => {
                self.buffer.truncate(len);
                trace!(buffered = len, "input reached end of stream");
                self.eof = true;
                Ok(())
            }
            Ok(n) => {
                self.buffer.truncate(len + n);
                Ok(())
            }
            Err(e) => {
                self.buffer.truncate(len);
                Err(e)
            }
        }
    }

    /// True once the input has reported end of stream
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn read_buffer(&self) -> &BytesMut {
        &self.buffer
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn close(&mut self) -> io::Result<()> {
        self.input.close()
    }

    pub fn into_inner(self) -> I {
        self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RequestDecoder;
    use crate::io::{SliceInput, fn_input};
    use crate::protocol::{Message, PayloadItem};
    use bytes::Bytes;
    use std::collections::VecDeque;

    #[test]
    fn frames_across_small_reads() {
        let raw = b"POST /a HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
        let mut framed = FramedInput::with_capacity(SliceInput::new(Bytes::from_static(raw)), 3);
        let mut decoder = RequestDecoder::new();

        let Some(Message::Header((head, _))) = framed.next_frame(&mut decoder).unwrap() else { panic!("expect head") };
        assert_eq!(head.path(), "/a");

        let mut body = Vec::new();
        loop {
            match framed.next_frame(&mut decoder).unwrap() {
                Some(Message::Payload(PayloadItem::Chunk(bytes))) => body.extend_from_slice(&bytes),
                Some(Message::Payload(PayloadItem::Eof)) => break,
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(body, b"hello");

        assert!(framed.next_frame(&mut decoder).unwrap().is_none());
        assert!(framed.is_eof());
    }

    #[test]
    fn read_error_is_propagated() {
        let mut reads: VecDeque<io::Result<&[u8]>> =
            VecDeque::from([Ok(&b"GET /"[..]), Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))]);
        let input = fn_input(move |dst: &mut [u8]| {
            let part = reads.pop_front().unwrap_or(Ok(&b""[..]))?;
            dst[..part.len()].copy_from_slice(part);
            Ok(part.len())
        });

        let mut framed = FramedInput::new(input);
        let e = framed.next_frame(&mut RequestDecoder::new()).unwrap_err();
        assert!(e.to_string().contains("denied"));
        assert_eq!(&framed.read_buffer()[..], b"GET /");
    }
}
