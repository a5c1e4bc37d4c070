//! Byte sinks.

use crate::buffer::ByteBuffer;
use crate::io::input::{is_disconnect, is_retryable};
use std::io;
use std::io::{ErrorKind, Write};
use tracing::trace;

/// Default capacity of the staging buffer of a [`WriteOutput`]
pub const DEFAULT_OUTPUT_CAPACITY: usize = 8 * 1024;

/// A buffered sink of bytes.
pub trait Output {
    fn output_char(&mut self, byte: u8) -> io::Result<()> {
        self.output(&[byte])
    }

    fn output(&mut self, src: &[u8]) -> io::Result<()>;

    /// Pushes everything buffered so far to the underlying transport.
    fn flush(&mut self) -> io::Result<()>;

    /// Flushes and releases the sink. Calling it more than once is a no-op.
    fn close(&mut self) -> io::Result<()>;
}

impl<O: Output + ?Sized> Output for &mut O {
    #[inline]
    fn output_char(&mut self, byte: u8) -> io::Result<()> {
        (**self).output_char(byte)
    }

    #[inline]
    fn output(&mut self, src: &[u8]) -> io::Result<()> {
        (**self).output(src)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    #[inline]
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<O: Output + ?Sized> Output for Box<O> {
    #[inline]
    fn output_char(&mut self, byte: u8) -> io::Result<()> {
        (**self).output_char(byte)
    }

    #[inline]
    fn output(&mut self, src: &[u8]) -> io::Result<()> {
        (**self).output(src)
    }

    #[inline]
    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    #[inline]
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Adapts an [`Output`] to [`std::io::Write`] so `write!` can format into it.
#[derive(Debug)]
pub struct OutputWrite<'a, O: ?Sized>(pub &'a mut O);

impl<O: Output + ?Sized> Write for OutputWrite<'_, O> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.output(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// [`Output`] over a blocking writer such as a `TcpStream`.
///
/// Bytes are staged in a fixed-capacity [`ByteBuffer`]; a real write happens
/// when the buffer fills up or on `flush`/`close`. Partial writes and
/// `WouldBlock`/`Interrupted` are retried until everything is written.
#[derive(Debug)]
pub struct WriteOutput<W> {
    writer: Option<W>,
    buffer: ByteBuffer,
    capacity: usize,
}

impl<W: Write> WriteOutput<W> {
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, DEFAULT_OUTPUT_CAPACITY)
    }

    pub fn with_capacity(writer: W, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { writer: Some(writer), buffer: ByteBuffer::with_capacity(capacity), capacity }
    }

    /// Bytes staged but not written yet
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn flush_buffer(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let writer = self.writer.as_mut().ok_or_else(closed_error)?;
        let result = write_fully(writer, self.buffer.as_slice());
        self.buffer.clear();
        result
    }
}

impl<W: Write> Output for WriteOutput<W> {
    fn output_char(&mut self, byte: u8) -> io::Result<()> {
        self.buffer.push(byte);
        if self.buffer.len() >= self.capacity {
            self.flush_buffer()?;
        }
        Ok(())
    }

    fn output(&mut self, src: &[u8]) -> io::Result<()> {
        if self.buffer.len() + src.len() <= self.capacity {
            self.buffer.extend_from_slice(src);
            if self.buffer.len() == self.capacity {
                self.flush_buffer()?;
            }
            return Ok(());
        }

        self.flush_buffer()?;
        if src.len() >= self.capacity {
            // too large to stage, hand it to the writer directly
            let writer = self.writer.as_mut().ok_or_else(closed_error)?;
            return write_fully(writer, src);
        }
        self.buffer.extend_from_slice(src);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buffer()?;
        match self.writer.as_mut() {
            Some(writer) => retry(|| writer.flush()),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        if self.writer.is_none() {
            return Ok(());
        }

        let result = self.flush();
        self.writer.take();
        self.buffer.clear();
        match result {
            Err(e) if is_disconnect(e.kind()) => Ok(()),
            other => other,
        }
    }
}

fn closed_error() -> io::Error {
    io::Error::new(ErrorKind::NotConnected, "output already closed")
}

fn write_fully<W: Write + ?Sized>(writer: &mut W, mut bytes: &[u8]) -> io::Result<()> {
    while !bytes.is_empty() {
        match writer.write(bytes) {
            Ok(0) => return Err(io::Error::from(ErrorKind::WriteZero)),
            Ok(n) => bytes = &bytes[n..],
            Err(e) if is_retryable(e.kind()) => trace!(kind = ?e.kind(), "write not ready, retry"),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn retry<F: FnMut() -> io::Result<()>>(mut f: F) -> io::Result<()> {
    loop {
        match f() {
            Err(e) if is_retryable(e.kind()) => trace!(kind = ?e.kind(), "flush not ready, retry"),
            other => return other,
        }
    }
}

/// [`Output`] collecting everything into memory.
#[derive(Debug, Default)]
pub struct BufferOutput {
    buffer: ByteBuffer,
    flushes: usize,
    closed: bool,
}

impl BufferOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// How many times `flush` was called
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn into_bytes(mut self) -> bytes::Bytes {
        self.buffer.split()
    }
}

impl Output for BufferOutput {
    fn output_char(&mut self, byte: u8) -> io::Result<()> {
        self.buffer.push(byte);
        Ok(())
    }

    fn output(&mut self, src: &[u8]) -> io::Result<()> {
        self.buffer.extend_from_slice(src);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// records every `write` call, optionally accepting only a few bytes per call
    #[derive(Clone, Default)]
    struct RecordingWriter {
        writes: Rc<RefCell<Vec<Vec<u8>>>>,
        max_per_write: Option<usize>,
    }

    impl Write for RecordingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = self.max_per_write.map_or(buf.len(), |max| max.min(buf.len()));
            self.writes.borrow_mut().push(buf[..n].to_vec());
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_only_when_full_or_flushed() {
        let writer = RecordingWriter::default();
        let writes = Rc::clone(&writer.writes);
        let mut output = WriteOutput::with_capacity(writer, 8);

        output.output(b"abc").unwrap();
        output.output_char(b'd').unwrap();
        assert!(writes.borrow().is_empty());
        assert_eq!(output.buffered(), 4);

        output.output(b"efgh").unwrap();
        assert_eq!(writes.borrow().len(), 1);
        assert_eq!(writes.borrow()[0], b"abcdefgh");

        output.output(b"ij").unwrap();
        output.flush().unwrap();
        assert_eq!(writes.borrow()[1], b"ij");
    }

    #[test]
    fn large_write_bypasses_buffer() {
        let writer = RecordingWriter::default();
        let writes = Rc::clone(&writer.writes);
        let mut output = WriteOutput::with_capacity(writer, 4);

        output.output(b"ab").unwrap();
        output.output(b"0123456789").unwrap();

        let writes = writes.borrow();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], b"ab");
        assert_eq!(writes[1], b"0123456789");
    }

    #[test]
    fn partial_writes_are_completed() {
        let writer = RecordingWriter { max_per_write: Some(3), ..Default::default() };
        let writes = Rc::clone(&writer.writes);
        let mut output = WriteOutput::with_capacity(writer, 64);

        output.output(b"hello world").unwrap();
        output.flush().unwrap();

        let joined: Vec<u8> = writes.borrow().concat();
        assert_eq!(joined, b"hello world");
        assert_eq!(writes.borrow().len(), 4);
    }

    #[test]
    fn close_flushes_once() {
        let writer = RecordingWriter::default();
        let writes = Rc::clone(&writer.writes);
        let mut output = WriteOutput::new(writer);

        output.output(b"bye").unwrap();
        output.close().unwrap();
        output.close().unwrap();

        assert_eq!(*writes.borrow(), vec![b"bye".to_vec()]);
    }

    #[test]
    fn format_through_output_write() {
        let mut output = BufferOutput::new();
        write!(OutputWrite(&mut output), "{:X}\r\n", 255).unwrap();
        assert_eq!(output.as_slice(), b"FF\r\n");
    }
}
