//! Byte sources.
//!
//! [`Input`] is the pull side of a connection. Reading returns `0` only at a
//! real end of stream, never to ask the caller to try again: implementations
//! backed by a descriptor absorb `WouldBlock` and friends themselves.

use bytes::{Buf, Bytes};
use std::io;
use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// A source of bytes.
pub trait Input {
    /// Reads up to `dst.len()` bytes into `dst` and returns how many were
    /// written. `Ok(0)` means end of stream.
    fn input(&mut self, dst: &mut [u8]) -> io::Result<usize>;

    /// Fills `dst` completely, failing with [`ErrorKind::UnexpectedEof`] when
    /// the stream ends first.
    fn really_input(&mut self, dst: &mut [u8]) -> io::Result<()> {
        let mut filled = 0;
        while filled < dst.len() {
            match self.input(&mut dst[filled..])? {
                0 => {
                    return Err(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        format!("end of stream after {filled} of {} bytes", dst.len()),
                    ));
                }
                n => filled += n,
            }
        }
        Ok(())
    }

    /// Releases the source. Calling it more than once is a no-op.
    fn close(&mut self) -> io::Result<()>;

    /// Marks a message boundary: nothing of the next message has been read
    /// yet. Sources that give up waiting on shutdown only do so at a
    /// boundary, never in the middle of a message.
    fn mark_boundary(&mut self) {}
}

impl<I: Input + ?Sized> Input for &mut I {
    #[inline]
    fn input(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        (**self).input(dst)
    }

    #[inline]
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }

    #[inline]
    fn mark_boundary(&mut self) {
        (**self).mark_boundary();
    }
}

impl<I: Input + ?Sized> Input for Box<I> {
    #[inline]
    fn input(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        (**self).input(dst)
    }

    #[inline]
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }

    #[inline]
    fn mark_boundary(&mut self) {
        (**self).mark_boundary();
    }
}

/// Errors meaning the peer went away; reported as a plain end of stream.
pub(crate) fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof
    )
}

/// Errors after which the same call should simply be retried.
pub(crate) fn is_retryable(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted)
}

/// [`Input`] over a blocking reader such as a `TcpStream`.
///
/// A socket read timeout acts as the bounded readiness wait: when it expires
/// the read is retried. If a shutdown flag was attached and has been cleared,
/// an expired wait at a message boundary is reported as end of stream
/// instead, so idle connections wind down once the server stops. A message
/// already started is still read to its end.
#[derive(Debug)]
pub struct ReadInput<R> {
    reader: Option<R>,
    running: Option<Arc<AtomicBool>>,
    at_boundary: bool,
}

impl<R: Read> ReadInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader: Some(reader), running: None, at_boundary: true }
    }

    pub fn until_stopped(reader: R, running: Arc<AtomicBool>) -> Self {
        Self { reader: Some(reader), running: Some(running), at_boundary: true }
    }

    fn stopped_while_idle(&self) -> bool {
        self.at_boundary && self.running.as_ref().is_some_and(|running| !running.load(Ordering::Acquire))
    }
}

impl<R: Read> Input for ReadInput<R> {
    fn input(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        loop {
            let Some(reader) = self.reader.as_mut() else {
                return Ok(0);
            };

            match reader.read(dst) {
                Ok(n) => {
                    if n > 0 {
                        self.at_boundary = false;
                    }
                    return Ok(n);
                }
                Err(e) if is_disconnect(e.kind()) => {
                    debug!(cause = %e, "peer disconnected, treat as end of stream");
                    return Ok(0);
                }
                Err(e) if is_retryable(e.kind()) => {
                    if e.kind() != ErrorKind::Interrupted && self.stopped_while_idle() {
                        debug!("server stopped while waiting for next request");
                        return Ok(0);
                    }
                    trace!(kind = ?e.kind(), "read not ready, retry");
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.reader.take();
        Ok(())
    }

    fn mark_boundary(&mut self) {
        self.at_boundary = true;
    }
}

/// [`Input`] over bytes held in memory.
#[derive(Debug, Clone, Default)]
pub struct SliceInput {
    bytes: Bytes,
}

impl SliceInput {
    pub fn new<B: Into<Bytes>>(bytes: B) -> Self {
        Self { bytes: bytes.into() }
    }

    /// Bytes not read yet
    pub fn remaining(&self) -> &[u8] {
        &self.bytes
    }
}

impl Input for SliceInput {
    fn input(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let n = dst.len().min(self.bytes.len());
        dst[..n].copy_from_slice(&self.bytes[..n]);
        self.bytes.advance(n);
        Ok(n)
    }

    fn close(&mut self) -> io::Result<()> {
        self.bytes.clear();
        Ok(())
    }
}

/// Reads `first` until it is exhausted, then `second`.
#[derive(Debug)]
pub struct Append<A, B> {
    first: A,
    second: B,
    first_done: bool,
}

impl<A: Input, B: Input> Append<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second, first_done: false }
    }
}

impl<A: Input, B: Input> Input for Append<A, B> {
    fn input(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        if dst.is_empty() {
            return Ok(0);
        }

        if !self.first_done {
            match self.first.input(dst)? {
                0 => self.first_done = true,
                n => return Ok(n),
            }
        }
        self.second.input(dst)
    }

    fn close(&mut self) -> io::Result<()> {
        let first = self.first.close();
        let second = self.second.close();
        first.and(second)
    }

    fn mark_boundary(&mut self) {
        self.first.mark_boundary();
        self.second.mark_boundary();
    }
}

/// An [`Input`] driven by a closure, see [`fn_input`].
pub struct FnInput<F> {
    f: F,
}

impl<F> std::fmt::Debug for FnInput<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnInput").finish_non_exhaustive()
    }
}

/// Turns a producer closure into an [`Input`].
///
/// The closure fills the given buffer and returns how many bytes it wrote;
/// returning `0` ends the stream.
///
/// ```
/// use micro_httpd::io::{fn_input, Input};
///
/// let mut parts = vec![&b"c"[..], &b"ab"[..]];
/// let mut input = fn_input(move |dst: &mut [u8]| {
///     let part = parts.pop().unwrap_or_default();
///     dst[..part.len()].copy_from_slice(part);
///     Ok(part.len())
/// });
///
/// let mut buf = [0u8; 8];
/// assert_eq!(input.input(&mut buf).unwrap(), 2);
/// ```
pub fn fn_input<F>(f: F) -> FnInput<F>
where
    F: FnMut(&mut [u8]) -> io::Result<usize>,
{
    FnInput { f }
}

impl<F> Input for FnInput<F>
where
    F: FnMut(&mut [u8]) -> io::Result<usize>,
{
    #[inline]
    fn input(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        (self.f)(dst)
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}
