use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, trace, warn};

use crate::buffer::ByteBuffer;
use crate::codec::{DEFAULT_READ_CAPACITY, FramedInput, RequestDecoder, ResponseEncoder};
use crate::handler::Router;
use crate::io::{Input, Output};
use crate::protocol::{HttpError, Message, ParseError, PayloadItem, PayloadSize, Request, RequestHead, Response};

const EXPECT: &str = "Expect";
const CONTINUE: &str = "100-continue";

/// Serves sequential requests read from one input channel, writing the
/// responses to one output channel.
///
/// Each request is read completely, body included, before it is dispatched.
/// The loop ends on a clean end of stream between requests, after any
/// request that could not be read (an error response is sent first), on a
/// failed write, or once `running` is cleared. Both channels are closed on
/// every exit path.
///
/// # Type Parameters
///
/// * `I`: where requests are read from
/// * `O`: where responses are written to
#[derive(Debug)]
pub struct HttpConnection<I, O> {
    framed: FramedInput<I>,
    output: O,
    decoder: RequestDecoder,
    encoder: ResponseEncoder,
    body: ByteBuffer,
}

impl<I, O> HttpConnection<I, O>
where
    I: Input,
    O: Output,
{
    pub fn new(input: I, output: O) -> Self {
        Self::with_capacity(input, output, DEFAULT_READ_CAPACITY)
    }

    /// Uses reads of up to `capacity` bytes
    pub fn with_capacity(input: I, output: O, capacity: usize) -> Self {
        Self {
            framed: FramedInput::with_capacity(input, capacity),
            output,
            decoder: RequestDecoder::new(),
            encoder: ResponseEncoder::new(),
            body: ByteBuffer::new(),
        }
    }

    pub fn process(mut self, router: &Router, running: &AtomicBool) -> Result<(), HttpError> {
        let result = self.serve(router, running);

        if let Err(e) = self.framed.close() {
            debug!(cause = %e, "failed to close connection input");
        }
        if let Err(e) = self.output.close() {
            debug!(cause = %e, "failed to close connection output");
        }

        result
    }

    fn serve(&mut self, router: &Router, running: &AtomicBool) -> Result<(), HttpError> {
        loop {
            if self.framed.read_buffer().is_empty() {
                self.framed.input_mut().mark_boundary();
            }

            let (head, payload_size) = match self.read_head() {
                Ok(Some(header)) => header,
                Ok(None) => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }
                Err(e) => return self.reject(e),
            };

            match expects_continue(&head) {
                Ok(true) => {
                    self.encoder.write_continue(&mut self.output)?;
                    debug!("receive expect request header, sent continue response");
                }
                Ok(false) => {}
                Err(e) => return self.reject(e),
            }

            let request = match self.read_body(head, payload_size) {
                Ok(request) => request,
                Err(e) => return self.reject(e),
            };

            debug!(method = %request.method(), path = request.path(), body_size = request.body().len(), "dispatch request");
            let response = router.dispatch(request);
            self.encoder.write_response(response, &mut self.output)?;

            if !running.load(Ordering::Acquire) {
                debug!("server stopped, finish connection");
                return Ok(());
            }
        }
    }

    fn read_head(&mut self) -> Result<Option<(RequestHead, PayloadSize)>, ParseError> {
        match self.framed.next_frame(&mut self.decoder)? {
            Some(Message::Header(header)) => Ok(Some(header)),
            Some(Message::Payload(_)) => Err(ParseError::invalid_body("need header while receive body")),
            None => Ok(None),
        }
    }

    fn read_body(&mut self, head: RequestHead, payload_size: PayloadSize) -> Result<Request, ParseError> {
        self.body.clear();
        trace!(?payload_size, "read request body");

        loop {
            match self.framed.next_frame(&mut self.decoder)? {
                Some(Message::Payload(PayloadItem::Chunk(bytes))) => self.body.extend_from_slice(&bytes),
                Some(Message::Payload(PayloadItem::Eof)) => break,
                Some(Message::Header(_)) => return Err(ParseError::invalid_body("need body while receive header")),
                None => return Err(ParseError::invalid_body("body too short")),
            }
        }

        Ok(head.body(self.body.split()))
    }

    /// Answers an unreadable request with its error status and gives up on
    /// the connection. Transport failures get no answer.
    fn reject(&mut self, e: ParseError) -> Result<(), HttpError> {
        warn!(cause = %e, "can't receive next request");
        if !matches!(e, ParseError::Io { .. }) {
            let response = Response::fail(e.status_code(), e.to_string());
            self.encoder.write_response(response, &mut self.output)?;
        }
        Err(e.into())
    }
}

/// `Ok(true)` when the client waits for `100 Continue` before sending its body.
fn expects_continue(head: &RequestHead) -> Result<bool, ParseError> {
    match head.headers().get_ignore_case(EXPECT) {
        None => Ok(false),
        Some(CONTINUE) => Ok(true),
        Some(other) => Err(ParseError::unexpected_expect(other)),
    }
}
