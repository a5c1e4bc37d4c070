//! Streaming request decoder.
//!
//! Yields the request head first, then the payload as a sequence of
//! [`PayloadItem`]s ending with `Eof`.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use micro_httpd::codec::RequestDecoder;
//! use micro_httpd::protocol::{Message, PayloadItem};
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from(&b"POST /echo HTTP/1.1\r\nContent-Length: 2\r\n\r\nhi"[..]);
//!
//! assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_header());
//! match decoder.decode(&mut buffer).unwrap().unwrap() {
//!     Message::Payload(PayloadItem::Chunk(bytes)) => assert_eq!(&bytes[..], b"hi"),
//!     _ => unreachable!(),
//! }
//! ```

use crate::codec::body::PayloadDecoder;
use crate::codec::header::HeaderDecoder;
use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, RequestHead};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// A decoder for HTTP requests that handles both headers and payload
///
/// The decoder maintains its state through the `payload_decoder` field:
/// - `None`: Currently parsing headers
/// - `Some(PayloadDecoder)`: Currently parsing payload
#[derive(Debug)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    payload_decoder: Option<PayloadDecoder>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    /// True while the payload of the last decoded head is still being read
    pub fn in_payload(&self) -> bool {
        self.payload_decoder.is_some()
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self { header_decoder: HeaderDecoder, payload_decoder: None }
    }
}

impl RequestDecoder {
    fn on_payload(&mut self, item: Option<PayloadItem>) -> Option<Message<(RequestHead, PayloadSize)>> {
        match item {
            Some(item @ PayloadItem::Chunk(_)) => Some(Message::Payload(item)),
            Some(item @ PayloadItem::Eof) => {
                self.payload_decoder.take();
                Some(Message::Payload(item))
            }
            None => None,
        }
    }

    fn on_header(&mut self, head: Option<(RequestHead, PayloadSize)>) -> Option<Message<(RequestHead, PayloadSize)>> {
        head.map(|(head, payload_size)| {
            self.payload_decoder = Some(payload_size.into());
            Message::Header((head, payload_size))
        })
    }
}

impl Decoder for RequestDecoder {
    type Item = Message<(RequestHead, PayloadSize)>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode(src)?;
            return Ok(self.on_payload(item));
        }

        let head = self.header_decoder.decode(src)?;
        Ok(self.on_header(head))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload_decoder) = &mut self.payload_decoder {
            let item = payload_decoder.decode_eof(src)?;
            return Ok(self.on_payload(item));
        }

        let head = self.header_decoder.decode_eof(src)?;
        Ok(self.on_header(head))
    }
}
