//! HTTP codec module for encoding and decoding HTTP messages
//!
//! The decoders implement `tokio_util`'s [`Decoder`](tokio_util::codec::Decoder)
//! over a `BytesMut`, so they know nothing about where the bytes come from.
//! [`FramedInput`] runs them over a blocking [`Input`](crate::io::Input).
//!
//! - Request side:
//!   - [`RequestDecoder`]: head first, then payload items
//!   - [`HeaderDecoder`] and [`parse_payload`]: request line, headers and
//!     body framing
//!   - [`PayloadDecoder`], [`LengthDecoder`], [`ChunkedDecoder`]: body framings
//! - Response side:
//!   - [`ResponseEncoder`]: writes a [`Response`](crate::protocol::Response)
//!     onto an [`Output`](crate::io::Output)
//!   - [`HeaderEncoder`], [`ChunkedEncoder`]
//! - [`RequestEncoder`]: the client side counterpart of [`RequestDecoder`]

mod body;
mod framed;
mod header;
mod request_decoder;
mod request_encoder;
mod response_encoder;

pub use body::{ChunkedDecoder, ChunkedEncoder, LengthDecoder, PayloadDecoder};
pub use framed::{DEFAULT_READ_CAPACITY, FramedInput};
pub use header::{HeaderDecoder, HeaderEncoder, MAX_HEADER_BYTES, MAX_HEADER_NUM, parse_payload};
pub use request_decoder::RequestDecoder;
pub use request_encoder::RequestEncoder;
pub use response_encoder::{ResponseEncoder, STREAM_PULL_SIZE};
