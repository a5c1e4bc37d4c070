//! Request head decoding and response head encoding.
//!
//! - [`HeaderDecoder`] parses the request line and header fields, enforcing
//!   [`MAX_HEADER_NUM`] and [`MAX_HEADER_BYTES`]
//! - [`parse_payload`] selects the body framing from the headers
//! - [`HeaderEncoder`] writes the status line and header fields

mod header_decoder;
mod header_encoder;

pub use header_decoder::{HeaderDecoder, MAX_HEADER_BYTES, MAX_HEADER_NUM, parse_payload};
pub use header_encoder::HeaderEncoder;
