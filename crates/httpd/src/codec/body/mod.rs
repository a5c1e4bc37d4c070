//! Request body decoders and the chunk encoder used for responses.
//!
//! - [`PayloadDecoder`] picks the framing: [`LengthDecoder`] for
//!   `Content-Length`, [`ChunkedDecoder`] for chunked transfer coding, or no
//!   body at all
//! - [`ChunkedEncoder`] frames outgoing payload items as HTTP chunks

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod payload_decoder;

pub use chunked_decoder::ChunkedDecoder;
pub use chunked_encoder::ChunkedEncoder;
pub use length_decoder::LengthDecoder;
pub use payload_decoder::PayloadDecoder;
