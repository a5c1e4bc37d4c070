//! Byte channels the protocol code runs over.
//!
//! The connection never talks to a socket directly. It reads from an
//! [`Input`] and writes to an [`Output`], so the same code serves a
//! `TcpStream`, an in-memory buffer, or any other transport:
//!
//! - [`ReadInput`] / [`WriteOutput`]: blocking descriptors, with retry on
//!   would-block and disconnects reported as end of stream
//! - [`SliceInput`] / [`BufferOutput`]: in-memory
//! - [`Append`]: concatenation of two inputs
//! - [`ChunkEncoding`]: decorator turning raw writes into HTTP chunks
//! - [`Writer`]: push-style body producer

mod chunked;
mod input;
mod output;
mod writer;

pub use chunked::{CHUNK_THRESHOLD, ChunkEncoding};
pub use input::{Append, FnInput, Input, ReadInput, SliceInput, fn_input};
pub use output::{BufferOutput, DEFAULT_OUTPUT_CAPACITY, Output, OutputWrite, WriteOutput};
pub use writer::Writer;
