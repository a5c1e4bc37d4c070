//! Core HTTP protocol types.
//!
//! This module holds the data model shared by the codec, the connection
//! driver and user handlers:
//!
//! - **Messages** ([`Message`], [`PayloadItem`], [`PayloadSize`]): items produced
//!   by the decoders and consumed by the chunk encoder
//! - **Requests** ([`RequestHead`], [`Request`]): a parsed head, and the head
//!   plus its fully read body
//! - **Responses** ([`Response`], [`ResponseBody`]): status, headers and one of
//!   three body variants
//! - **Errors** ([`HttpError`], [`ParseError`], [`SendError`])
//!
//! Header names keep their wire spelling, see [`Headers`].

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod method;
pub use method::Method;

mod headers;
pub use headers::Headers;

mod request;
pub use request::Request;
pub use request::RequestHead;

mod response;
pub use response::Response;
pub use response::ResponseBody;
pub use response::reason_phrase;
pub(crate) use response::{CONTENT_LENGTH, TRANSFER_ENCODING};

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
