//! Per-connection request/response loop.
//!
//! [`HttpConnection`] reads requests from an [`Input`](crate::io::Input),
//! answers `Expect: 100-continue`, dispatches through a
//! [`Router`](crate::handler::Router) and writes responses to an
//! [`Output`](crate::io::Output). It knows nothing about sockets, so it can be
//! embedded over any pair of channels.

mod http_connection;

pub use http_connection::HttpConnection;
