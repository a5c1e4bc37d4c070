//! A small, embeddable, blocking HTTP/1.1 server engine
//!
//! This crate accepts TCP connections, parses HTTP/1.1 requests, dispatches them
//! through user registered callbacks and handlers, and writes responses back.
//! Everything runs on plain blocking I/O; how connections are run concurrently
//! is left to a pluggable [`server::Spawn`] implementation (one thread per
//! connection by default, or a tokio runtime's blocking pool with the `tokio`
//! feature).
//!
//! # Features
//!
//! - HTTP/1.1 request parsing with `Content-Length` and chunked request bodies
//! - `Expect: 100-continue`
//! - Sequential requests on one connection
//! - Fixed, streamed (chunked) and push-style (chunked) response bodies
//! - Request/response callbacks and first-match routing
//! - Errors and panics in user code answered with `500`
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use micro_httpd::handler::{get, make_handler, post};
//! use micro_httpd::protocol::{Request, Response};
//! use micro_httpd::server::Server;
//! use std::convert::Infallible;
//! use std::sync::Arc;
//! use tracing::info;
//!
//! let server = Server::builder()
//!     .address("127.0.0.1")
//!     .port(8080)
//!     .request_callback(|request: &Request| {
//!         info!(path = request.path(), "incoming request");
//!         None
//!     })
//!     .route(get("/hello", make_handler(|_: &Request| {
//!         Ok::<_, Infallible>(Response::make_raw(StatusCode::OK, "Hello World!\r\n"))
//!     })))
//!     .route(post("/echo", make_handler(|request: &Request| {
//!         Ok::<_, Infallible>(Response::make_raw(StatusCode::OK, request.body().clone()))
//!     })))
//!     .build()
//!     .expect("valid server configuration");
//!
//! let server = Arc::new(server);
//! let stopper = Arc::clone(&server);
//! std::thread::spawn(move || {
//!     std::thread::sleep(std::time::Duration::from_secs(60));
//!     stopper.stop();
//! });
//!
//! server.run().expect("bind server");
//! ```
//!
//! # Architecture
//!
//! - [`io`]: byte channels ([`io::Input`], [`io::Output`]) the protocol runs over
//! - [`buffer`]: the growable byte buffer request bodies are collected in
//! - [`protocol`]: requests, responses, header maps and error types
//! - [`codec`]: request decoding and response encoding
//! - [`connection`]: the per connection request/response loop
//! - [`handler`]: handlers, filters and the router
//! - [`server`]: the TCP listener, accept loop and spawn capability
//!
//! ## Connection Handling
//!
//! [`connection::HttpConnection`] can be used without the TCP server: give it
//! any [`io::Input`] and [`io::Output`] and a [`handler::Router`]. It reads each
//! request fully, body included, before dispatching it, and serves requests in
//! order until the input ends, a request cannot be read, or the running flag is
//! cleared while it waits for the next request.
//!
//! ## Error Handling
//!
//! - [`protocol::ParseError`]: a request could not be read; each variant maps
//!   to the status code of the error response
//! - [`protocol::SendError`]: a response could not be written
//! - [`protocol::HttpError`]: what a connection ends with
//!
//! # Limitations
//!
//! - HTTP/1.1 only, no TLS
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64
//! - Request bodies are buffered in memory
//! - Connections are kept open after every response, `Connection: close` is
//!   not interpreted

pub mod buffer;
pub mod codec;
pub mod connection;
pub mod handler;
pub mod io;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
