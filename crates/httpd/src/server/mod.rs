//! Blocking TCP front end.
//!
//! [`Server`] owns the listener and the accept loop. Every accepted socket is
//! wrapped as a [`ReadInput`](crate::io::ReadInput) /
//! [`WriteOutput`](crate::io::WriteOutput) pair and served by an
//! [`HttpConnection`](crate::connection::HttpConnection) inside a task handed
//! to a [`Spawn`] implementation.

mod spawn;
mod tcp_server;

pub use spawn::{Spawn, SpawnFn, Task, ThreadSpawner, spawn_fn};
pub use tcp_server::{DEFAULT_ADDRESS, DEFAULT_PORT, DEFAULT_READ_TIMEOUT, Server, ServerBuildError, ServerBuilder};
