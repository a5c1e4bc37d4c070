use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::spawn::{Spawn, ThreadSpawner};
use crate::codec::DEFAULT_READ_CAPACITY;
use crate::connection::HttpConnection;
use crate::handler::{Handler, PathMatcher, Route, Router, RouterBuilder};
use crate::io::{ReadInput, WriteOutput};
use crate::protocol::{Request, Response};

pub const DEFAULT_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

const WAKE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("invalid address {address}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("no ipv4 address found for {address}")]
    NoIpv4Address { address: String },
    #[error("read timeout must be greater than zero")]
    ZeroReadTimeout,
    #[error("buffer size must be greater than zero")]
    ZeroBufferSize,
}

/// Collects the configuration and the routing table of a [`Server`].
///
/// Everything registered here is frozen by [`build`](Self::build); a running
/// server never sees new routes or callbacks.
pub struct ServerBuilder {
    address: String,
    port: u16,
    spawner: Arc<dyn Spawn>,
    read_timeout: Duration,
    buffer_size: usize,
    router: RouterBuilder,
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("read_timeout", &self.read_timeout)
            .field("buffer_size", &self.buffer_size)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl ServerBuilder {
    fn new() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_owned(),
            port: DEFAULT_PORT,
            spawner: Arc::new(ThreadSpawner::new()),
            read_timeout: DEFAULT_READ_TIMEOUT,
            buffer_size: DEFAULT_READ_CAPACITY,
            router: RouterBuilder::new(),
        }
    }

    /// Host name or IPv4 literal to listen on.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// `0` lets the OS pick a free port, see [`Server::local_addr`].
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn spawner<S: Spawn + 'static>(mut self, spawner: S) -> Self {
        self.spawner = Arc::new(spawner);
        self
    }

    /// How long a connection waits for data before checking whether the
    /// server was stopped.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Size of each connection's read and write buffers.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn request_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Request) -> Option<Request> + Send + Sync + 'static,
    {
        self.router = self.router.request_callback(callback);
        self
    }

    pub fn response_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Request, Response) -> Response + Send + Sync + 'static,
    {
        self.router = self.router.response_callback(callback);
        self
    }

    pub fn path_handler<M: PathMatcher + 'static>(mut self, matcher: M) -> Self {
        self.router = self.router.path_handler(matcher);
        self
    }

    pub fn route(mut self, route: Route) -> Self {
        self.router = self.router.route(route);
        self
    }

    pub fn default_handler<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.router = self.router.default_handler(handler);
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        if self.read_timeout.is_zero() {
            return Err(ServerBuildError::ZeroReadTimeout);
        }
        if self.buffer_size == 0 {
            return Err(ServerBuildError::ZeroBufferSize);
        }

        let address = resolve_ipv4(&self.address, self.port)?;
        debug!(%address, "server address resolved");

        Ok(Server {
            address,
            spawner: self.spawner,
            read_timeout: self.read_timeout,
            buffer_size: self.buffer_size,
            router: Arc::new(self.router.build()),
            running: Arc::new(AtomicBool::new(false)),
            lifecycle: Mutex::new(Lifecycle::Idle),
            local_addr: Mutex::new(None),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }
}

fn resolve_ipv4(host: &str, port: u16) -> Result<SocketAddr, ServerBuildError> {
    let candidates = (host, port)
        .to_socket_addrs()
        .map_err(|source| ServerBuildError::InvalidAddress { address: host.to_owned(), source })?;

    candidates
        .into_iter()
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| ServerBuildError::NoIpv4Address { address: host.to_owned() })
}

/// A blocking HTTP/1.1 server over TCP.
///
/// [`run`](Self::run) occupies the calling thread with the accept loop and
/// hands each connection to the configured [`Spawn`]. Share the server
/// through an `Arc` to [`stop`](Self::stop) it from elsewhere.
///
/// ```no_run
/// use http::StatusCode;
/// use micro_httpd::handler::{get, make_handler};
/// use micro_httpd::protocol::{Request, Response};
/// use micro_httpd::server::Server;
/// use std::convert::Infallible;
///
/// let server = Server::builder()
///     .port(3000)
///     .route(get("/", make_handler(|_: &Request| Ok::<_, Infallible>(Response::make_raw(StatusCode::OK, "hello")))))
///     .build()
///     .unwrap();
///
/// server.run().unwrap();
/// ```
pub struct Server {
    address: SocketAddr,
    spawner: Arc<dyn Spawn>,
    read_timeout: Duration,
    buffer_size: usize,
    router: Arc<Router>,
    running: Arc<AtomicBool>,
    lifecycle: Mutex<Lifecycle>,
    local_addr: Mutex<Option<SocketAddr>>,
    active: Arc<AtomicUsize>,
}

/// Where `run` is, guarded so `stop` can never slip between binding and
/// serving unnoticed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    /// `stop` came first, the next `run` returns right after binding
    StopRequested,
    Running(SocketAddr),
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("address", &self.address)
            .field("running", &self.is_running())
            .field("active_connections", &self.active_connections())
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Binds the listener and accepts connections until [`stop`](Self::stop)
    /// is called.
    ///
    /// Only binding errors are returned; a failed accept or a connection that
    /// could not be started is logged and skipped. If `stop` was called
    /// before, `run` returns as soon as the listener is bound.
    pub fn run(&self) -> io::Result<()> {
        let listener = TcpListener::bind(self.address)
            .inspect_err(|e| error!(cause = %e, address = %self.address, "bind server error"))?;
        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner) = Some(local_addr);

        {
            let mut lifecycle = self.lifecycle();
            if *lifecycle == Lifecycle::StopRequested {
                *lifecycle = Lifecycle::Idle;
                info!(%local_addr, "stop requested before start, not serving");
                return Ok(());
            }
            *lifecycle = Lifecycle::Running(local_addr);
            self.running.store(true, Ordering::Release);
        }
        info!(%local_addr, "start listening");

        while self.running.load(Ordering::Acquire) {
            let (stream, peer) = match listener.accept() {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            if !self.running.load(Ordering::Acquire) {
                debug!(%peer, "server stopped, drop accepted connection");
                break;
            }

            if let Err(e) = self.start_connection(stream, peer) {
                warn!(cause = %e, %peer, "failed to start connection");
            }
        }

        *self.lifecycle() = Lifecycle::Idle;
        info!(%local_addr, active = self.active_connections(), "server stopped");
        Ok(())
    }

    fn start_connection(&self, stream: TcpStream, peer: SocketAddr) -> io::Result<()> {
        stream.set_read_timeout(Some(self.read_timeout))?;
        stream.set_nodelay(true)?;
        let writer = stream.try_clone()?;

        let input = ReadInput::until_stopped(stream, Arc::clone(&self.running));
        let output = WriteOutput::with_capacity(writer, self.buffer_size);
        let router = Arc::clone(&self.router);
        let running = Arc::clone(&self.running);
        let guard = ActiveGuard::new(Arc::clone(&self.active));
        let buffer_size = self.buffer_size;

        debug!(%peer, "accept connection");
        self.spawner.spawn(Box::new(move || {
            let _guard = guard;
            let connection = HttpConnection::with_capacity(input, output, buffer_size);
            match connection.process(&router, &running) {
                Ok(()) => info!(%peer, "finished process, connection shutdown"),
                Err(e) => error!(%peer, cause = %e, "service has error, connection shutdown"),
            }
        }))
    }

    /// Stops accepting connections. Connections finish the exchange they
    /// are in and then close.
    ///
    /// Called before `run` has started serving, it makes that `run` return
    /// right after binding. Calling it again does nothing.
    pub fn stop(&self) {
        let local_addr = {
            let mut lifecycle = self.lifecycle();
            match *lifecycle {
                Lifecycle::Running(local_addr) => {
                    *lifecycle = Lifecycle::StopRequested;
                    self.running.store(false, Ordering::Release);
                    local_addr
                }
                Lifecycle::Idle => {
                    debug!("stop requested before the server started");
                    *lifecycle = Lifecycle::StopRequested;
                    return;
                }
                Lifecycle::StopRequested => return,
            }
        };

        // a throwaway connection unblocks the pending accept
        match TcpStream::connect_timeout(&wake_address(local_addr), WAKE_TIMEOUT) {
            Ok(_) => debug!(%local_addr, "woke accept loop"),
            Err(e) => debug!(cause = %e, %local_addr, "failed to wake accept loop"),
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The address actually bound, once `run` got that far.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Connections accepted whose task has not finished yet.
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }
}

fn wake_address(local_addr: SocketAddr) -> SocketAddr {
    if local_addr.ip().is_unspecified() {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, local_addr.port()))
    } else {
        local_addr
    }
}

/// Counts a connection as active for as long as it is alive.
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::AcqRel);
        Self(active)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::spawn_fn;

    #[test]
    fn defaults() {
        let server = Server::builder().build().unwrap();

        assert_eq!(server.address, SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)));
        assert_eq!(server.read_timeout, DEFAULT_READ_TIMEOUT);
        assert_eq!(server.buffer_size, DEFAULT_READ_CAPACITY);
        assert!(!server.is_running());
        assert_eq!(server.local_addr(), None);
        assert_eq!(server.active_connections(), 0);
    }

    #[test]
    fn resolves_host_names_to_ipv4() {
        let server = Server::builder().address("localhost").port(9000).build().unwrap();
        assert_eq!(server.address, SocketAddr::from(([127, 0, 0, 1], 9000)));
    }

    #[test]
    fn rejects_bad_configuration() {
        let result = Server::builder().address("not an address").build();
        assert!(matches!(result, Err(ServerBuildError::InvalidAddress { .. })));

        let result = Server::builder().address("::1").build();
        assert!(matches!(result, Err(ServerBuildError::NoIpv4Address { .. })));

        let result = Server::builder().read_timeout(Duration::ZERO).build();
        assert!(matches!(result, Err(ServerBuildError::ZeroReadTimeout)));

        let result = Server::builder().buffer_size(0).build();
        assert!(matches!(result, Err(ServerBuildError::ZeroBufferSize)));
    }

    #[test]
    fn stop_before_run_is_not_lost() {
        let server = Server::builder().port(0).build().unwrap();
        server.stop();
        server.stop();
        assert!(!server.is_running());

        // returns right after binding instead of serving
        server.run().unwrap();
        assert!(!server.is_running());
        assert!(server.local_addr().is_some());
        assert_eq!(*server.lifecycle(), Lifecycle::Idle);
    }

    #[test]
    fn stop_from_another_thread_ends_run() {
        let server = Arc::new(Server::builder().port(0).build().unwrap());
        let stopper = Arc::clone(&server);

        // may land before or after `run` binds; either way `run` must return
        let handle = std::thread::spawn(move || stopper.stop());
        server.run().unwrap();
        handle.join().unwrap();

        assert!(!server.is_running());
        assert_eq!(*server.lifecycle(), Lifecycle::Idle);
    }

    #[test]
    fn unspecified_address_wakes_localhost() {
        let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
        assert_eq!(wake_address(addr), SocketAddr::from(([127, 0, 0, 1], 8080)));

        let addr = SocketAddr::from(([10, 0, 0, 1], 8080));
        assert_eq!(wake_address(addr), addr);
    }

    #[test]
    fn guard_tracks_active_connections() {
        let active = Arc::new(AtomicUsize::new(0));
        let first = ActiveGuard::new(Arc::clone(&active));
        let second = ActiveGuard::new(Arc::clone(&active));
        assert_eq!(active.load(Ordering::Acquire), 2);

        drop(first);
        drop(second);
        assert_eq!(active.load(Ordering::Acquire), 0);
    }

    #[test]
    fn custom_spawner_is_accepted() {
        let server = Server::builder().spawner(spawn_fn(|task| {
            task();
            Ok(())
        }));
        assert!(server.build().is_ok());
    }
}
