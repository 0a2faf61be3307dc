use crate::dispatcher::panic_message;
use may::coroutine::JoinHandle;
use may_minihttp::{HttpServerWithHeaders, HttpService};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Readiness polling: attempts x interval.
const READY_ATTEMPTS: u32 = 100;
const READY_INTERVAL: Duration = Duration::from_millis(5);

/// Listener wrapper around `may_minihttp`.
///
/// Accepts up to 32 request headers, enough for requests arriving through
/// proxies and gateways.
pub struct HttpServer<T>(pub T);

/// Handle to a running listener.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the listener is bound to.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the listener accepts TCP connections.
    ///
    /// # Errors
    ///
    /// `TimedOut` if it is not accepting after about half a second.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..READY_ATTEMPTS {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(READY_INTERVAL);
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Cancel the listener coroutine and wait for it to exit.
    pub fn stop(self) {
        // SAFETY: cancel() is marked unsafe by the may runtime. The handle is
        // owned here and the listener is being shut down on purpose.
        unsafe {
            self.handle.coroutine().cancel();
        }
        match listener_panic(self.handle.join()) {
            Some(panic_message) => warn!(
                addr = %self.addr,
                panic_message = %panic_message,
                "HTTP server listener panicked before stop"
            ),
            None => info!(addr = %self.addr, "HTTP server stopped"),
        }
    }

    /// Wait for the listener to exit on its own.
    ///
    /// # Errors
    ///
    /// The listener coroutine panicked.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

/// The panic text of a listener that died on its own.
///
/// A cancelled coroutine also unwinds, but with a payload that is not a
/// `panic!` message; that is the normal result of [`ServerHandle::stop`].
fn listener_panic(result: thread::Result<()>) -> Option<String> {
    result.err().and_then(|payload| panic_message(payload.as_ref()))
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind and start serving.
    ///
    /// # Errors
    ///
    /// The address does not resolve or the port cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let handle = HttpServerWithHeaders::<_, 32>(self.0).start(addr)?;
        info!(addr = %addr, "HTTP server listening");
        Ok(ServerHandle { addr, handle })
    }
}
