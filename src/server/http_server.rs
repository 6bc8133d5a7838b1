use may::coroutine::JoinHandle;
use may_minihttp::HttpService;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::info;

const READY_ATTEMPTS: u32 = 50;
const READY_INTERVAL: Duration = Duration::from_millis(5);

/// Listener for an [`AppService`](super::AppService) or any other
/// `may_minihttp` service.
///
/// Each accepted connection runs on its own coroutine; the service value is
/// cloned per connection, so keep it to `Arc`s.
pub struct HttpServer<T>(pub T);

/// Running listener returned by [`HttpServer::start`].
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Block until the listener accepts connections.
    ///
    /// # Errors
    ///
    /// `TimedOut` when no connection succeeds after about 250ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..READY_ATTEMPTS {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(READY_INTERVAL);
        }
        Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("listener on {} not accepting connections", self.addr),
        ))
    }

    /// Address the listener is bound to.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Cancel the accept loop and wait for its coroutine to unwind.
    pub fn stop(self) {
        // SAFETY: the accept coroutine is owned by this handle and is not
        // joined anywhere else.
        #[allow(unsafe_code)]
        unsafe {
            self.handle.coroutine().cancel();
        }
        if self.handle.join().is_err() {
            info!(addr = %self.addr, "Listener stopped by cancellation");
        }
    }

    /// Serve until the accept loop ends.
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the accept coroutine panicked.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

impl<T: HttpService + Clone + Send + Sync + 'static> HttpServer<T> {
    /// Bind the first address `addr` resolves to and start accepting.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when `addr` resolves to nothing, or the bind error.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let Some(addr) = addr.to_socket_addrs()?.next() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "address resolved to nothing",
            ));
        };
        let handle = may_minihttp::HttpServer(self.0).start(addr)?;
        info!(%addr, "Listening");
        Ok(ServerHandle { addr, handle })
    }
}
