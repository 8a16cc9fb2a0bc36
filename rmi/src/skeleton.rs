//! The server side of the RMI transport: a multithreaded listener bound to
//! one declared interface.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::RmiError;
use crate::wire::{read_frame, write_frame};

/// Binds a request type to the handler that resolves it.
///
/// Every method of the interface this handler implements returns a
/// `Result<T, E>` whose error type carries a `RemoteError` variant — the
/// compile-time shape that spec.md §4.B's `NotRemoteInterface` constructor
/// check would otherwise verify at runtime via reflection.
pub trait Handler: Send + Sync + 'static {
    type Request: DeserializeOwned + Send + 'static;
    type Response: Serialize + Send + 'static;

    fn handle(&self, request: Self::Request) -> Self::Response;
}

type StoppedHook = Box<dyn FnOnce(Option<RmiError>) + Send>;

struct Inner<H: Handler> {
    handler: H,
    requested_addr: Option<SocketAddr>,
    local_addr: Mutex<Option<SocketAddr>>,
    started: AtomicBool,
    stop_requested: AtomicBool,
    acceptor: Mutex<Option<JoinHandle<()>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stopped_hook: Mutex<Option<StoppedHook>>,
}

/// A started (or startable) RMI server for one interface.
///
/// Cloning a `Skeleton` shares the same underlying listener and handler —
/// clones are handles, not independent servers.
pub struct Skeleton<H: Handler>(Arc<Inner<H>>);

impl<H: Handler> Clone for Skeleton<H> {
    fn clone(&self) -> Self {
        Skeleton(self.0.clone())
    }
}

impl<H: Handler> Skeleton<H> {
    /// Creates a skeleton bound to `addr`, or unbound if `addr` is `None`
    /// (the OS assigns a port when [`Skeleton::start`] is called).
    pub fn new(addr: Option<SocketAddr>, handler: H) -> Self {
        Skeleton(Arc::new(Inner {
            handler,
            requested_addr: addr,
            local_addr: Mutex::new(None),
            started: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            acceptor: Mutex::new(None),
            workers: Mutex::new(Vec::new()),
            stopped_hook: Mutex::new(None),
        }))
    }

    /// Registers a hook invoked exactly once after the skeleton stops,
    /// carrying the cause if it stopped due to an error.
    pub fn on_stopped(&self, hook: impl FnOnce(Option<RmiError>) + Send + 'static) {
        *self.0.stopped_hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// The bound local address, if the skeleton has been constructed with
    /// an explicit address or has been started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.0.local_addr.lock().unwrap()
    }

    /// Binds (if not already bound) and spawns the acceptor thread.
    ///
    /// Restart is not supported: calling `start` twice on the same
    /// skeleton returns `RmiError::AlreadyStarted`.
    pub fn start(&self) -> Result<(), RmiError> {
        if self.0.started.swap(true, Ordering::SeqCst) {
            return Err(RmiError::AlreadyStarted);
        }

        let bind_addr = self
            .0
            .requested_addr
            .unwrap_or_else(|| "0.0.0.0:0".parse().unwrap());
        let listener = TcpListener::bind(bind_addr).map_err(RmiError::from_io)?;
        let local = listener.local_addr().map_err(RmiError::from_io)?;
        *self.0.local_addr.lock().unwrap() = Some(local);

        let inner = self.0.clone();
        let handle = thread::Builder::new()
            .name("rmi-acceptor".into())
            .spawn(move || accept_loop(inner, listener))
            .expect("failed to spawn rmi acceptor thread");
        *self.0.acceptor.lock().unwrap() = Some(handle);
        Ok(())
    }

    /// Signals the acceptor to stop, unblocks it with a dummy connection,
    /// and waits for it and all in-flight workers to drain.
    pub fn stop(&self) {
        self.0.stop_requested.store(true, Ordering::SeqCst);
        if let Some(addr) = self.local_addr() {
            let _ = TcpStream::connect(addr);
        }
        if let Some(handle) = self.0.acceptor.lock().unwrap().take() {
            let _ = handle.join();
        }
        let workers: Vec<_> = std::mem::take(&mut *self.0.workers.lock().unwrap());
        for w in workers {
            let _ = w.join();
        }
        if let Some(hook) = self.0.stopped_hook.lock().unwrap().take() {
            hook(None);
        }
    }
}

fn accept_loop<H: Handler>(inner: Arc<Inner<H>>, listener: TcpListener) {
    for stream in listener.incoming() {
        if inner.stop_requested.load(Ordering::SeqCst) {
            break;
        }
        match stream {
            Ok(stream) => {
                let worker_inner = inner.clone();
                let handle = thread::spawn(move || serve_one(&worker_inner.handler, stream));
                // TODO: reap finished handles here instead of only at stop();
                // long-lived skeletons accumulate one JoinHandle per request.
                inner.workers.lock().unwrap().push(handle);
            }
            Err(e) => {
                tracing::warn!(error = %e, "rmi accept failed");
                if let Some(hook) = inner.stopped_hook.lock().unwrap().take() {
                    hook(Some(RmiError::from_io(e)));
                }
                break;
            }
        }
    }
}

fn serve_one<H: Handler>(handler: &H, mut stream: TcpStream) {
    let request: H::Request = match read_frame(&mut stream) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = %e, "rmi request frame could not be read");
            return;
        }
    };
    let response = handler.handle(request);
    if let Err(e) = write_frame(&mut stream, &response) {
        tracing::debug!(error = %e, "rmi response frame could not be written");
    }
}
