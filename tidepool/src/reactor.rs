//! The reactor core: connection registry, readiness passes, and the run loop.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::net::TcpStream;
use std::os::fd::RawFd;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::config::ReactorConfig;
use crate::connection::Connection;
use crate::error::{ReactorError, ReactorResult};
use crate::factory::FactoryHandle;
use crate::host::HostProvider;
use crate::listener::{Adoption, AdoptionQueue, ListenerFactory};
use crate::metrics::ReactorMetrics;
use crate::poll::{InterestSets, MioPollProvider, PollProvider};

/// Clonable signal that ends [`Reactor::block`] between iterations.
///
/// Single-core design - no Send bounds needed. The supported way to stop the
/// loop is to flip the handle from a callback running on the reactor thread
/// (a factory tick, a dispatched read or write, a host timeout).
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    stopped: Rc<Cell<bool>>,
}

impl ShutdownHandle {
    /// Create a handle with no shutdown requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the run loop to stop once the current iteration finishes.
    pub fn shutdown(&self) {
        self.stopped.set(true);
    }

    /// True once shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.stopped.get()
    }
}

/// Low level event driver.
///
/// Owns the registered connections and handles to their owning factories,
/// runs the bounded readiness wait, dispatches error/write/read events in
/// that fixed order, and drives periodic maintenance between waits.
///
/// The two registries are index-aligned at all times: the factory at index
/// `i` owns the connection at index `i`. Entries are appended only by
/// [`Reactor::connect`] and [`Reactor::listen`]; [`Reactor::stop`] is the
/// only operation that shrinks them, and it clears both.
pub struct Reactor<P: PollProvider, H: HostProvider> {
    /// Registered connections, in registration order.
    connections: Vec<Box<dyn Connection>>,

    /// Owning factory handles, index-aligned with `connections`.
    factories: Vec<FactoryHandle>,

    /// Readiness-wait provider.
    poll: P,

    /// Host-environment collaborator.
    host: H,

    /// Timing configuration for the run loop.
    config: ReactorConfig,

    /// Cancellation signal checked between iterations.
    shutdown: ShutdownHandle,

    /// Accepted connections awaiting registration.
    adoptions: AdoptionQueue,

    /// Cumulative activity counters.
    metrics: ReactorMetrics,

    /// Completion time of the most recent tick pass.
    last_tick: Option<Instant>,
}

impl<H: HostProvider> Reactor<MioPollProvider, H> {
    /// Create a reactor over the production mio-backed readiness provider.
    pub fn new(config: ReactorConfig, host: H) -> ReactorResult<Self> {
        let poll = MioPollProvider::new().map_err(ReactorError::from)?;
        Ok(Self::with_poll_provider(poll, config, host))
    }
}

impl<P: PollProvider, H: HostProvider> Reactor<P, H> {
    /// Create a reactor over a caller-supplied readiness provider.
    pub fn with_poll_provider(poll: P, config: ReactorConfig, host: H) -> Self {
        Self {
            connections: Vec::new(),
            factories: Vec::new(),
            poll,
            host,
            config,
            shutdown: ShutdownHandle::new(),
            adoptions: AdoptionQueue::new(),
            metrics: ReactorMetrics::new(),
            last_tick: None,
        }
    }

    /// Register an outbound connection built by `factory` for
    /// `(host, port, secure)`.
    ///
    /// The connection's own `connect` runs before registration, adopting
    /// `existing` when one is supplied (an accepted inbound socket) instead
    /// of opening a new lower-level connection. The reactor performs no
    /// handshake itself. A build or connect failure propagates without
    /// touching the registries.
    pub fn connect(
        &mut self,
        factory: FactoryHandle,
        host: &str,
        port: u16,
        secure: bool,
        existing: Option<TcpStream>,
    ) -> ReactorResult<()> {
        let mut connection = factory.borrow_mut().build_connection(host, port, secure)?;
        connection.connect(existing)?;
        tracing::debug!(
            "registered outbound connection to {}:{} (secure={})",
            host,
            port,
            secure
        );
        self.connections.push(connection);
        self.factories.push(factory);
        self.metrics.record_registration();
        Ok(())
    }

    /// Register a listening endpoint on `(host, port)`.
    ///
    /// `factory` is wrapped in a [`ListenerFactory`] bound to this reactor's
    /// adoption queue; the wrapper builds the listening connection through
    /// the factory's `build_listener`. At the registration level listening
    /// and outbound connections are treated identically.
    pub fn listen(&mut self, factory: FactoryHandle, host: &str, port: u16) -> ReactorResult<()> {
        let wrapper = ListenerFactory::new(factory, self.adoptions.clone());
        let handle: FactoryHandle = Rc::new(RefCell::new(wrapper));
        let connection = handle.borrow_mut().build_connection(host, port, false)?;
        tracing::debug!("registered listening connection on {}:{}", host, port);
        self.connections.push(connection);
        self.factories.push(handle);
        self.metrics.record_registration();
        Ok(())
    }

    /// Stop every registered connection and clear the registries.
    ///
    /// Idempotent; a second call finds nothing to stop and clears nothing.
    pub fn stop(&mut self) {
        for connection in &mut self.connections {
            connection.stop();
        }
        self.connections.clear();
        self.factories.clear();
        tracing::info!("Disconnected.");
        self.host.status_message("Disconnected.");
    }

    /// True once every registered factory reports ready. False with zero
    /// factories registered.
    pub fn is_ready(&self) -> bool {
        if self.factories.is_empty() {
            return false;
        }
        self.factories.iter().all(|factory| factory.borrow().is_ready())
    }

    /// One readiness-multiplexing iteration, blocking at most `timeout`.
    ///
    /// Dispatch runs in fixed order: error-ready descriptors first (their
    /// reconnection invalidates any read/write readiness they also
    /// reported), then write-ready, then read-ready. A write or read
    /// failure is logged, forces that connection's reconnection, and
    /// suppresses further dispatch to it within the pass; other descriptors
    /// still dispatch.
    ///
    /// When the wait primitive itself fails with exactly one descriptor
    /// submitted, that descriptor is treated as the faulty one and
    /// reconnected. With more than one submitted the fault cannot be
    /// attributed and the pass fails with [`ReactorError::WaitFailed`].
    pub fn select(&mut self, timeout: Duration) -> ReactorResult<()> {
        if self.factories.is_empty() {
            return Ok(());
        }

        let mut sets = InterestSets::default();
        let mut fd_map: HashMap<RawFd, usize> = HashMap::new();
        for (index, connection) in self.connections.iter().enumerate() {
            sets.contribute(connection.descriptor(), connection.interest());
            fd_map.insert(connection.descriptor(), index);
        }

        if !sets.waitable() {
            return Ok(());
        }

        self.metrics.record_select_pass();
        let mut ready = match self.poll.wait(&sets, timeout) {
            Ok(ready) => ready,
            Err(error) => {
                self.metrics.record_wait_failure();
                // Attribution considers the descriptors the wait observed,
                // not every registered connection: one sitting the pass out
                // cannot be the faulty one.
                let submitted = sets.descriptors();
                if let [fd] = submitted.as_slice() {
                    tracing::error!("error in readiness wait: {}", error);
                    if let Some(&index) = fd_map.get(fd) {
                        self.force_reconnect(index);
                    }
                    return Ok(());
                }
                return Err(ReactorError::WaitFailed {
                    descriptors: submitted.len(),
                    message: error.to_string(),
                });
            }
        };

        for fd in std::mem::take(&mut ready.errored) {
            let Some(&index) = fd_map.get(&fd) else {
                continue;
            };
            ready.remove_readable(fd);
            ready.remove_writable(fd);
            tracing::debug!("descriptor {} error-ready, forcing reconnection", fd);
            self.force_reconnect(index);
        }

        for fd in std::mem::take(&mut ready.writable) {
            let Some(&index) = fd_map.get(&fd) else {
                continue;
            };
            if let Err(error) = self.connections[index].write() {
                tracing::error!("couldn't write to socket: {}", error);
                self.metrics.record_write_failure();
                ready.remove_readable(fd);
                self.force_reconnect(index);
            }
        }

        for fd in std::mem::take(&mut ready.readable) {
            let Some(&index) = fd_map.get(&fd) else {
                continue;
            };
            if let Err(error) = self.connections[index].read() {
                tracing::error!("couldn't read from socket: {}", error);
                self.metrics.record_read_failure();
                self.force_reconnect(index);
            }
        }

        Ok(())
    }

    /// Run the loop until the shutdown handle is flipped: readiness pass,
    /// adoption drain, factory ticks in registration order, host timeouts.
    ///
    /// Only a fatal readiness failure (see [`Reactor::select`]) ends the
    /// loop with an error.
    pub fn block(&mut self) -> ReactorResult<()> {
        while !self.shutdown.is_shutdown() {
            self.select(self.config.select_timeout)?;
            self.drain_adoptions();
            self.tick_factories();
            self.host.call_timeouts();
        }
        tracing::debug!("run loop stopped by shutdown handle");
        Ok(())
    }

    /// Handle for stopping [`Reactor::block`] between iterations.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Queue through which accept-time code hands connections back for
    /// registration.
    pub fn adoption_queue(&self) -> AdoptionQueue {
        self.adoptions.clone()
    }

    /// Cumulative activity counters.
    pub fn metrics(&self) -> &ReactorMetrics {
        &self.metrics
    }

    /// Number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of registered factory handles. Always equal to
    /// [`Reactor::connection_count`].
    pub fn factory_count(&self) -> usize {
        self.factories.len()
    }

    /// Timing configuration in effect.
    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    fn force_reconnect(&mut self, index: usize) {
        self.metrics.record_reconnection();
        self.connections[index].reconnect();
    }

    fn tick_factories(&mut self) {
        if let Some(last) = self.last_tick {
            if last.elapsed() < self.config.tick_interval {
                return;
            }
        }
        self.last_tick = Some(Instant::now());
        for factory in &self.factories {
            factory.borrow_mut().tick();
        }
    }

    fn drain_adoptions(&mut self) {
        while let Some(adoption) = self.adoptions.pop() {
            let Adoption {
                factory,
                stream,
                host,
                port,
                secure,
            } = adoption;
            if let Err(error) = self.connect(factory, &host, port, secure, Some(stream)) {
                tracing::error!(
                    "couldn't adopt accepted connection from {}:{}: {}",
                    host,
                    port,
                    error
                );
            }
        }
    }
}
