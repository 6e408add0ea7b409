//! Listening-socket factory decorator and the accepted-connection handoff.
//!
//! [`ListenerFactory`] wraps a caller factory so listening endpoints register
//! through the same path as outbound ones. Accept logic lives outside this
//! crate; accepted sockets come back to the reactor through the
//! [`AdoptionQueue`], which the run loop drains into ordinary registrations.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::net::TcpStream;
use std::rc::Rc;

use crate::connection::Connection;
use crate::error::ConnectionResult;
use crate::factory::{ConnectionFactory, FactoryHandle};

/// An accepted lower-level connection awaiting registration.
pub struct Adoption {
    /// Factory that will own the adopted connection.
    pub factory: FactoryHandle,

    /// The accepted socket the new connection adopts.
    pub stream: TcpStream,

    /// Peer host, as reported at accept time.
    pub host: String,

    /// Peer port, as reported at accept time.
    pub port: u16,

    /// Whether the adopting connection should treat the transport as secure.
    pub secure: bool,
}

/// Queue of accepted connections shared between accept-time code and the
/// reactor that registers them.
#[derive(Clone, Default)]
pub struct AdoptionQueue {
    inner: Rc<RefCell<VecDeque<Adoption>>>,
}

impl AdoptionQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an accepted connection for registration on the next loop
    /// iteration.
    pub fn push(&self, adoption: Adoption) {
        self.inner.borrow_mut().push_back(adoption);
    }

    /// Dequeue the oldest pending adoption.
    pub(crate) fn pop(&self) -> Option<Adoption> {
        self.inner.borrow_mut().pop_front()
    }

    /// Number of adoptions waiting to be registered.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// True when nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

/// Factory decorator that turns a caller factory into a listening one.
///
/// Building delegates to the wrapped factory's `build_listener`; readiness
/// and ticking pass straight through. The decorator is bound to its reactor
/// by the adoption queue accept-time code pushes into.
pub struct ListenerFactory {
    inner: FactoryHandle,
    adoptions: AdoptionQueue,
}

impl ListenerFactory {
    /// Wrap `inner`, binding accepted connections to `adoptions`.
    pub fn new(inner: FactoryHandle, adoptions: AdoptionQueue) -> Self {
        Self { inner, adoptions }
    }

    /// Hand an accepted socket to the reactor for registration against the
    /// wrapped factory. Secure transports go through
    /// [`AdoptionQueue::push`] directly.
    pub fn adopt(&self, stream: TcpStream, host: String, port: u16) {
        tracing::debug!("queueing accepted connection from {}:{}", host, port);
        self.adoptions.push(Adoption {
            factory: self.inner.clone(),
            stream,
            host,
            port,
            secure: false,
        });
    }

    /// The queue accepted connections are handed through.
    pub fn adoptions(&self) -> &AdoptionQueue {
        &self.adoptions
    }
}

impl ConnectionFactory for ListenerFactory {
    fn build_connection(
        &mut self,
        host: &str,
        port: u16,
        _secure: bool,
    ) -> ConnectionResult<Box<dyn Connection>> {
        self.inner.borrow_mut().build_listener(host, port)
    }

    fn build_listener(&mut self, host: &str, port: u16) -> ConnectionResult<Box<dyn Connection>> {
        self.inner.borrow_mut().build_listener(host, port)
    }

    fn is_ready(&self) -> bool {
        self.inner.borrow().is_ready()
    }

    fn tick(&mut self) {
        self.inner.borrow_mut().tick();
    }
}
