//! Connection factory capability contract.

use std::cell::RefCell;
use std::rc::Rc;

use crate::connection::Connection;
use crate::error::{ConnectionError, ConnectionResult};

/// Capability contract for building and maintaining connections.
///
/// A factory knows how to construct connections for an endpoint, reports
/// whether everything it owns has finished setting up, and performs one pass
/// of periodic maintenance per run-loop iteration. Single-core design - no
/// Send bounds needed.
pub trait ConnectionFactory {
    /// Build an outbound connection for the `(host, port, secure)` tuple.
    /// The returned connection has not been started; the reactor invokes its
    /// `connect` operation during registration.
    fn build_connection(
        &mut self,
        host: &str,
        port: u16,
        secure: bool,
    ) -> ConnectionResult<Box<dyn Connection>>;

    /// Build a listening connection bound to `(host, port)`.
    ///
    /// Factories that only produce outbound connections keep the default,
    /// which refuses with [`ConnectionError::ListenUnsupported`].
    fn build_listener(&mut self, host: &str, port: u16) -> ConnectionResult<Box<dyn Connection>> {
        let _ = (host, port);
        Err(ConnectionError::ListenUnsupported)
    }

    /// True once every connection this factory owns is ready for use.
    fn is_ready(&self) -> bool;

    /// One pass of periodic maintenance, invoked once per run-loop iteration.
    fn tick(&mut self);
}

/// Shared handle to a factory.
///
/// Factories are owned by the caller that registered them; the reactor holds
/// handles, not ownership.
pub type FactoryHandle = Rc<RefCell<dyn ConnectionFactory>>;
