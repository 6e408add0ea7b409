//! Connection capability contract and lifecycle types.
//!
//! The reactor drives anything that implements [`Connection`]: outbound
//! client connections and listening server sockets alike. Concrete
//! transports live outside this crate; this module defines the seam they
//! implement plus the reconnect bookkeeping they share.

/// Reconnection policy and backoff state shared by connection implementations.
pub mod backoff;

use std::net::TcpStream;
use std::os::fd::RawFd;

use crate::error::ConnectionResult;

/// Readiness interest a connection contributes for one multiplexing pass.
///
/// Each flag places the connection's descriptor into the corresponding
/// interest set handed to the readiness wait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interest {
    /// Wait for the descriptor to become readable.
    pub readable: bool,

    /// Wait for the descriptor to become writable.
    pub writable: bool,

    /// Watch the descriptor for error conditions.
    pub errorable: bool,
}

impl Interest {
    /// Read interest plus error watching.
    pub const READ: Interest = Interest {
        readable: true,
        writable: false,
        errorable: true,
    };

    /// Write interest plus error watching.
    pub const WRITE: Interest = Interest {
        readable: false,
        writable: true,
        errorable: true,
    };

    /// Full interest: read, write, and error watching.
    pub const READ_WRITE: Interest = Interest {
        readable: true,
        writable: true,
        errorable: true,
    };

    /// No interest at all; the connection sits out this pass.
    pub const NONE: Interest = Interest {
        readable: false,
        writable: false,
        errorable: false,
    };

    /// True when no flag is set.
    pub fn is_empty(&self) -> bool {
        !self.readable && !self.writable && !self.errorable
    }
}

/// Lifecycle state of a connection.
///
/// Connections move `Connecting → Connected`, fall back to `Reconnecting`
/// on failure (which loops through `Connecting` again), and end in the
/// terminal `Stopped` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Establishment is in progress.
    Connecting,

    /// The connection is established and usable.
    Connected,

    /// The connection failed and a new attempt is pending.
    Reconnecting,

    /// The connection was stopped permanently.
    Stopped,
}

impl ConnectionState {
    /// True for the terminal state; no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Stopped)
    }
}

/// Capability contract for one socket-like endpoint.
///
/// Single-core design - no Send bounds needed. All operations run
/// synchronously on the reactor thread and must not block; the only
/// blocking point in the system is the reactor's own readiness wait.
pub trait Connection {
    /// Establish the connection. When `existing` is supplied the connection
    /// adopts that lower-level socket (an accepted inbound stream) instead
    /// of opening one itself.
    fn connect(&mut self, existing: Option<TcpStream>) -> ConnectionResult<()>;

    /// Readiness interest for the next multiplexing pass.
    fn interest(&self) -> Interest;

    /// The descriptor identifying this connection in readiness sets.
    fn descriptor(&self) -> RawFd;

    /// Perform one read from the endpoint. Called when the descriptor is
    /// read-ready; a failure makes the reactor force a reconnection.
    fn read(&mut self) -> ConnectionResult<()>;

    /// Perform one write to the endpoint. Called when the descriptor is
    /// write-ready; a failure makes the reactor force a reconnection.
    fn write(&mut self) -> ConnectionResult<()>;

    /// Tear down the current socket and schedule a reconnection attempt,
    /// bounded by the implementation's [`backoff::ReconnectPolicy`].
    fn reconnect(&mut self);

    /// Stop permanently. After this the connection reports
    /// [`ConnectionState::Stopped`] and contributes no interest.
    fn stop(&mut self);

    /// Current lifecycle state.
    fn state(&self) -> ConnectionState;
}
