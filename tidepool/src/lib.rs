//! # Tidepool Reactor
//!
//! A single-threaded, readiness-driven I/O reactor. Tidepool multiplexes an
//! arbitrary number of socket-like connections (outbound clients and
//! listening server sockets) over one bounded readiness wait, dispatches
//! error/write/read events to per-connection handlers in a fixed order, and
//! drives periodic housekeeping (factory ticks, host timeouts) between
//! waits.
//!
//! The crate defines the capability contracts concrete transports implement:
//! - [`Connection`] for one socket-like endpoint (connect, read, write,
//!   reconnect, stop)
//! - [`ConnectionFactory`] for building and maintaining connections
//! - [`HostProvider`] for host-environment integration
//! - [`PollProvider`] for the readiness-wait primitive, with
//!   [`MioPollProvider`] as the production implementation
//!
//! Failures recover per connection: error-ready descriptors, failed writes,
//! and failed reads all force a bounded reconnection (see
//! [`connection::backoff`]) instead of tearing the loop down. Everything
//! runs on one thread; callbacks must not block.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

/// Configuration for the reactor run loop.
pub mod config;
/// Connection capability contract and lifecycle types.
pub mod connection;
/// Error types for reactor and connection operations.
pub mod error;
/// Connection factory capability contract.
pub mod factory;
/// Host-environment collaborator contract.
pub mod host;
/// Listening-socket decorator and accepted-connection handoff.
pub mod listener;
/// Metrics collection for reactor activity.
pub mod metrics;
/// Readiness multiplexing behind a provider seam.
pub mod poll;
/// The reactor core: registry, readiness passes, and the run loop.
pub mod reactor;

// Public API exports
pub use config::ReactorConfig;
pub use connection::backoff::{
    ReconnectPolicy, ReconnectState, INITIAL_RECONNECT_DELAY, MAX_RETRIES,
};
pub use connection::{Connection, ConnectionState, Interest};
pub use error::{ConnectionError, ConnectionResult, ReactorError, ReactorResult};
pub use factory::{ConnectionFactory, FactoryHandle};
pub use host::{HostProvider, NullHostProvider};
pub use listener::{Adoption, AdoptionQueue, ListenerFactory};
pub use metrics::ReactorMetrics;
pub use poll::{InterestSets, MioPollProvider, PollProvider, ReadySets};
pub use reactor::{Reactor, ShutdownHandle};
