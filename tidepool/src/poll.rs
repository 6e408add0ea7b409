//! Readiness multiplexing behind a provider seam.
//!
//! The reactor folds every connection's interest into an [`InterestSets`]
//! value, hands it to a [`PollProvider`], and dispatches on the returned
//! [`ReadySets`]. The production provider drives `mio`; tests swap in a
//! scripted implementation to exercise dispatch without sockets.

use std::collections::HashMap;
use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

use mio::unix::SourceFd;
use mio::{Events, Poll, Token};

use crate::connection::Interest;

/// The three descriptor sets submitted to one readiness wait.
#[derive(Debug, Clone, Default)]
pub struct InterestSets {
    /// Descriptors waiting to become readable.
    pub readable: Vec<RawFd>,

    /// Descriptors waiting to become writable.
    pub writable: Vec<RawFd>,

    /// Descriptors watched for error conditions.
    pub errorable: Vec<RawFd>,
}

impl InterestSets {
    /// Fold one connection's interest flags into the sets.
    pub fn contribute(&mut self, fd: RawFd, interest: Interest) {
        if interest.readable {
            self.readable.push(fd);
        }
        if interest.writable {
            self.writable.push(fd);
        }
        if interest.errorable {
            self.errorable.push(fd);
        }
    }

    /// True when a wait could make progress: at least one descriptor wants
    /// readability or writability.
    pub fn waitable(&self) -> bool {
        !self.readable.is_empty() || !self.writable.is_empty()
    }

    /// Distinct descriptors across the three sets, in first-contribution
    /// order. These are the descriptors a wait over these sets observes.
    pub fn descriptors(&self) -> Vec<RawFd> {
        let mut seen = Vec::new();
        for &fd in self
            .readable
            .iter()
            .chain(&self.writable)
            .chain(&self.errorable)
        {
            if !seen.contains(&fd) {
                seen.push(fd);
            }
        }
        seen
    }
}

/// The three result sets reported by one readiness wait.
///
/// A descriptor may appear in more than one set; dispatch order and removal
/// are the reactor's concern.
#[derive(Debug, Clone, Default)]
pub struct ReadySets {
    /// Descriptors ready for reading.
    pub readable: Vec<RawFd>,

    /// Descriptors ready for writing.
    pub writable: Vec<RawFd>,

    /// Descriptors reporting an error condition.
    pub errored: Vec<RawFd>,
}

impl ReadySets {
    /// Drop `fd` from the readable result set if present.
    pub fn remove_readable(&mut self, fd: RawFd) {
        self.readable.retain(|candidate| *candidate != fd);
    }

    /// Drop `fd` from the writable result set if present.
    pub fn remove_writable(&mut self, fd: RawFd) {
        self.writable.retain(|candidate| *candidate != fd);
    }
}

/// Provider trait for the blocking readiness-wait primitive.
///
/// Single-core design - no Send bounds needed. An implementation blocks for
/// at most `timeout` and reports which of the submitted descriptors are
/// ready. An error return means the primitive itself failed; descriptor
/// faults belong in [`ReadySets::errored`].
pub trait PollProvider {
    /// Block until readiness or timeout, whichever comes first.
    fn wait(&mut self, sets: &InterestSets, timeout: Duration) -> io::Result<ReadySets>;
}

/// Per-descriptor interest accumulated across the three submitted sets.
#[derive(Debug, Clone, Copy, Default)]
struct FdInterest {
    read: bool,
    write: bool,
}

/// Production readiness provider backed by `mio::Poll`.
///
/// Descriptors are registered for the duration of a single wait and
/// deregistered before it returns, so each pass observes exactly the
/// interest the connections contributed for it. Unix-only, like the raw
/// descriptors it multiplexes.
pub struct MioPollProvider {
    poll: Poll,
    events: Events,
}

impl MioPollProvider {
    /// Create a provider with its own poll instance.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(1024),
        })
    }
}

impl PollProvider for MioPollProvider {
    fn wait(&mut self, sets: &InterestSets, timeout: Duration) -> io::Result<ReadySets> {
        let mut by_fd: HashMap<RawFd, FdInterest> = HashMap::new();
        for &fd in &sets.readable {
            by_fd.entry(fd).or_default().read = true;
        }
        for &fd in &sets.writable {
            by_fd.entry(fd).or_default().write = true;
        }
        for &fd in &sets.errorable {
            by_fd.entry(fd).or_default();
        }

        let mut registered: Vec<RawFd> = Vec::with_capacity(by_fd.len());
        for (&fd, flags) in &by_fd {
            // Error conditions are reported regardless of requested
            // interest, but mio refuses empty registrations; descriptors
            // watched only for errors ride along as readable.
            let interest = match (flags.read, flags.write) {
                (true, true) => mio::Interest::READABLE | mio::Interest::WRITABLE,
                (false, true) => mio::Interest::WRITABLE,
                _ => mio::Interest::READABLE,
            };
            if let Err(error) =
                self.poll
                    .registry()
                    .register(&mut SourceFd(&fd), Token(fd as usize), interest)
            {
                for fd in registered {
                    let _ = self.poll.registry().deregister(&mut SourceFd(&fd));
                }
                return Err(error);
            }
            registered.push(fd);
        }

        let outcome = self.poll.poll(&mut self.events, Some(timeout));
        for fd in registered {
            let _ = self.poll.registry().deregister(&mut SourceFd(&fd));
        }
        outcome?;

        let mut ready = ReadySets::default();
        for event in self.events.iter() {
            let fd = event.token().0 as RawFd;
            let Some(flags) = by_fd.get(&fd) else {
                continue;
            };
            if event.is_error() {
                ready.errored.push(fd);
            }
            if flags.read && event.is_readable() {
                ready.readable.push(fd);
            }
            if flags.write && event.is_writable() {
                ready.writable.push(fd);
            }
        }
        Ok(ready)
    }
}
