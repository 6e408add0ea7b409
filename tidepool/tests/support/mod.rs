//! Shared test doubles for reactor integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::net::TcpStream;
use std::os::fd::RawFd;
use std::rc::Rc;
use std::time::Duration;

use tidepool::{
    Connection, ConnectionError, ConnectionFactory, ConnectionResult, ConnectionState,
    FactoryHandle, HostProvider, Interest, InterestSets, PollProvider, ReadySets, ShutdownHandle,
};

/// Install a test subscriber so failures come with reactor logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Shared record of dispatch activity, in invocation order.
pub type EventLog = Rc<RefCell<Vec<String>>>;

/// Create an empty event log.
pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Observable state of a fake connection, shared with the test body.
pub struct ConnState {
    /// Descriptor the connection reports.
    pub fd: RawFd,
    /// Interest the connection contributes each pass.
    pub interest: Interest,
    /// Lifecycle state.
    pub state: ConnectionState,
    /// Number of connect invocations.
    pub connects: u32,
    /// Whether the last connect adopted an existing stream.
    pub adopted_existing: bool,
    /// Number of read invocations.
    pub reads: u32,
    /// Number of write invocations.
    pub writes: u32,
    /// Number of reconnect invocations.
    pub reconnects: u32,
    /// Number of stop invocations.
    pub stops: u32,
    /// Make read operations fail.
    pub fail_read: bool,
    /// Make write operations fail.
    pub fail_write: bool,
}

/// Handle the test body keeps to observe a fake connection the reactor owns.
pub type ConnProbe = Rc<RefCell<ConnState>>;

/// Create a probe for a fake connection with the given descriptor and
/// interest.
pub fn probe(fd: RawFd, interest: Interest) -> ConnProbe {
    Rc::new(RefCell::new(ConnState {
        fd,
        interest,
        state: ConnectionState::Connecting,
        connects: 0,
        adopted_existing: false,
        reads: 0,
        writes: 0,
        reconnects: 0,
        stops: 0,
        fail_read: false,
        fail_write: false,
    }))
}

/// Fake connection driven entirely by its probe.
pub struct FakeConnection {
    probe: ConnProbe,
    log: EventLog,
}

impl FakeConnection {
    /// Create a fake connection around `probe`, recording dispatch into
    /// `log`.
    pub fn new(probe: ConnProbe, log: EventLog) -> Self {
        Self { probe, log }
    }
}

impl Connection for FakeConnection {
    fn connect(&mut self, existing: Option<TcpStream>) -> ConnectionResult<()> {
        let mut state = self.probe.borrow_mut();
        state.connects += 1;
        state.adopted_existing = existing.is_some();
        state.state = ConnectionState::Connected;
        Ok(())
    }

    fn interest(&self) -> Interest {
        self.probe.borrow().interest
    }

    fn descriptor(&self) -> RawFd {
        self.probe.borrow().fd
    }

    fn read(&mut self) -> ConnectionResult<()> {
        let mut state = self.probe.borrow_mut();
        state.reads += 1;
        self.log.borrow_mut().push(format!("read:{}", state.fd));
        if state.fail_read {
            return Err(ConnectionError::Io("simulated read failure".to_string()));
        }
        Ok(())
    }

    fn write(&mut self) -> ConnectionResult<()> {
        let mut state = self.probe.borrow_mut();
        state.writes += 1;
        self.log.borrow_mut().push(format!("write:{}", state.fd));
        if state.fail_write {
            return Err(ConnectionError::Io("simulated write failure".to_string()));
        }
        Ok(())
    }

    fn reconnect(&mut self) {
        let mut state = self.probe.borrow_mut();
        state.reconnects += 1;
        state.state = ConnectionState::Reconnecting;
        self.log
            .borrow_mut()
            .push(format!("reconnect:{}", state.fd));
    }

    fn stop(&mut self) {
        let mut state = self.probe.borrow_mut();
        state.stops += 1;
        state.state = ConnectionState::Stopped;
    }

    fn state(&self) -> ConnectionState {
        self.probe.borrow().state
    }
}

/// Fake factory handing out prepared fake connections in order.
pub struct FakeFactory {
    /// Readiness flag shared with the test body.
    pub ready: Rc<Cell<bool>>,
    /// Tick counter shared with the test body.
    pub ticks: Rc<Cell<u32>>,
    /// Whether `build_listener` is supported.
    pub listen_supported: bool,
    /// Flip this handle once `ticks` reaches the bound.
    pub shutdown_after_ticks: Option<(u32, ShutdownHandle)>,
    prepared: VecDeque<ConnProbe>,
    log: EventLog,
}

impl FakeFactory {
    /// Create a ready factory with no prepared connections.
    pub fn new(log: EventLog) -> Self {
        Self {
            ready: Rc::new(Cell::new(true)),
            ticks: Rc::new(Cell::new(0)),
            listen_supported: false,
            shutdown_after_ticks: None,
            prepared: VecDeque::new(),
            log,
        }
    }

    /// Queue a probe for the next build.
    pub fn with_connection(mut self, probe: ConnProbe) -> Self {
        self.prepared.push_back(probe);
        self
    }

    /// Allow `build_listener` to hand out prepared connections.
    pub fn listening(mut self) -> Self {
        self.listen_supported = true;
        self
    }

    /// Wrap into the handle form the reactor takes.
    pub fn handle(self) -> FactoryHandle {
        Rc::new(RefCell::new(self))
    }

    fn next_prepared(&mut self) -> ConnectionResult<Box<dyn Connection>> {
        match self.prepared.pop_front() {
            Some(probe) => Ok(Box::new(FakeConnection::new(probe, self.log.clone()))),
            None => Err(ConnectionError::ConnectFailed(
                "no prepared connection".to_string(),
            )),
        }
    }
}

impl ConnectionFactory for FakeFactory {
    fn build_connection(
        &mut self,
        _host: &str,
        _port: u16,
        _secure: bool,
    ) -> ConnectionResult<Box<dyn Connection>> {
        self.next_prepared()
    }

    fn build_listener(&mut self, _host: &str, _port: u16) -> ConnectionResult<Box<dyn Connection>> {
        if !self.listen_supported {
            return Err(ConnectionError::ListenUnsupported);
        }
        self.next_prepared()
    }

    fn is_ready(&self) -> bool {
        self.ready.get()
    }

    fn tick(&mut self) {
        let count = self.ticks.get() + 1;
        self.ticks.set(count);
        if let Some((bound, handle)) = &self.shutdown_after_ticks {
            if count >= *bound {
                handle.shutdown();
            }
        }
    }
}

/// Host provider recording status messages and timeout callbacks.
pub struct RecordingHost {
    /// Status messages in arrival order.
    pub messages: Rc<RefCell<Vec<String>>>,
    /// Number of `call_timeouts` invocations.
    pub timeout_calls: Rc<Cell<u32>>,
    /// Flip the handle once `timeout_calls` reaches the bound. Shared so
    /// tests can install it after the host has moved into the reactor.
    pub shutdown_after_calls: Rc<RefCell<Option<(u32, ShutdownHandle)>>>,
}

impl RecordingHost {
    /// Create a host with fresh recording state.
    pub fn new() -> Self {
        Self {
            messages: Rc::new(RefCell::new(Vec::new())),
            timeout_calls: Rc::new(Cell::new(0)),
            shutdown_after_calls: Rc::new(RefCell::new(None)),
        }
    }
}

impl HostProvider for RecordingHost {
    fn status_message(&mut self, text: &str) {
        self.messages.borrow_mut().push(text.to_string());
    }

    fn call_timeouts(&mut self) {
        let count = self.timeout_calls.get() + 1;
        self.timeout_calls.set(count);
        if let Some((bound, handle)) = self.shutdown_after_calls.borrow().as_ref() {
            if count >= *bound {
                handle.shutdown();
            }
        }
    }
}

/// Open a loopback TCP stream for adoption-path tests.
pub fn loopback_stream() -> TcpStream {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    TcpStream::connect(addr).expect("connect loopback")
}

/// One scripted outcome for a readiness wait.
pub enum WaitOutcome {
    /// Report these descriptors ready.
    Ready(ReadySets),
    /// Fail the wait primitive itself.
    Fail(io::ErrorKind),
}

/// Poll provider that replays a script and records the interest it saw.
///
/// An exhausted script reports nothing ready, like a wait that timed out.
pub struct ScriptedPollProvider {
    script: VecDeque<WaitOutcome>,
    /// Interest sets submitted to each wait, in order.
    pub seen: Rc<RefCell<Vec<InterestSets>>>,
}

impl ScriptedPollProvider {
    /// Create a provider with an empty script.
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            seen: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Append a ready outcome to the script.
    pub fn then_ready(mut self, ready: ReadySets) -> Self {
        self.script.push_back(WaitOutcome::Ready(ready));
        self
    }

    /// Append a wait-primitive failure to the script.
    pub fn then_fail(mut self, kind: io::ErrorKind) -> Self {
        self.script.push_back(WaitOutcome::Fail(kind));
        self
    }
}

impl PollProvider for ScriptedPollProvider {
    fn wait(&mut self, sets: &InterestSets, _timeout: Duration) -> io::Result<ReadySets> {
        self.seen.borrow_mut().push(sets.clone());
        match self.script.pop_front() {
            Some(WaitOutcome::Ready(ready)) => Ok(ready),
            Some(WaitOutcome::Fail(kind)) => Err(io::Error::from(kind)),
            None => Ok(ReadySets::default()),
        }
    }
}

/// Build a ready-set value from descriptor slices.
pub fn ready_sets(readable: &[RawFd], writable: &[RawFd], errored: &[RawFd]) -> ReadySets {
    ReadySets {
        readable: readable.to_vec(),
        writable: writable.to_vec(),
        errored: errored.to_vec(),
    }
}
