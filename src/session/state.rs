use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Connection states of the single broker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

const STATE_DISCONNECTED: u32 = 0;
const STATE_CONNECTING: u32 = 1;
const STATE_CONNECTED: u32 = 2;

impl ConnectionState {
    fn to_u32(self) -> u32 {
        match self {
            ConnectionState::Disconnected => STATE_DISCONNECTED,
            ConnectionState::Connecting => STATE_CONNECTING,
            ConnectionState::Connected => STATE_CONNECTED,
        }
    }

    fn from_u32(raw: u32) -> Self {
        match raw {
            STATE_CONNECTING => ConnectionState::Connecting,
            STATE_CONNECTED => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// Inputs that drive the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ConnectRequested,
    HandshakeSucceeded,
    HandshakeFailed,
    ConnectionLost,
    RetryTimerFired,
}

/// What the session loop has to do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    OpenTransport,
    Subscribe,
    ScheduleRetry,
    /// The event does not apply in the current state; nothing changes.
    Ignore,
}

/// Pure transition function.
///
/// A retry timer that fires while a session is already being opened or is
/// up maps to `Ignore`, so a stale timer can never start a second session.
pub fn transition(state: ConnectionState, event: SessionEvent) -> (ConnectionState, Action) {
    use ConnectionState::*;
    use SessionEvent::*;

    match (state, event) {
        (Disconnected, ConnectRequested | RetryTimerFired) => (Connecting, Action::OpenTransport),
        (Connecting, HandshakeSucceeded) => (Connected, Action::Subscribe),
        (Connecting, HandshakeFailed | ConnectionLost) => (Disconnected, Action::ScheduleRetry),
        (Connected, ConnectionLost) => (Disconnected, Action::ScheduleRetry),
        (state, _) => (state, Action::Ignore),
    }
}

/// Shared, read-mostly view of the session state.
///
/// Only the session task applies events; everyone else reads.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    state: Arc<AtomicU32>,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            state: Arc::new(AtomicU32::new(STATE_DISCONNECTED)),
        }
    }
}

impl SessionStatus {
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u32(self.state.load(Ordering::SeqCst))
    }

    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionState::Connected
    }

    pub(crate) fn apply(&self, event: SessionEvent) -> Action {
        let current = self.get();
        let (next, action) = transition(current, event);
        if action == Action::Ignore {
            log::debug!("[Session] Ignoring {:?} while {}", event, current);
        } else {
            log::debug!("[Session] {} --{:?}--> {}", current, event, next);
        }
        self.state.store(next.to_u32(), Ordering::SeqCst);
        action
    }
}
