//! Session management
//!
//! A single broker session driven by an explicit
//! `Disconnected -> Connecting -> Connected` state machine.

mod manager;
mod state;

pub use manager::{MessageHandler, SessionManager, Subscription};
pub use state::{Action, ConnectionState, SessionEvent, SessionStatus, transition};
