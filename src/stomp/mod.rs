//! STOMP over WebSocket
//!
//! Frame codec plus the transport seam the session layer talks through.

mod frame;
mod transport;

pub use frame::{Command, Frame};
pub use transport::{Connection, Transport, WsConnection, WsTransport};
