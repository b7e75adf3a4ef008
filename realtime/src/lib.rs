//! Best-effort fan-out of CRM mutations to connected WebSocket clients.

pub mod event;
pub mod notifier;
pub mod registry;
pub mod ws;

pub use event::Event;
pub use notifier::{Broadcaster, Notifier};
pub use registry::{ConnectionId, ConnectionRegistry, Room};
