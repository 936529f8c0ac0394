mod client;
mod domains;
mod events;
mod message;
pub mod types;

pub use client::{InspectorClient, ProtocolClient};
pub use domains::{DebuggerDomain, ProfilerDomain, RuntimeDomain};
pub use events::{ProtocolEvent, TransportEvent};
pub use message::{IncomingMessage, RpcError};
