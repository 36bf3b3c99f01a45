//! The `broker` module is the relay engine's core: the buffers messages wait
//! in, the registry of live clients and the monitor that moves messages from
//! the shared inbound buffer to every client's outbound buffer.

pub mod buffer;
pub mod monitor;
pub mod registry;

pub use buffer::MessageBuffer;
pub use monitor::{Monitor, MonitorHandle};
pub use registry::{ListenerHandle, Registration, Registry, SenderHandle};
