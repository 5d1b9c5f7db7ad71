//! Server state: the thread-safe registries over the protocol tries,
//! clients, channels, and the shared Hub.

pub mod channel;
pub mod channels;
pub mod client;
pub mod clients;
pub mod hub;
pub mod queue;
pub mod registry;
pub mod session;

pub use channel::{CHANNEL_MODES, Channel};
pub use channels::{ChannelDirectory, JoinOutcome, JoinSnapshot};
pub use client::ClientHandle;
pub use clients::ClientDirectory;
pub use hub::{Hub, VERSION};
pub use queue::{Enqueue, SendQueue, WRITE_QUEUE_SIZE};
pub use registry::{InsertOutcome, Registry};
pub use session::Session;
