//! Agora Messaging
//!
//! Communication channel between the coordinator and agents. Provides:
//! - Identity directory (private connection ids → dense public ids)
//! - Envelopes for both directions
//! - Transport abstraction (tokio channels, with a trait for other transports)
//! - The message server and its barrier protocol
//!
//! ## Barrier protocol
//!
//! ```text
//! coordinator                          agents
//!     │  Deliver{step, msg} ...  ──────▶  │
//!     │  AwaitReply{step, tag}   ──────▶  │
//!     │  ◀──────  Reply{step, trades}     │  exactly one per agent
//!     │  step += 1                        │
//! ```

pub mod directory;
pub mod envelope;
pub mod error;
pub mod server;
pub mod transport;

// Re-export commonly used types
pub use directory::IdentityDirectory;
pub use envelope::{AgentMessage, ServerMessage};
pub use error::{Result, TransportError};
pub use server::{MessageServer, MessageServerConfig};
pub use transport::{AgentTransport, ChannelTransport};
