//! Transport abstraction layer
//!
//! Agents talk to the coordinator only through an [`AgentTransport`]. The
//! tokio channel implementation serves single-process experiments; the trait
//! allows plugging in socket transports later.

pub mod channel;

pub use channel::ChannelTransport;

use agora_core::{PrivateId, StepId, TradeMessage};
use async_trait::async_trait;

use crate::envelope::ServerMessage;
use crate::error::TransportError;

/// Agent-side endpoint of the communication channel
#[async_trait]
pub trait AgentTransport: Send {
    /// Connection identity assigned by the coordinator
    fn private_id(&self) -> PrivateId;

    /// Ask to be registered under an optional display name
    async fn register(&self, name: Option<String>) -> Result<(), TransportError>;

    /// Wait for the next message from the coordinator
    async fn receive(&mut self) -> Result<ServerMessage, TransportError>;

    /// Answer the barrier for `step`, submitting `trades`
    async fn send(&self, step: StepId, trades: Vec<TradeMessage>) -> Result<(), TransportError>;
}
