//! Tokio channel-based transport for single-process mode
//!
//! Messages are passed directly over unbounded mpsc channels, so sends never
//! block and there is no serialization overhead.

use agora_core::{PrivateId, StepId, TradeMessage};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::envelope::{AgentMessage, ServerMessage};
use crate::error::TransportError;
use crate::transport::AgentTransport;

/// Channel endpoint handed to an agent by `MessageServer::connect`
pub struct ChannelTransport {
    private_id: PrivateId,
    outbound: mpsc::UnboundedSender<AgentMessage>,
    inbound: mpsc::UnboundedReceiver<ServerMessage>,
}

impl ChannelTransport {
    pub fn new(
        private_id: PrivateId,
        outbound: mpsc::UnboundedSender<AgentMessage>,
        inbound: mpsc::UnboundedReceiver<ServerMessage>,
    ) -> Self {
        Self {
            private_id,
            outbound,
            inbound,
        }
    }

    /// Try to receive without blocking (returns None if no message available)
    pub fn try_receive(&mut self) -> Result<Option<ServerMessage>, TransportError> {
        match self.inbound.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(TransportError::ChannelClosed),
        }
    }

    fn push(&self, message: AgentMessage) -> Result<(), TransportError> {
        self.outbound
            .send(message)
            .map_err(|_| TransportError::ChannelClosed)
    }
}

#[async_trait]
impl AgentTransport for ChannelTransport {
    fn private_id(&self) -> PrivateId {
        self.private_id
    }

    async fn register(&self, name: Option<String>) -> Result<(), TransportError> {
        self.push(AgentMessage::Register {
            private_id: self.private_id,
            name,
        })
    }

    async fn receive(&mut self) -> Result<ServerMessage, TransportError> {
        self.inbound.recv().await.ok_or(TransportError::ChannelClosed)
    }

    async fn send(&self, step: StepId, trades: Vec<TradeMessage>) -> Result<(), TransportError> {
        self.push(AgentMessage::Reply {
            private_id: self.private_id,
            step,
            trades,
        })
    }
}
