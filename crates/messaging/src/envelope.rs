//! Wire envelopes between the coordinator and agents

use agora_core::{Message, PrivateId, StepId, TradeMessage};
use serde::{Deserialize, Serialize};

/// Coordinator → agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Agents should register now
    Begin,
    /// A payload, stamped with the protocol step it was sent in
    Deliver { step: StepId, message: Message },
    /// Every registered agent must answer with exactly one `Reply` for `step`
    AwaitReply { step: StepId, tag: String },
    /// The experiment is over; agents should stop
    Shutdown,
}

/// Agent → coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentMessage {
    Register {
        private_id: PrivateId,
        name: Option<String>,
    },
    /// Barrier answer, carrying any bids the agent wants to submit
    Reply {
        private_id: PrivateId,
        step: StepId,
        trades: Vec<TradeMessage>,
    },
}

impl AgentMessage {
    pub fn private_id(&self) -> PrivateId {
        match self {
            AgentMessage::Register { private_id, .. } => *private_id,
            AgentMessage::Reply { private_id, .. } => *private_id,
        }
    }
}
