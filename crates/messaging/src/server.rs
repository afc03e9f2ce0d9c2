//! Coordinator side of the communication channel
//!
//! The server owns every connection and the inbound queue. Inbound traffic
//! is only read inside the barrier calls, so the coordinator decides when
//! agent replies become visible.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use agora_core::{
    Message, PrivateId, PublicId, RegistrationMessage, StepId, TradeMessage,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::directory::IdentityDirectory;
use crate::envelope::{AgentMessage, ServerMessage};
use crate::error::{Result, TransportError};
use crate::transport::ChannelTransport;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageServerConfig {
    /// Registrations `wait_for_registrations` waits for
    pub expected_agents: usize,
    /// Upper bound on a single barrier; `None` waits indefinitely
    #[serde(default)]
    pub barrier_timeout: Option<Duration>,
}

pub struct MessageServer {
    config: MessageServerConfig,
    connections: BTreeMap<PrivateId, mpsc::UnboundedSender<ServerMessage>>,
    directory: IdentityDirectory,
    inbound_tx: mpsc::UnboundedSender<AgentMessage>,
    inbound_rx: mpsc::UnboundedReceiver<AgentMessage>,
    step: StepId,
}

impl MessageServer {
    pub fn new(config: MessageServerConfig) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            config,
            connections: BTreeMap::new(),
            directory: IdentityDirectory::new(),
            inbound_tx,
            inbound_rx,
            step: 0,
        }
    }

    pub fn config(&self) -> &MessageServerConfig {
        &self.config
    }

    pub fn set_expected_agents(&mut self, expected_agents: usize) {
        self.config.expected_agents = expected_agents;
    }

    /// Open a connection with a fresh private id
    pub fn connect(&mut self) -> ChannelTransport {
        let private_id = PrivateId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.insert(private_id, tx);
        debug!("Connection opened: {}", private_id);
        ChannelTransport::new(private_id, self.inbound_tx.clone(), rx)
    }

    /// Register a connection, returning its public id
    ///
    /// Registering twice returns the same id. Unknown connections are
    /// rejected.
    pub fn register_agent(
        &mut self,
        private_id: PrivateId,
        name: Option<String>,
    ) -> Option<PublicId> {
        if !self.connections.contains_key(&private_id) {
            warn!("Registration from unknown connection {}", private_id);
            return None;
        }

        let (public_id, new) = self.directory.register(private_id, name.clone());
        if new {
            info!(
                "Registered {} as {}",
                name.as_deref().unwrap_or("unnamed agent"),
                public_id
            );
            self.send_message(
                public_id,
                Message::Registration(RegistrationMessage { public_id, name }),
            );
        } else {
            debug!("{} registered again", public_id);
        }
        Some(public_id)
    }

    pub fn directory(&self) -> &IdentityDirectory {
        &self.directory
    }

    /// Registered agents in public id order
    pub fn registered_agents(&self) -> Vec<PublicId> {
        self.directory.agents()
    }

    /// Registrations received so far, in public id order
    pub fn registrations(&self) -> Vec<RegistrationMessage> {
        self.directory
            .agents()
            .into_iter()
            .map(|public_id| RegistrationMessage {
                public_id,
                name: self.directory.name(public_id).map(str::to_string),
            })
            .collect()
    }

    pub fn step(&self) -> StepId {
        self.step
    }

    fn push(&self, private_id: PrivateId, message: ServerMessage) -> bool {
        match self.connections.get(&private_id) {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Fire-and-forget delivery, stamped with the current step. Returns
    /// whether the agent's connection accepted the message.
    pub fn send_message(&self, agent: PublicId, message: Message) -> bool {
        let Some(private_id) = self.directory.private_id(agent) else {
            warn!("Dropping {} message for unknown {}", message.kind(), agent);
            return false;
        };

        let delivered = self.push(
            private_id,
            ServerMessage::Deliver {
                step: self.step,
                message,
            },
        );
        if !delivered {
            warn!("{} is disconnected", agent);
        }
        delivered
    }

    /// Ask every connection to register
    pub fn notify_to_respond(&self) {
        for private_id in self.connections.keys() {
            self.push(*private_id, ServerMessage::Begin);
        }
    }

    /// Wait until the expected number of agents has registered
    pub async fn wait_for_registrations(&mut self) -> Result<Vec<RegistrationMessage>> {
        let expected = self.config.expected_agents;
        let timeout = self.config.barrier_timeout;

        let wait = async {
            while self.directory.len() < expected {
                match self.next_inbound().await? {
                    AgentMessage::Register { private_id, name } => {
                        self.register_agent(private_id, name);
                    }
                    AgentMessage::Reply { private_id, step, .. } => {
                        warn!("Dropping reply for step {} from {} before start", step, private_id);
                    }
                }
            }
            Ok::<(), TransportError>(())
        };

        let finished = match timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.ok(),
            None => Some(wait.await),
        };
        let Some(result) = finished else {
            return Err(TransportError::Timeout {
                tag: "registration".to_string(),
                missing: expected.saturating_sub(self.directory.len()),
            });
        };
        result?;

        info!("{} agents registered", self.directory.len());
        Ok(self.registrations())
    }

    /// Barrier: every agent registered when the barrier starts must answer
    /// exactly once for the current step
    ///
    /// Bids carried by the replies are stamped with the sender's public id
    /// and returned in arrival order. Extra replies and replies for other
    /// steps are dropped. Agents registering mid-barrier are not awaited.
    pub async fn wait_for_bids(&mut self, tag: &str) -> Result<Vec<TradeMessage>> {
        let step = self.step;
        let mut awaited: BTreeSet<PrivateId> = BTreeSet::new();
        for agent in self.directory.agents() {
            if let Some(private_id) = self.directory.private_id(agent) {
                let prompt = ServerMessage::AwaitReply {
                    step,
                    tag: tag.to_string(),
                };
                if self.push(private_id, prompt) {
                    awaited.insert(private_id);
                } else {
                    warn!("{} is disconnected, not awaiting it for '{}'", agent, tag);
                }
            }
        }
        debug!("Barrier '{}' (step {}): awaiting {} agents", tag, step, awaited.len());

        let timeout = self.config.barrier_timeout;
        let collect = self.collect_replies(step, tag, &mut awaited);
        let finished = match timeout {
            Some(limit) => tokio::time::timeout(limit, collect).await.ok(),
            None => Some(collect.await),
        };
        let Some(result) = finished else {
            return Err(TransportError::Timeout {
                tag: tag.to_string(),
                missing: awaited.len(),
            });
        };
        let trades = result?;

        self.step += 1;
        Ok(trades)
    }

    async fn collect_replies(
        &mut self,
        step: StepId,
        tag: &str,
        awaited: &mut BTreeSet<PrivateId>,
    ) -> Result<Vec<TradeMessage>> {
        let mut trades = Vec::new();
        while !awaited.is_empty() {
            match self.next_inbound().await? {
                AgentMessage::Register { private_id, name } => {
                    self.register_agent(private_id, name);
                }
                AgentMessage::Reply {
                    private_id,
                    step: reply_step,
                    trades: submitted,
                } => {
                    if reply_step != step {
                        warn!(
                            "'{}': dropping reply from {} for step {} (current {})",
                            tag, private_id, reply_step, step
                        );
                        continue;
                    }
                    if !awaited.remove(&private_id) {
                        warn!("'{}': dropping extra reply from {}", tag, private_id);
                        continue;
                    }
                    let Some(public_id) = self.directory.public_id(private_id) else {
                        continue;
                    };
                    trades.extend(submitted.into_iter().map(|mut trade| {
                        trade.agent = public_id;
                        trade
                    }));
                }
            }
        }
        Ok(trades)
    }

    async fn next_inbound(&mut self) -> Result<AgentMessage> {
        self.inbound_rx
            .recv()
            .await
            .ok_or(TransportError::ChannelClosed)
    }

    /// Tell every connection the experiment is over
    pub fn stop(&self) {
        info!("Stopping message server ({} connections)", self.connections.len());
        for private_id in self.connections.keys() {
            self.push(*private_id, ServerMessage::Shutdown);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::AgentTransport;
    use agora_core::{BidBundle, MarketId};

    fn position(agent: u32, slot: u32) -> TradeMessage {
        TradeMessage::new(PublicId(agent), MarketId(0), BidBundle::Position { slot })
    }

    async fn registered(server: &mut MessageServer, n: usize) -> Vec<ChannelTransport> {
        let transports: Vec<ChannelTransport> = (0..n).map(|_| server.connect()).collect();
        for transport in &transports {
            transport.register(None).await.unwrap();
        }
        server.set_expected_agents(n);
        server.wait_for_registrations().await.unwrap();
        transports
    }

    #[tokio::test]
    async fn test_registration_is_idempotent() {
        let mut server = MessageServer::new(MessageServerConfig::default());
        let transport = server.connect();

        let first = server.register_agent(transport.private_id(), Some("a".into()));
        let second = server.register_agent(transport.private_id(), None);

        assert_eq!(first, Some(PublicId(0)));
        assert_eq!(second, Some(PublicId(0)));
        assert_eq!(server.registered_agents(), vec![PublicId(0)]);
        assert_eq!(server.register_agent(PrivateId::new(), None), None);
    }

    #[tokio::test]
    async fn test_registration_ack_delivered() {
        let mut server = MessageServer::new(MessageServerConfig::default());
        let mut transports = registered(&mut server, 2).await;

        let ack = transports[1].receive().await.unwrap();
        assert_eq!(
            ack,
            ServerMessage::Deliver {
                step: 0,
                message: Message::Registration(RegistrationMessage {
                    public_id: PublicId(1),
                    name: None,
                }),
            }
        );
    }

    #[tokio::test]
    async fn test_barrier_collects_one_reply_each() {
        let mut server = MessageServer::new(MessageServerConfig::default());
        let transports = registered(&mut server, 3).await;

        // agent 1 lies about its identity; the server restamps it
        transports[0].send(0, vec![position(0, 1)]).await.unwrap();
        transports[1].send(0, vec![position(7, 2)]).await.unwrap();
        transports[2].send(0, Vec::new()).await.unwrap();

        let trades = server.wait_for_bids("trade request").await.unwrap();

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].agent, PublicId(0));
        assert_eq!(trades[1].agent, PublicId(1));
        assert_eq!(server.step(), 1);
    }

    #[tokio::test]
    async fn test_extra_and_stale_replies_dropped() {
        let mut server = MessageServer::new(MessageServerConfig::default());
        let transports = registered(&mut server, 2).await;

        transports[0].send(5, vec![position(0, 9)]).await.unwrap();
        transports[0].send(0, vec![position(0, 1)]).await.unwrap();
        transports[0].send(0, vec![position(0, 2)]).await.unwrap();
        transports[1].send(0, Vec::new()).await.unwrap();

        let trades = server.wait_for_bids("bids").await.unwrap();

        assert_eq!(trades, vec![position(0, 1)]);
    }

    #[tokio::test]
    async fn test_late_registrant_not_awaited() {
        let mut server = MessageServer::new(MessageServerConfig::default());
        let transports = registered(&mut server, 1).await;
        let late = server.connect();

        late.register(None).await.unwrap();
        transports[0].send(0, Vec::new()).await.unwrap();

        server.wait_for_bids("bids").await.unwrap();
        assert_eq!(server.registered_agents().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_barrier_timeout() {
        let mut server = MessageServer::new(MessageServerConfig {
            expected_agents: 0,
            barrier_timeout: Some(Duration::from_secs(5)),
        });
        let transports = registered(&mut server, 2).await;
        transports[0].send(0, Vec::new()).await.unwrap();

        let result = server.wait_for_bids("valuations").await;

        assert_eq!(
            result,
            Err(TransportError::Timeout {
                tag: "valuations".to_string(),
                missing: 1,
            })
        );
        assert_eq!(server.step(), 0);
    }

    #[tokio::test]
    async fn test_stop_broadcasts_shutdown() {
        let mut server = MessageServer::new(MessageServerConfig::default());
        let mut transport = server.connect();

        server.notify_to_respond();
        server.stop();

        assert_eq!(transport.receive().await.unwrap(), ServerMessage::Begin);
        assert_eq!(transport.receive().await.unwrap(), ServerMessage::Shutdown);
    }
}
