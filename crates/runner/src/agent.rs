//! Agent Runner - drives one agent over its transport
//!
//! Each runner:
//! - Registers when the server says `Begin`
//! - Dispatches delivered messages to the agent's callbacks
//! - Queues the bids the agent produces
//! - Answers every barrier with exactly one reply carrying the queue

use agora_core::{
    BankUpdateMessage, InformationMessage, Message, Money, PublicId, RegistrationMessage,
    SimulationReportMessage, StepId, TradeMessage, TradeRequestMessage, ValuationMessage,
};
use agora_messaging::{AgentTransport, ServerMessage};
use async_trait::async_trait;

/// Agent trait - implement this for your bidding strategy
///
/// Only trade requests demand an answer; every other callback is optional.
#[async_trait]
pub trait Agent: Send {
    /// Agent name for logging and reports
    fn name(&self) -> &str;

    /// Called once the server has assigned a public id
    async fn on_registration(&mut self, _registration: &RegistrationMessage) {}

    /// Called on account initialization and after every settled market
    async fn on_bank_update(&mut self, _update: &BankUpdateMessage) {}

    /// Called at the start of every run with this run's valuation
    async fn on_valuation(&mut self, _valuation: &ValuationMessage) {}

    /// Called when a market invites a bid; returned bids go out with the
    /// next barrier reply
    async fn on_trade_request(&mut self, request: &TradeRequestMessage) -> Vec<TradeMessage>;

    /// Called when a market this agent took part in has settled
    async fn on_information(&mut self, _information: &InformationMessage) {}

    /// Called at the end of every run
    async fn on_simulation_report(&mut self, _report: &SimulationReportMessage) {}

    /// Called once when the experiment is over
    async fn on_shutdown(&mut self) {}
}

/// What an agent saw during an experiment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentStats {
    pub name: String,
    pub public_id: Option<PublicId>,
    /// Barrier replies sent
    pub replies: u64,
    /// Bids submitted across all replies
    pub bids: u64,
    pub trade_requests: u64,
    pub reports: u64,
    /// Balance from the latest bank update
    pub balance: Option<Money>,
}

/// Agent runner - wraps an agent and manages its lifecycle
pub struct AgentRunner<T: AgentTransport> {
    agent: Box<dyn Agent>,
    transport: T,
    /// Bids waiting for the next barrier
    pending: Vec<TradeMessage>,
    stats: AgentStats,
}

impl<T: AgentTransport> AgentRunner<T> {
    pub fn new(agent: Box<dyn Agent>, transport: T) -> Self {
        let stats = AgentStats {
            name: agent.name().to_string(),
            ..AgentStats::default()
        };
        Self {
            agent,
            transport,
            pending: Vec::new(),
            stats,
        }
    }

    async fn handle_message(&mut self, message: Message) {
        match message {
            Message::Registration(registration) => {
                log::info!(
                    "[{}] Registered as {}",
                    self.stats.name,
                    registration.public_id
                );
                self.stats.public_id = Some(registration.public_id);
                self.agent.on_registration(&registration).await;
            }
            Message::BankUpdate(update) => {
                self.stats.balance = Some(update.balance);
                self.agent.on_bank_update(&update).await;
            }
            Message::Valuation(valuation) => {
                self.agent.on_valuation(&valuation).await;
            }
            Message::TradeRequest(request) => {
                self.stats.trade_requests += 1;
                let bids = self.agent.on_trade_request(&request).await;
                self.pending.extend(bids);
            }
            Message::Information(information) => {
                self.agent.on_information(&information).await;
            }
            Message::SimulationReport(report) => {
                self.stats.reports += 1;
                self.agent.on_simulation_report(&report).await;
            }
        }
    }

    /// Answer a barrier with everything queued since the last one
    async fn reply(&mut self, step: StepId, tag: &str) -> bool {
        let trades = std::mem::take(&mut self.pending);
        let count = trades.len() as u64;
        log::debug!(
            "[{}] Replying to '{}' (step {}) with {} bids",
            self.stats.name,
            tag,
            step,
            count
        );
        match self.transport.send(step, trades).await {
            Ok(()) => {
                self.stats.replies += 1;
                self.stats.bids += count;
                true
            }
            Err(e) => {
                log::error!("[{}] Failed to reply: {}", self.stats.name, e);
                false
            }
        }
    }

    /// Run the agent until the server shuts it down or the connection drops
    pub async fn run(mut self) -> AgentStats {
        log::info!("[{}] Agent started", self.stats.name);

        loop {
            let message = match self.transport.receive().await {
                Ok(message) => message,
                Err(e) => {
                    log::info!("[{}] Connection closed: {}", self.stats.name, e);
                    break;
                }
            };

            match message {
                ServerMessage::Begin => {
                    let name = Some(self.stats.name.clone());
                    if let Err(e) = self.transport.register(name).await {
                        log::error!("[{}] Failed to register: {}", self.stats.name, e);
                        break;
                    }
                }
                ServerMessage::Deliver { message, .. } => self.handle_message(message).await,
                ServerMessage::AwaitReply { step, tag } => {
                    if !self.reply(step, &tag).await {
                        break;
                    }
                }
                ServerMessage::Shutdown => break,
            }
        }

        self.agent.on_shutdown().await;

        log::info!("[{}] Agent stopped", self.stats.name);
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{BidBundle, MarketId, MechanismType, PrivateId};
    use agora_messaging::{AgentMessage, ChannelTransport};
    use tokio::sync::mpsc;

    struct SlotZero;

    #[async_trait]
    impl Agent for SlotZero {
        fn name(&self) -> &str {
            "slot-zero"
        }

        async fn on_trade_request(&mut self, request: &TradeRequestMessage) -> Vec<TradeMessage> {
            vec![TradeMessage::new(
                request.agent,
                request.market_id,
                BidBundle::Position { slot: 0 },
            )]
        }
    }

    fn request(agent: PublicId) -> Message {
        Message::TradeRequest(TradeRequestMessage {
            agent,
            market_id: MarketId(0),
            mechanism: MechanismType::CostSharing,
            tick: 1,
            tradeables: Vec::new(),
            transactions: Vec::new(),
            clearing_price: None,
        })
    }

    #[tokio::test]
    async fn test_runner_protocol() {
        let private_id = PrivateId::new();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let transport = ChannelTransport::new(private_id, out_tx, in_rx);
        let handle = tokio::spawn(AgentRunner::new(Box::new(SlotZero), transport).run());

        in_tx.send(ServerMessage::Begin).unwrap();
        match out_rx.recv().await.unwrap() {
            AgentMessage::Register { name, .. } => assert_eq!(name.as_deref(), Some("slot-zero")),
            other => panic!("expected registration, got {:?}", other),
        }

        in_tx
            .send(ServerMessage::Deliver {
                step: 0,
                message: Message::Registration(RegistrationMessage {
                    public_id: PublicId(4),
                    name: None,
                }),
            })
            .unwrap();
        in_tx
            .send(ServerMessage::Deliver {
                step: 0,
                message: request(PublicId(4)),
            })
            .unwrap();
        in_tx
            .send(ServerMessage::AwaitReply {
                step: 0,
                tag: "trade request message".to_string(),
            })
            .unwrap();

        match out_rx.recv().await.unwrap() {
            AgentMessage::Reply { step, trades, .. } => {
                assert_eq!(step, 0);
                assert_eq!(trades.len(), 1);
                assert_eq!(trades[0].agent, PublicId(4));
            }
            other => panic!("expected reply, got {:?}", other),
        }

        // Queue was drained by the first reply
        in_tx
            .send(ServerMessage::AwaitReply {
                step: 1,
                tag: "information message".to_string(),
            })
            .unwrap();
        match out_rx.recv().await.unwrap() {
            AgentMessage::Reply { step, trades, .. } => {
                assert_eq!(step, 1);
                assert!(trades.is_empty());
            }
            other => panic!("expected reply, got {:?}", other),
        }

        in_tx.send(ServerMessage::Shutdown).unwrap();
        let stats = handle.await.unwrap();
        assert_eq!(stats.public_id, Some(PublicId(4)));
        assert_eq!(stats.replies, 2);
        assert_eq!(stats.bids, 1);
        assert_eq!(stats.trade_requests, 1);
    }

    #[tokio::test]
    async fn test_runner_stops_when_server_drops() {
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let transport = ChannelTransport::new(PrivateId::new(), out_tx, in_rx);
        let handle = tokio::spawn(AgentRunner::new(Box::new(SlotZero), transport).run());

        drop(in_tx);
        let stats = handle.await.unwrap();
        assert_eq!(stats.replies, 0);
        assert_eq!(stats.name, "slot-zero");
    }
}
