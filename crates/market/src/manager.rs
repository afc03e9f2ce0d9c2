use std::collections::BTreeMap;

use agora_core::{
    AccountUpdate, InformationMessage, MarketId, MarketRecord, PublicId, SimulationReportMessage,
    TradeMessage, TradeRequestMessage, Tradeable,
};
use agora_ports::{InformationRevelationPolicy, MarketRules};
use agora_rules::Mechanism;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{MarketError, Result};
use crate::market::Market;

/// A market to open for every agent group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketTemplate {
    pub mechanism: Mechanism,
    #[serde(default)]
    pub tradeables: Vec<Tradeable>,
}

/// Markets opened together and run to completion before the next block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketBlock {
    pub templates: Vec<MarketTemplate>,
}

impl MarketBlock {
    pub fn new(templates: Vec<MarketTemplate>) -> Self {
        Self { templates }
    }
}

/// A finalized market kept for end-of-run reporting
struct CompletedMarket {
    record: MarketRecord,
    information: Box<dyn InformationRevelationPolicy>,
}

/// Owns every active market of a run
///
/// Publishes the number of open markets on a watch channel whenever it
/// changes.
pub struct MarketManager {
    blocks: Vec<MarketBlock>,
    markets: BTreeMap<MarketId, Market>,
    completed: Vec<CompletedMarket>,
    open_tx: watch::Sender<usize>,
}

impl MarketManager {
    pub fn new(blocks: Vec<MarketBlock>) -> Self {
        let (open_tx, _) = watch::channel(0);
        Self {
            blocks,
            markets: BTreeMap::new(),
            completed: Vec::new(),
            open_tx,
        }
    }

    pub fn num_market_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn subscribe_open_markets(&self) -> watch::Receiver<usize> {
        self.open_tx.subscribe()
    }

    fn publish_open_count(&self) {
        let open = self.markets.values().filter(|m| m.is_open()).count();
        self.open_tx.send_if_modified(|current| {
            if *current == open {
                false
            } else {
                *current = open;
                true
            }
        });
    }

    /// Register and open a new market. Returns false if `market_id` is
    /// already active; the existing market is left untouched.
    pub fn open(
        &mut self,
        rules: MarketRules,
        market_id: MarketId,
        tradeables: Vec<Tradeable>,
        members: Vec<PublicId>,
    ) -> bool {
        if self.markets.contains_key(&market_id) {
            warn!("Market {} already active, not opening", market_id);
            return false;
        }

        let mut market = Market::new(market_id, rules, tradeables, members);
        market.open();
        self.markets.insert(market_id, market);
        self.publish_open_count();
        true
    }

    /// Open one market per template of `block` for one agent group
    ///
    /// Ids are assigned deterministically from the block, the group and the
    /// template position.
    pub fn open_markets(
        &mut self,
        block: usize,
        group: &[PublicId],
        group_index: usize,
        group_count: usize,
    ) -> Result<Vec<MarketId>> {
        let templates = self
            .blocks
            .get(block)
            .ok_or(MarketError::BlockNotFound(block))?
            .templates
            .clone();

        let earlier: usize = self.blocks[..block].iter().map(|b| b.templates.len()).sum();
        let first = earlier * group_count + group_index * templates.len();

        let mut opened = Vec::with_capacity(templates.len());
        for (position, template) in templates.into_iter().enumerate() {
            let market_id = MarketId((first + position) as u32);
            if self.open(
                template.mechanism.rules(),
                market_id,
                template.tradeables,
                group.to_vec(),
            ) {
                opened.push(market_id);
            }
        }
        info!(
            "Block {}: opened {} markets for group {} of {}",
            block,
            opened.len(),
            group_index,
            group_count
        );
        Ok(opened)
    }

    /// Stop accepting bids in a market, clearing any still pending
    pub fn close(&mut self, market_id: MarketId) -> Result<()> {
        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(MarketError::MarketNotFound(market_id))?;
        let result = market.close();
        self.publish_open_count();
        result
    }

    /// Tick one market, returning the next round's trade requests
    pub fn update(
        &mut self,
        market_id: MarketId,
        agents: &[PublicId],
    ) -> Result<Vec<TradeRequestMessage>> {
        let market = self
            .markets
            .get_mut(&market_id)
            .ok_or(MarketError::MarketNotFound(market_id))?;
        let result = market.tick(agents);
        self.publish_open_count();
        result
    }

    /// Route a bid to its market's admission. Returns whether it was recorded.
    pub fn handle_trade_message(&mut self, message: TradeMessage) -> bool {
        match self.markets.get_mut(&message.market_id) {
            Some(market) => market.admit(message),
            None => {
                warn!(
                    "Dropping bid from {} for unknown market {}",
                    message.agent, message.market_id
                );
                false
            }
        }
    }

    /// Account updates for a closing market; nothing is applied here
    pub fn finish_market(&self, market_id: MarketId) -> Result<Vec<AccountUpdate>> {
        self.markets
            .get(&market_id)
            .ok_or(MarketError::MarketNotFound(market_id))?
            .finish()
    }

    /// Record a closing market for the end-of-run report and remove it
    pub fn finalize_market(&mut self, market_id: MarketId) -> Result<()> {
        match self.markets.get(&market_id) {
            None => return Err(MarketError::MarketNotFound(market_id)),
            Some(market) if !market.is_closing() => {
                return Err(MarketError::NotClosing(market_id));
            }
            Some(_) => {}
        }

        if let Some(market) = self.markets.remove(&market_id) {
            let (record, information) = market.finalize();
            self.completed.push(CompletedMarket {
                record,
                information,
            });
        }
        self.publish_open_count();
        Ok(())
    }

    /// Outcome of one market for each of `agents`, filtered by its
    /// revelation policy
    pub fn construct_information_messages(
        &self,
        market_id: MarketId,
        agents: &[PublicId],
    ) -> Result<Vec<InformationMessage>> {
        let market = self
            .markets
            .get(&market_id)
            .ok_or(MarketError::MarketNotFound(market_id))?;
        Ok(agents
            .iter()
            .filter(|agent| market.is_member(**agent))
            .map(|agent| market.information_message(*agent))
            .collect())
    }

    /// End-of-run report per agent covering every market it took part in
    pub fn construct_simulation_report_messages(
        &self,
        agents: &[PublicId],
    ) -> Vec<SimulationReportMessage> {
        agents
            .iter()
            .map(|agent| SimulationReportMessage {
                agent: *agent,
                markets: self
                    .completed
                    .iter()
                    .filter(|c| c.record.members.contains(agent))
                    .map(|c| c.information.reveal(&c.record, *agent))
                    .collect(),
            })
            .collect()
    }

    pub fn market(&self, market_id: MarketId) -> Option<&Market> {
        self.markets.get(&market_id)
    }

    pub fn active_market_ids(&self) -> Vec<MarketId> {
        self.markets.keys().copied().collect()
    }

    /// Markets that stopped accepting bids and wait for settlement
    pub fn closing_market_ids(&self) -> Vec<MarketId> {
        self.markets
            .values()
            .filter(|m| m.is_closing())
            .map(|m| m.id())
            .collect()
    }

    pub fn market_open(&self, market_id: MarketId) -> bool {
        self.markets
            .get(&market_id)
            .map(|m| m.is_open())
            .unwrap_or(false)
    }

    pub fn any_markets_open(&self) -> bool {
        self.markets.values().any(|m| m.is_open())
    }

    pub fn completed_markets(&self) -> impl Iterator<Item = &MarketRecord> {
        self.completed.iter().map(|c| &c.record)
    }

    /// Drop every market and completed record; the block configuration stays
    pub fn reset(&mut self) {
        self.markets.clear();
        self.completed.clear();
        self.publish_open_count();
    }
}
