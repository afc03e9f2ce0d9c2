use agora_core::{
    InformationMessage, Ledger, MarketRecord, MarketState, MechanismType, Money, PublicId,
    TradeMessage, TradeRequestMessage, Transaction,
};

use crate::error::MechanismResult;

/// Decides who gets what from the bids recorded this tick
///
/// Implementations must be deterministic for a given bid order and document
/// their tie-breaking.
pub trait AllocationRule: Send {
    /// Compute the allocation and store it in the state
    fn set_allocation(&self, state: &mut MarketState);

    fn name(&self) -> &str;
}

/// Turns an allocation into settlement orders (and executed transactions)
pub trait PaymentRule: Send {
    /// Compute the orders for this tick and store them in the state
    fn set_orders(&self, state: &mut MarketState) -> MechanismResult<()>;

    /// Exact total the agents must be charged this tick, for rules that
    /// distribute a fixed pool
    fn budget(&self, _state: &MarketState) -> Option<Money> {
        None
    }

    fn name(&self) -> &str;
}

/// Admission control for newly submitted bids
pub trait ActivityRule: Send {
    /// Evaluate `bid` against the state and set the state's acceptable flag
    fn is_acceptable(&self, state: &mut MarketState, bid: &TradeMessage);

    fn name(&self) -> &str;
}

/// Builds the trade request an agent receives before the next tick
pub trait QueryRule: Send {
    fn make_request(
        &self,
        state: &MarketState,
        ledger: &Ledger,
        agent: PublicId,
    ) -> TradeRequestMessage;

    fn mechanism(&self) -> MechanismType;
}

/// Decides when a market leaves the open phase
pub trait TerminationCondition: Send {
    fn is_over(&self, state: &MarketState) -> bool;

    fn name(&self) -> &str;
}

/// Decides what each agent may see of market outcomes
pub trait InformationRevelationPolicy: Send {
    /// The part of a transaction history `agent` is allowed to see
    fn sanitize(&self, transactions: &[Transaction], agent: PublicId) -> Vec<Transaction>;

    /// Report on a finished market for `agent`
    fn reveal(&self, record: &MarketRecord, agent: PublicId) -> InformationMessage {
        InformationMessage {
            agent,
            market_id: record.market_id,
            ticks: record.ticks,
            allocation: record.holdings_of(agent),
            payment: record.payment_of(agent),
            transactions: self.sanitize(record.ledger.get_list(), agent),
            clearing_price: record.clearing_price,
        }
    }

    fn name(&self) -> &str;
}

/// Complete rule set of one market
pub struct MarketRules {
    pub allocation: Box<dyn AllocationRule>,
    pub payment: Box<dyn PaymentRule>,
    pub query: Box<dyn QueryRule>,
    pub activity: Box<dyn ActivityRule>,
    pub information: Box<dyn InformationRevelationPolicy>,
    pub termination: Box<dyn TerminationCondition>,
}

impl MarketRules {
    pub fn new(
        allocation: Box<dyn AllocationRule>,
        payment: Box<dyn PaymentRule>,
        query: Box<dyn QueryRule>,
        activity: Box<dyn ActivityRule>,
        information: Box<dyn InformationRevelationPolicy>,
        termination: Box<dyn TerminationCondition>,
    ) -> Self {
        Self {
            allocation,
            payment,
            query,
            activity,
            information,
            termination,
        }
    }

    pub fn mechanism(&self) -> MechanismType {
        self.query.mechanism()
    }

    /// One-line summary for logs
    pub fn describe(&self) -> String {
        format!(
            "allocation={}, payment={}, activity={}, information={}, termination={}",
            self.allocation.name(),
            self.payment.name(),
            self.activity.name(),
            self.information.name(),
            self.termination.name()
        )
    }
}

impl std::fmt::Debug for MarketRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MarketRules [{}]", self.describe())
    }
}
