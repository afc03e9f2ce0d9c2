//! Simulation - repeated multi-agent market experiments
//!
//! Drives every configured simulation through its runs:
//! - Agent startup and registration
//! - Account initialization and valuations
//! - Market blocks, tick by tick, behind barriers
//! - Settlement, reports and utility accounting

use std::collections::BTreeMap;
use std::time::Duration;

use agora_accounting::UtilityManager;
use agora_core::{Message, MarketId, PublicId, RegistrationMessage, TradeMessage};
use agora_messaging::{MessageServer, MessageServerConfig};
use agora_ports::{UtilityReporter, UtilityTable};
use log::{debug, error, info, warn};
use tokio::task::JoinHandle;

use crate::agent::{AgentRunner, AgentStats};
use crate::config::SimulationTiming;
use crate::error::{Result, SimulationError};
use crate::registry::AgentRegistry;
use crate::report::LogReporter;
use crate::world::{Simulation, World, WorldManager};

/// Simulation results
#[derive(Debug, Clone, Default)]
pub struct SimulationOutcome {
    /// Utility per agent summed over every run
    pub utilities: UtilityTable,
    /// Utility per agent for each run, in play order
    pub runs: Vec<UtilityTable>,
    pub names: BTreeMap<PublicId, String>,
    /// What each agent task saw, in roster order
    pub agents: Vec<AgentStats>,
}

/// Split agents into consecutive groups of `group_size`; zero or negative
/// puts everyone in a single group
pub fn group_agents(agents: &[PublicId], group_size: i32) -> Vec<Vec<PublicId>> {
    if group_size <= 0 {
        return vec![agents.to_vec()];
    }
    agents
        .chunks(group_size as usize)
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Owns the simulations of an experiment and the agents playing them
pub struct SimulationManager {
    simulations: Vec<Simulation>,
    locked: bool,
    registry: AgentRegistry,
    /// Registry keys, one agent started per entry
    roster: Vec<String>,
    server_config: MessageServerConfig,
    utility: UtilityManager,
    reporter: Box<dyn UtilityReporter>,
}

impl SimulationManager {
    pub fn new(registry: AgentRegistry) -> Self {
        Self {
            simulations: Vec::new(),
            locked: false,
            registry,
            roster: Vec::new(),
            server_config: MessageServerConfig::default(),
            utility: UtilityManager::new(),
            reporter: Box::new(LogReporter::new()),
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn UtilityReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Fail a barrier when some agent has not answered within `timeout`
    pub fn with_barrier_timeout(mut self, timeout: Duration) -> Self {
        self.server_config.barrier_timeout = Some(timeout);
        self
    }

    /// Add one agent built by the registry entry `key`
    pub fn add_agent(&mut self, key: &str) -> bool {
        if !self.registry.contains(key) {
            warn!("No agent factory '{}', not adding", key);
            return false;
        }
        self.roster.push(key.to_string());
        true
    }

    pub fn add_agents(&mut self, key: &str, count: usize) -> bool {
        (0..count).all(|_| self.add_agent(key))
    }

    /// Queue a simulation. Refused once the manager is locked.
    pub fn create_simulation(
        &mut self,
        runs: usize,
        group_size: i32,
        world_manager: WorldManager,
    ) -> bool {
        if self.locked {
            warn!("Creation denied: simulation manager locked.");
            return false;
        }
        self.simulations
            .push(Simulation::new(runs, group_size, world_manager));
        true
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn simulations(&self) -> &[Simulation] {
        &self.simulations
    }

    pub fn handle_registration(&mut self, registration: &RegistrationMessage) {
        debug!(
            "Recording {} ({:?})",
            registration.public_id, registration.name
        );
        self.utility
            .add_agent_record(registration.public_id, registration.name.clone());
    }

    /// Route a bid to the market it names in `world`
    pub fn give_trade_message(world: &mut World, message: TradeMessage) -> bool {
        world.markets.handle_trade_message(message)
    }

    /// Run every simulation `num_runs` times over, then stop the agents and
    /// report utility
    ///
    /// The manager is locked for good once this starts.
    pub async fn run_simulation(
        &mut self,
        timing: SimulationTiming,
        num_runs: usize,
    ) -> Result<SimulationOutcome> {
        self.lock();
        info!(
            "Starting experiment: {} simulations, {} agents, {} runs",
            self.simulations.len(),
            self.roster.len(),
            num_runs
        );

        let mut config = self.server_config.clone();
        config.expected_agents = self.roster.len();
        let mut server = MessageServer::new(config);

        let handles = self.start_agents(&mut server)?;
        if !timing.starting_delay().is_zero() {
            tokio::time::sleep(timing.starting_delay()).await;
        }

        let result = self.run_experiment(&mut server, &timing, num_runs).await;
        if let Err(e) = &result {
            error!("Experiment aborted: {}", e);
        }
        server.stop();

        let mut agents = Vec::with_capacity(handles.len());
        let mut join_error = None;
        for handle in handles {
            match handle.await {
                Ok(stats) => agents.push(stats),
                Err(e) => join_error = Some(e.to_string()),
            }
        }
        result?;
        if let Some(e) = join_error {
            return Err(SimulationError::AgentTask(e));
        }

        self.utility.report(self.reporter.as_ref());
        Ok(SimulationOutcome {
            utilities: self.utility.totals().clone(),
            runs: self.utility.runs().to_vec(),
            names: self.utility.names().clone(),
            agents,
        })
    }

    fn start_agents(&self, server: &mut MessageServer) -> Result<Vec<JoinHandle<AgentStats>>> {
        let mut handles = Vec::with_capacity(self.roster.len());
        for key in &self.roster {
            let agent = self
                .registry
                .create(key)
                .ok_or_else(|| SimulationError::UnknownAgent(key.clone()))?;
            let transport = server.connect();
            handles.push(tokio::spawn(AgentRunner::new(agent, transport).run()));
        }
        Ok(handles)
    }

    async fn run_experiment(
        &mut self,
        server: &mut MessageServer,
        timing: &SimulationTiming,
        num_runs: usize,
    ) -> Result<()> {
        server.notify_to_respond();
        let registrations = server.wait_for_registrations().await?;
        for registration in &registrations {
            self.handle_registration(registration);
        }
        let agents = server.registered_agents();

        for iteration in 0..num_runs {
            for index in 0..self.simulations.len() {
                let simulation = &mut self.simulations[index];
                let groups = group_agents(&agents, simulation.group_size);
                let runs = simulation.runs;
                let world = simulation
                    .world_manager
                    .world_mut()
                    .ok_or(SimulationError::MissingWorld(index))?;

                for run in 0..runs {
                    info!(
                        "Iteration {} simulation {} run {} ({} groups)",
                        iteration,
                        index,
                        run,
                        groups.len()
                    );
                    Self::run_single_simulation(server, world, &agents, &groups, timing).await?;
                    self.utility
                        .update_utility(&world.domain.accounts, &world.domain.valuations);
                    world.reset();
                }
            }
        }
        Ok(())
    }

    async fn run_single_simulation(
        server: &mut MessageServer,
        world: &mut World,
        agents: &[PublicId],
        groups: &[Vec<PublicId>],
        timing: &SimulationTiming,
    ) -> Result<()> {
        Self::initialize_agents(server, world, agents).await?;
        if !timing.learning_delay().is_zero() {
            tokio::time::sleep(timing.learning_delay()).await;
        }

        for block in 0..world.markets.num_market_blocks() {
            Self::run_auction(server, world, block, agents, groups, timing).await?;
        }

        for report in world.markets.construct_simulation_report_messages(agents) {
            server.send_message(report.agent, Message::SimulationReport(report));
        }
        Self::barrier(server, world, "simulation report").await?;
        Ok(())
    }

    /// Fresh endowments and valuations for this run
    async fn initialize_agents(
        server: &mut MessageServer,
        world: &mut World,
        agents: &[PublicId],
    ) -> Result<()> {
        let domain = &mut world.domain;
        for agent in agents {
            let endowment = domain.endowments.make_agent_endowment(*agent);
            domain.accounts.endow(*agent, endowment);
            domain.valuations.add_agent_valuation(*agent);
        }

        for message in domain.accounts.construct_initialization_messages(agents) {
            server.send_message(message.agent, Message::BankUpdate(message));
        }
        Self::barrier(server, world, "account initialization").await?;

        for message in world.domain.valuations.construct_valuation_messages(agents) {
            server.send_message(message.agent, Message::Valuation(message));
        }
        Self::barrier(server, world, "agent valuations").await?;
        Ok(())
    }

    /// Open one block for every group and run it until every market has
    /// settled
    async fn run_auction(
        server: &mut MessageServer,
        world: &mut World,
        block: usize,
        agents: &[PublicId],
        groups: &[Vec<PublicId>],
        timing: &SimulationTiming,
    ) -> Result<()> {
        let open = world.markets.subscribe_open_markets();
        for (index, group) in groups.iter().enumerate() {
            world
                .markets
                .open_markets(block, group, index, groups.len())?;
        }

        while *open.borrow() > 0 {
            Self::update_auctions(server, world, agents).await?;
            if !timing.simulation_delay().is_zero() {
                tokio::time::sleep(timing.simulation_delay()).await;
            }
        }
        // Markets that closed on the last tick still need settling
        Self::update_auctions(server, world, agents).await
    }

    /// Tick every open market; settle every market that has closed
    async fn update_auctions(
        server: &mut MessageServer,
        world: &mut World,
        agents: &[PublicId],
    ) -> Result<()> {
        for market_id in world.markets.active_market_ids() {
            if world.markets.market_open(market_id) {
                let requests = world.markets.update(market_id, agents)?;
                if requests.is_empty() {
                    continue;
                }
                for request in requests {
                    server.send_message(request.agent, Message::TradeRequest(request));
                }
                Self::barrier(server, world, "trade request message").await?;
            } else {
                Self::settle_market(server, world, market_id, agents).await?;
            }
        }
        Ok(())
    }

    /// Apply a closed market's outcome to the accounts, tell its members,
    /// then finalize it
    async fn settle_market(
        server: &mut MessageServer,
        world: &mut World,
        market_id: MarketId,
        agents: &[PublicId],
    ) -> Result<()> {
        let updates = world.markets.finish_market(market_id)?;
        world.domain.accounts.update_accounts(&updates)?;
        let bank_updates = world
            .domain
            .accounts
            .construct_bank_update_messages(market_id, &updates);

        for message in world
            .markets
            .construct_information_messages(market_id, agents)?
        {
            server.send_message(message.agent, Message::Information(message));
        }
        Self::barrier(server, world, "information message").await?;

        for message in bank_updates {
            server.send_message(message.agent, Message::BankUpdate(message));
        }
        Self::barrier(server, world, "bank update message").await?;

        world.markets.finalize_market(market_id)?;
        Ok(())
    }

    /// Wait for every agent, then hand the submitted bids to their markets
    async fn barrier(server: &mut MessageServer, world: &mut World, tag: &str) -> Result<()> {
        let trades = server.wait_for_bids(tag).await?;
        let submitted = trades.len();
        let admitted = trades
            .into_iter()
            .filter(|trade| Self::give_trade_message(world, trade.clone()))
            .count();
        debug!("'{}': admitted {} of {} bids", tag, admitted, submitted);
        Ok(())
    }
}
