//! Worlds and simulations
//!
//! A world is the mutable state one simulation runs against: accounts,
//! endowments, valuations and markets. It is passed explicitly to every
//! step of a run.

use agora_accounting::{AccountManager, EndowmentManager, ValuationManager};
use agora_market::MarketManager;
use log::{info, warn};

use crate::config::WorldConfig;
use crate::error::Result;

/// Everything except the markets
pub struct Domain {
    pub accounts: AccountManager,
    pub endowments: EndowmentManager,
    pub valuations: ValuationManager,
}

impl Domain {
    pub fn new(
        accounts: AccountManager,
        endowments: EndowmentManager,
        valuations: ValuationManager,
    ) -> Self {
        Self {
            accounts,
            endowments,
            valuations,
        }
    }

    /// Back to the pre-run baseline; account endowments are kept
    pub fn reset(&mut self) {
        self.accounts.reset();
        self.endowments.reset();
        self.valuations.reset();
    }
}

pub struct World {
    pub domain: Domain,
    pub markets: MarketManager,
}

impl World {
    pub fn new(domain: Domain, markets: MarketManager) -> Self {
        Self { domain, markets }
    }

    pub fn from_config(config: &WorldConfig) -> Result<Self> {
        let distributions = config
            .valuations
            .iter()
            .map(|v| v.distribution())
            .collect::<Result<Vec<_>>>()?;
        let domain = Domain::new(
            AccountManager::new(),
            EndowmentManager::new(config.endowment.clone()),
            ValuationManager::new(distributions),
        );
        Ok(Self::new(domain, MarketManager::new(config.blocks.clone())))
    }

    pub fn reset(&mut self) {
        self.markets.reset();
        self.domain.reset();
    }
}

/// Holds a single world; creation is refused once one exists
#[derive(Default)]
pub struct WorldManager {
    world: Option<World>,
    locked: bool,
}

impl WorldManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the world and lock. Returns false if already locked.
    pub fn create_world(&mut self, domain: Domain, markets: MarketManager) -> bool {
        self.install(World::new(domain, markets))
    }

    pub fn create_world_from_config(&mut self, config: &WorldConfig) -> Result<bool> {
        if self.locked {
            warn!("Creation denied: world manager locked.");
            return Ok(false);
        }
        Ok(self.install(World::from_config(config)?))
    }

    fn install(&mut self, world: World) -> bool {
        if self.locked {
            warn!("Creation denied: world manager locked.");
            return false;
        }
        info!(
            "World created with {} market blocks",
            world.markets.num_market_blocks()
        );
        self.world = Some(world);
        self.locked = true;
        true
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> Option<&mut World> {
        self.world.as_mut()
    }
}

/// One simulation: a world, how to group agents in it, and how many
/// consecutive runs to play per outer iteration
pub struct Simulation {
    /// Agents per group; zero or negative puts everyone in one group
    pub group_size: i32,
    pub runs: usize,
    pub world_manager: WorldManager,
}

impl Simulation {
    pub fn new(runs: usize, group_size: i32, world_manager: WorldManager) -> Self {
        Self {
            group_size,
            runs,
            world_manager,
        }
    }
}
