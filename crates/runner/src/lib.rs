//! Agora Runner - Repeated Multi-Agent Market Simulations
//!
//! Orchestrates experiments in which agents play markets over many runs:
//!
//! - **World**: accounts, endowments, valuations and markets of a simulation
//! - **Agent Runner**: drives one agent over its transport
//! - **Bots**: demo agents for each mechanism family
//! - **Simulation**: runs, blocks, ticks and barriers
//!
//! ## Architecture
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────────┐
//!  │                     SimulationManager                        │
//!  │  for each iteration / simulation / run:                      │
//!  │    initialize accounts + valuations                          │
//!  │    for each block: open markets per group, tick until closed │
//!  │    simulation report, utility update, reset                  │
//!  └───────────────┬───────────────────────────────┬──────────────┘
//!                  │ &mut World                    │ barriers
//!                  ▼                               ▼
//!  ┌───────────────────────────┐       ┌───────────────────────────┐
//!  │ World                     │       │      MessageServer        │
//!  │  accounts / endowments    │       └─────────────┬─────────────┘
//!  │  valuations / markets     │                     │ channels
//!  └───────────────────────────┘                     ▼
//!                                    ┌───────────────────────────────┐
//!                                    │ AgentRunner → Agent (bots)    │
//!                                    └───────────────────────────────┘
//! ```

pub mod agent;
pub mod bots;
pub mod config;
pub mod error;
pub mod registry;
pub mod report;
pub mod simulation;
pub mod world;

// Re-export main types
pub use agent::{Agent, AgentRunner, AgentStats};
pub use bots::{FixedQuoteTrader, FixedSlotAgent, ShadedBidder, ZeroIntelligenceTrader};
pub use config::{SimulationTiming, ValuationConfig, WorldConfig};
pub use error::{Result, SimulationError};
pub use registry::{AgentFactory, AgentRegistry};
pub use report::{JsonReporter, LogReporter};
pub use simulation::{SimulationManager, SimulationOutcome, group_agents};
pub use world::{Domain, Simulation, World, WorldManager};
