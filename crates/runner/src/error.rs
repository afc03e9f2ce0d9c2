//! Simulation errors

use agora_accounting::AccountingError;
use agora_market::MarketError;
use agora_messaging::TransportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Market error: {0}")]
    Market(#[from] MarketError),

    #[error("Accounting error: {0}")]
    Accounting(#[from] AccountingError),

    #[error("No agent registered under '{0}'")]
    UnknownAgent(String),

    #[error("Simulation {0} has no world")]
    MissingWorld(usize),

    #[error("Agent task failed: {0}")]
    AgentTask(String),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
