use agora_core::MarketId;
use agora_ports::MechanismError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("Settlement failed in {market}: {source}")]
    Settlement {
        market: MarketId,
        #[source]
        source: MechanismError,
    },

    #[error("Market not found: {0}")]
    MarketNotFound(MarketId),

    #[error("Market {0} is not closing")]
    NotClosing(MarketId),

    #[error("Market block not found: {0}")]
    BlockNotFound(usize),
}

pub type Result<T> = std::result::Result<T, MarketError>;

impl MarketError {
    pub fn settlement(market: MarketId) -> impl FnOnce(MechanismError) -> Self {
        move |source| MarketError::Settlement { market, source }
    }
}
