mod account;
mod allocation;
mod bid;
mod ledger;
mod market_record;
mod market_state;
mod order;
mod tradeable;
mod transaction;
mod valuation;

pub use account::{Account, AccountUpdate, Endowment};
pub use allocation::{Allocation, Fill};
pub use bid::{BidBundle, BundleKind, MAX_BID_AMOUNT, Side, TradeMessage};
pub use ledger::Ledger;
pub use market_record::MarketRecord;
pub use market_state::MarketState;
pub use order::{Order, Party};
pub use tradeable::Tradeable;
pub use transaction::{Transaction, TransactionId};
pub use valuation::{GeneralValuation, SpecificValuation};
