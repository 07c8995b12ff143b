pub mod alert;
pub mod gas;
pub mod portfolio;
pub mod token;

pub use alert::{AlertInterval, AlertKey, Destination, InvalidInterval};
pub use gas::GasOracle;
pub use portfolio::{HolderId, Holding, Valuation, ValuationLine};
pub use token::{HoneypotReport, PairData, TokenRef, TokenSnapshot, TxnCount, Windows};
