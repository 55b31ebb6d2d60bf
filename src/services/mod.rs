pub mod accounts;
pub mod history;
pub mod ledger;

pub use accounts::AccountService;
pub use history::HistoryService;
pub use ledger::LedgerService;
