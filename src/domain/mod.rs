pub mod account;
pub mod bank;
pub mod page;
pub mod pay_history;

pub use account::{Account, NewAccount};
pub use page::PaginatedHistory;
pub use pay_history::{PayHistory, PayType};
