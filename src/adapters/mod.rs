pub mod memory;
pub mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
