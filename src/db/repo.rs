mod balance;
mod balance_db;
mod catalog;
mod catalog_db;
mod chat;
mod chat_db;
mod inventory;
mod inventory_db;
mod memory;
mod totals;
mod totals_db;

pub use balance_db::BalanceRepository;
pub use catalog_db::CatalogRepository;
pub use chat_db::ChatRepository;
pub use inventory_db::InventoryRepository;
pub use totals_db::TotalsRepository;

pub use memory::MemoryStore;

pub use balance::BalanceRepo;
pub use catalog::CatalogRepo;
pub use chat::ChatRepo;
pub use inventory::InventoryRepo;
pub use totals::TotalsRepo;
