mod catalog;
mod inventory;
mod ledger;
mod sessions;

pub use catalog::{CatalogService, normalize_name, pick_from, resolve_by_name};
pub use inventory::InventoryService;
pub use ledger::LedgerService;
pub use sessions::{ClaimOutcome, ExpireOutcome, SessionManager, WinReceipt};
