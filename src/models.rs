pub mod balance;
pub mod chat;
pub mod inventory;
pub mod item;
pub mod session;
pub mod totals;
pub mod types;
