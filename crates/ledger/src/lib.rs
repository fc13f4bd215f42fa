//! PerkPocket Ledger - Completion lifecycle, daily limits, and local persistence

pub mod completions;
pub mod daily;
pub mod store;

pub use completions::CompletionLedger;
pub use daily::DAILY_LIMIT;
pub use store::Store;
