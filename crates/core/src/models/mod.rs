//! Data models for PerkPocket entities

mod completion;
mod counter;
mod network;
mod offer;
mod report;
mod wire;

pub use completion::*;
pub use counter::*;
pub use network::*;
pub use offer::*;
pub use report::*;
pub use wire::*;
