pub mod admin;
pub mod claim;
pub mod config;
pub mod fulfill;
pub mod open;
pub mod vault;
pub mod views;

pub use claim::{Destination, Settlement};
pub use views::{CooldownStatus, LastRewardInfo};
