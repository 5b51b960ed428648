//! Data models for BalanceWatch

mod balance;
mod credential;
mod settings;

pub use balance::*;
pub use credential::*;
pub use settings::*;
