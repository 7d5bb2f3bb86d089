//! Core domain types and logic.

pub mod account;
pub mod error;
pub mod ledger;
pub mod money;
pub mod order;
pub mod portfolio;
pub mod quote;
pub mod settings;
pub mod trading;
