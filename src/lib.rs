//! TSender: desktop client for batched ERC20 airdrops through the TSender
//! contract.

pub mod airdrop;
pub mod amounts;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod draft;
pub mod gui;
pub mod ledger_lock;
pub mod operation_log;
pub mod orchestrator;
pub mod user_settings;
pub mod utils;
pub mod wallet;
