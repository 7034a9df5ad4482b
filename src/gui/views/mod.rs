//! View modules for the GUI
//!
//! Each submodule adds rendering methods to `TSenderApp`; they are called
//! from `App::update` in `app.rs`.
//!
//! - `airdrop` - the airdrop form, transaction details and submit button
//! - `settings` - RPC and contract overrides, operation log

pub mod airdrop;
pub mod settings;
