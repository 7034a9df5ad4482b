//! GUI module for the TSender application
//!
//! Built with egui/eframe.
//!
//! ## Module Structure
//!
//! - `app` - `TSenderApp`, its state types, background job polling and the header
//! - `async_job` - background tasks polled from the GUI thread
//! - `theme` - colors, spacing and styled widgets (`AppTheme`)
//! - `notifications` - footer status messages
//! - `views` - the airdrop form and the settings window
//!
//! ## Usage
//!
//! ```no_run
//! use tsender::config::Config;
//! use tsender::gui;
//!
//! let config = Config::from_env().expect("TSENDER_WALLET must be set");
//! gui::launch(config).expect("Failed to launch GUI");
//! ```

mod app;
pub mod async_job;
pub mod notifications;
pub mod theme;
pub mod views;

pub use app::{launch, TSenderApp};

pub use async_job::AsyncJob;
pub use notifications::{NotificationEntry, NotificationLevel};
pub use theme::{configure_style, AppTheme};
