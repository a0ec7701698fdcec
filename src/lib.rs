//! Watches a product page and broadcasts a LINE message when a sold out
//! item becomes available again.

pub mod config;
pub mod detect;
pub mod error;
pub mod fetch;
pub mod notify;
pub mod state;
pub mod worker;

pub use config::Config;
pub use error::{Error, Result};
pub use worker::{CheckOutcome, Watcher, should_notify, watch};
