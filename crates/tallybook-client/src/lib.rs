pub mod backup;
pub mod commands;
pub mod config;
pub mod contracts;
pub mod error;
pub mod import;
pub mod logging;
pub mod migrations;
pub mod model;
pub mod setup;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_support;

pub use contracts::envelope::{FailureEnvelope, SuccessEnvelope};
pub use error::{ClientError, ClientResult};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
