mod artifacts;
mod backend;
pub mod config;
mod context;
mod crewdeck;
pub mod discovery;
mod monitor;
mod plugin;
mod run_state;
mod session;
mod signal;
mod types;
mod uploads;
mod validation;

pub use crate::crewdeck::*;
pub use artifacts::*;
pub use backend::*;
pub use config::{CoordinatorConfig, CoordinatorConfigBuilder, UserCoordinatorConfig};
pub use context::*;
pub use discovery::{DiscoveryPoller, McpToolDefinitions};
pub use monitor::*;
pub use plugin::*;
pub use run_state::*;
pub use session::*;
pub use signal::*;
pub use types::*;
pub use uploads::*;
pub use validation::*;

pub use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Error>;
