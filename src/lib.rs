pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::api::{create_router, AppState};
pub use crate::config::{ServeArgs, ServiceConfig};
pub use crate::core::identify::IdentifyService;
pub use crate::core::worker_pool::{PoolSettings, ResolutionPool};
pub use crate::utils::error::{IdentifyError, Result};
