pub mod analysis;
pub mod ancestry;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod enrich;
pub mod export;
pub mod types;
pub mod utils;
pub mod vendor;

pub use api::{ProgressCallback, ProgressEvent};
