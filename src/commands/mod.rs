pub mod analyze;
pub mod fetch;
pub mod stats;
