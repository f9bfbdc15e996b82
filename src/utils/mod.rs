pub mod logging;
pub(crate) mod progress_bar_builder;

pub use logging::{init_tracing, LogAroundBar};
