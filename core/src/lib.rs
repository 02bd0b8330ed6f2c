pub mod monitor;
pub mod prompt;
pub mod recommend;
mod snapshot;
pub mod threshold;

pub use snapshot::*;

pub static CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
