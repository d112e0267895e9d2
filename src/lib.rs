pub mod cli;
pub mod error;
pub mod k8s;
pub mod metrics;
pub mod presence;
pub mod status;
pub mod supervisor;

pub use error::{McwatchError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
