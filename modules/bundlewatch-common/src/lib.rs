pub mod cancel;
pub mod config;
pub mod error;
pub mod types;

pub use cancel::CancelFlag;
pub use config::Config;
pub use error::ScoutError;
pub use types::*;
