pub mod config;
pub mod error;
pub mod models;
pub mod session;

pub use config::{AppConfig, EmptyNamePolicy, MatchingConfig, MergeConfig, SessionConfig, UploadPolicy};
pub use error::{CoreError, Result};
pub use models::*;
