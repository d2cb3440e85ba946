//! # Modpoll Config
//!
//! TOML configuration for the modpoll service: schema with defaults, a
//! loader with `${VAR}` substitution, and a validator.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
