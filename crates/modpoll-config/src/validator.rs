//! Configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::schema::Config;

/// Backends the service knows how to build.
pub const STORAGE_BACKENDS: [&str; 2] = ["file", "memory"];

const MAX_DEVICE_TIMEOUT_MS: u64 = 30_000;
const MAX_POOL_SIZE: usize = 64;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error into a [`ConfigError`], handing back the
    /// warnings when there is none.
    pub fn into_result(self) -> ConfigResult<Vec<ValidationWarning>> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_device(config, &mut result);
        Self::validate_scheduler(config, &mut result);
        Self::validate_storage(config, &mut result);

        result
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_device(config: &Config, result: &mut ValidationResult) {
        let device = &config.device;
        if device.port == 0 {
            result.add_error(ValidationError::new("device.port", "Port cannot be 0"));
        }

        for (path, value) in [
            ("device.connect_timeout_ms", device.connect_timeout_ms),
            ("device.read_timeout_ms", device.read_timeout_ms),
        ] {
            if value == 0 {
                result.add_error(ValidationError::new(path, "Timeout must be greater than 0"));
            } else if value > MAX_DEVICE_TIMEOUT_MS {
                result.add_warning(ValidationWarning::new(
                    path,
                    format!(
                        "Timeout of {}ms is very high (>{}ms), slow devices will hold pool workers",
                        value, MAX_DEVICE_TIMEOUT_MS
                    ),
                ));
            }
        }
    }

    fn validate_scheduler(config: &Config, result: &mut ValidationResult) {
        if config.scheduler.pool_size == 0 {
            result.add_error(ValidationError::new(
                "scheduler.pool_size",
                "pool_size must be greater than 0",
            ));
        }

        if config.scheduler.pool_size > MAX_POOL_SIZE {
            result.add_warning(ValidationWarning::new(
                "scheduler.pool_size",
                format!("pool_size is very high (>{})", MAX_POOL_SIZE),
            ));
        }
    }

    fn validate_storage(config: &Config, result: &mut ValidationResult) {
        let backend = config.storage.backend.as_str();
        if !STORAGE_BACKENDS.contains(&backend) {
            result.add_error(ValidationError::new(
                "storage.backend",
                format!(
                    "Unknown storage backend '{}', valid values: {:?}",
                    backend, STORAGE_BACKENDS
                ),
            ));
        }

        if backend == "file" && config.storage.path.is_empty() {
            result.add_error(ValidationError::new(
                "storage.path",
                "File backend requires a data directory",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
