//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (override status codes)
//! - Reject empty host keys, backend addresses and override paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Backend URLs are parsed by the registry, not here

use crate::config::schema::{ErrorOverride, ServerConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{context}: override file path is empty")]
    EmptyOverrideFile { context: String },

    #[error("{context}: status code {code} is out of range (100-599)")]
    InvalidStatusCode { context: String, code: u16 },

    #[error("proxy[{index}]: virtual host (URL) is empty")]
    EmptyHost { index: usize },

    #[error("proxy[{index}] ({host}): backend address is empty")]
    EmptyBackend { index: usize, host: String },
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(ref not_found) = config.not_found {
        check_override("NotFound", not_found, &mut errors);
    }
    if let Some(ref internal_error) = config.internal_error {
        check_override("InternalError", internal_error, &mut errors);
    }

    for (index, backend) in config.backends.iter().enumerate() {
        if backend.host.is_empty() {
            errors.push(ValidationError::EmptyHost { index });
        }
        if backend.backend.trim().is_empty() {
            errors.push(ValidationError::EmptyBackend {
                index,
                host: backend.host.clone(),
            });
        }
        if let Some(ref internal_error) = backend.internal_error {
            let context = format!("proxy[{}].InternalError", index);
            check_override(&context, internal_error, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_override(context: &str, over: &ErrorOverride, errors: &mut Vec<ValidationError>) {
    if over.file.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyOverrideFile {
            context: context.to_string(),
        });
    }
    if let Some(code) = over.status_override() {
        if !(100..=599).contains(&code) {
            errors.push(ValidationError::InvalidStatusCode {
                context: context.to_string(),
                code,
            });
        }
    }
}
