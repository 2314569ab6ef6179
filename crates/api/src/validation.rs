//! Request-body validation with environment-aware error detail.

use tskr_core::error::CoreError;
use validator::Validate;

use crate::config::AppEnv;
use crate::error::AppError;

/// Message returned for any validation failure in production.
pub const GENERIC_VALIDATION_MESSAGE: &str = "Invalid input";

/// Run `validator` rules on `input`.
///
/// Outside production the error carries field-level detail; in production
/// the detail is logged and the caller sees [`GENERIC_VALIDATION_MESSAGE`].
pub fn validate_request<T: Validate>(input: &T, env: AppEnv) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| validation_error(errors.to_string(), env))
}

/// Build a validation error for a rule checked outside `validator`.
pub fn validation_error(detail: String, env: AppEnv) -> AppError {
    if env.is_production() {
        tracing::debug!(detail = %detail, "Rejected invalid input");
        AppError::Core(CoreError::Validation(GENERIC_VALIDATION_MESSAGE.to_string()))
    } else {
        AppError::Core(CoreError::Validation(detail))
    }
}
