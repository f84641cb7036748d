use thiserror::Error;

/// Main error type for the AgriOpt system
#[derive(Error, Debug)]
pub enum AgriError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Optimizer error: {0}")]
    Optimizer(#[from] OptimizerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

}

/// Surrogate-model errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Cannot train on an empty corpus")]
    EmptyCorpus,

    #[error("Invalid model configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Model not found: {key}")]
    NotFound { key: String },
}

/// Optimizer-related errors
#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Invalid optimizer configuration: {message}")]
    InvalidConfig { message: String },
}

/// Result type alias for AgriOpt operations
pub type AgriResult<T> = Result<T, AgriError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::AgriError::Validation(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::AgriError::Config(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ModelError::NotFound {
            key: "yield-surrogate".to_string(),
        };

        assert!(error.to_string().contains("Model not found"));
        assert!(error.to_string().contains("yield-surrogate"));
    }

    #[test]
    fn test_error_conversion() {
        let model_error = ModelError::EmptyCorpus;
        let agri_error: AgriError = model_error.into();

        match agri_error {
            AgriError::Model(ModelError::EmptyCorpus) => (),
            _ => panic!("Expected Model error"),
        }
    }

    #[test]
    fn test_macros() {
        let validation_err = validation_error!("price_per_kg must be positive, got {}", -1.0);
        assert!(matches!(validation_err, AgriError::Validation(_)));
        let config_err = config_error!("Missing required field: {}", "iterations");
        assert!(config_err.to_string().contains("iterations"));
    }
}
