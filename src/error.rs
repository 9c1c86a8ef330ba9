use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Error: {0}")]
    Anyhow(#[from] anyhow::Error),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn audio<S: Into<String>>(msg: S) -> Self {
        Self::Audio(msg.into())
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn operation_failed<S: Into<String>>(msg: S) -> Self {
        Self::OperationFailed(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether the message can be shown to the user verbatim.
    pub fn is_user_facing(&self) -> bool {
        match self {
            Self::Database(_) | Self::Serialization(_) | Self::Anyhow(_) => false,
            Self::Audio(_)
            | Self::InvalidInput(_)
            | Self::Config(_)
            | Self::OperationFailed(_)
            | Self::NotFound(_) => true,
        }
    }

    pub fn to_safe_string(&self) -> String {
        if self.is_user_facing() {
            self.to_string()
        } else {
            match self {
                Self::Database(_) => "Saving alarms failed".to_string(),
                Self::Serialization(_) => "Stored alarm data is unreadable".to_string(),
                _ => "Operation failed".to_string(),
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_string_hides_internal_errors() {
        let err = AppError::Anyhow(anyhow::anyhow!("pool timed out at /var/lib/x.db"));
        assert_eq!(err.to_safe_string(), "Operation failed");

        let err = AppError::invalid_input("alarm time is required");
        assert_eq!(err.to_safe_string(), "Invalid input: alarm time is required");
    }
}
