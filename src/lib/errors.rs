use std::fmt;

/// Transport-level failure talking to the console API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppError {
    Config(String),
    Network(String),
    Timeout(String),
    Http { status: u16, message: String },
    Parse(String),
    Serialization(String),
}

impl AppError {
    /// True when the server answered with a non-success status.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, AppError::Http { .. })
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(message) => write!(formatter, "Config error: {message}"),
            AppError::Network(message) => write!(formatter, "Network error: {message}"),
            AppError::Timeout(message) => write!(formatter, "Timeout: {message}"),
            AppError::Http { status, message } => {
                write!(formatter, "Request failed ({status}): {message}")
            }
            AppError::Parse(message) => write!(formatter, "Response error: {message}"),
            AppError::Serialization(message) => {
                write!(formatter, "Request error: {message}")
            }
        }
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn display_includes_status_for_http_errors() {
        let err = AppError::Http {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "Request failed (503): maintenance");
        assert!(err.is_rejection());
    }

    #[test]
    fn network_errors_are_not_rejections() {
        let err = AppError::Network("connection refused".to_string());
        assert!(!err.is_rejection());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }
}
