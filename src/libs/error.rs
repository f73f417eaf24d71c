use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntenyError {
    /// Invalid parameters, detected before any input is read
    Config(String),
    /// A record that could not be parsed
    Parse {
        /// The file being read
        path: String,
        /// The line number (1-based)
        line: usize,
        /// A human-readable message explaining the error
        message: String,
    },
    /// An input file without a single data record
    EmptyInput(String),
}

impl SyntenyError {
    pub fn parse(path: &str, line: usize, message: impl Into<String>) -> Self {
        SyntenyError::Parse {
            path: path.to_string(),
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntenyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntenyError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            SyntenyError::Parse {
                path,
                line,
                message,
            } => write!(f, "Parse error in {} at line {}: {}", path, line, message),
            SyntenyError::EmptyInput(path) => write!(f, "No records found in {}", path),
        }
    }
}

impl std::error::Error for SyntenyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SyntenyError::parse("a.cscore", 3, "expected 4 fields");
        assert_eq!(
            err.to_string(),
            "Parse error in a.cscore at line 3: expected 4 fields"
        );

        let err = SyntenyError::Config("2 species but 3 quotas".to_string());
        assert!(err.to_string().contains("2 species but 3 quotas"));
    }
}
