use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("{method} rejected: {code}")]
    Rejected {
        method: String,
        code: String,
        emoji: Option<String>,
    },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

impl RelayError {
    pub fn rejected(method: &str, code: &str) -> Self {
        Self::Rejected {
            method: method.to_string(),
            code: code.to_string(),
            emoji: None,
        }
    }

    pub fn rejection_code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_rejection(&self, expected: &str) -> bool {
        self.rejection_code() == Some(expected)
    }

    /// Attaches the Slack emoji name a rejected reaction call was made with.
    pub fn with_emoji(self, name: &str) -> Self {
        match self {
            Self::Rejected { method, code, .. } => Self::Rejected {
                method,
                code,
                emoji: Some(name.to_string()),
            },
            other => other,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
