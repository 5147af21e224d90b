//! The shared error type of the Q-structure workspace.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QvizError {
    // === Configuration Errors ===
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // === Input-Consistency Errors ===
    #[error("Inconsistent relation: {message}")]
    InconsistentRelation { message: String },

    #[error("Relatum purview '{purview}' is not present in the separated CES")]
    MissingRelatum { purview: String },

    // === Collaborator Errors ===
    #[error("Embedding service error: {message}")]
    Embedding {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Render/export error: {message}")]
    Render {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // === I/O Errors ===
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // === Internal Errors ===
    #[error("Internal error: {message} (this is a bug, please report)")]
    Internal { message: String },
}

impl QvizError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn inconsistent_relation<S: Into<String>>(message: S) -> Self {
        Self::InconsistentRelation {
            message: message.into(),
        }
    }

    pub fn missing_relatum<S: Into<String>>(purview: S) -> Self {
        Self::MissingRelatum {
            purview: purview.into(),
        }
    }

    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::Embedding {
            message: message.into(),
            source: None,
        }
    }

    pub fn embedding_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Embedding {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn render<S: Into<String>>(message: S) -> Self {
        Self::Render {
            message: message.into(),
            source: None,
        }
    }

    pub fn render_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Render {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "CONFIG_ERROR",
            Self::InconsistentRelation { .. } => "INCONSISTENT_RELATION",
            Self::MissingRelatum { .. } => "MISSING_RELATUM",
            Self::Embedding { .. } => "EMBEDDING_ERROR",
            Self::Render { .. } => "RENDER_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Serialization { .. } => "SERIALIZATION_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// True when the error indicates malformed input data rather than a
    /// failure in this library or a collaborator.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::InconsistentRelation { .. } | Self::MissingRelatum { .. }
        )
    }
}

impl From<std::io::Error> for QvizError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for QvizError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(QvizError::config("x").code(), "CONFIG_ERROR");
        assert_eq!(
            QvizError::inconsistent_relation("x").code(),
            "INCONSISTENT_RELATION"
        );
        assert_eq!(QvizError::missing_relatum("AB").code(), "MISSING_RELATUM");
        assert_eq!(QvizError::embedding("x").code(), "EMBEDDING_ERROR");
        assert_eq!(QvizError::render("x").code(), "RENDER_ERROR");
        assert_eq!(QvizError::internal("x").code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_data_error_predicate() {
        assert!(QvizError::missing_relatum("AB").is_data_error());
        assert!(QvizError::inconsistent_relation("bad shape").is_data_error());
        assert!(!QvizError::config("x").is_data_error());
    }

    #[test]
    fn test_io_conversion_preserves_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = QvizError::from(io);
        assert_eq!(err.code(), "IO_ERROR");
        assert!(std::error::Error::source(&err).is_some());
    }
}
