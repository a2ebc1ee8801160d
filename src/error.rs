use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "config.default_service", "template[12]")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., the offending block text)
    pub details: Option<String>,
    /// Source of the error (e.g., "template_parser", "openai_completion")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the kernel, its templates and completion backends.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Template error: {message}{}", format_context(.context))]
    Template {
        message: String,
        context: ErrorContext,
    },

    #[error("Function not found: {skill}.{name}")]
    FunctionNotFound { skill: String, name: String },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Remote error: HTTP {status} ({class}): {message}")]
    Remote {
        status: u16,
        class: String,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new template error with structured context
    pub fn template_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Template {
            message: msg.into(),
            context,
        }
    }

    /// Create a new runtime error with structured context
    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    pub fn function_not_found(skill: impl Into<String>, name: impl Into<String>) -> Self {
        Error::FunctionNotFound {
            skill: skill.into(),
            name: name.into(),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. }
            | Error::Template { context, .. }
            | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Error class reported by the completion service, if this is a remote error.
    pub fn remote_class(&self) -> Option<&str> {
        match self {
            Error::Remote { class, .. } => Some(class.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_rendered_in_display() {
        let err = Error::template_with_context(
            "empty block",
            ErrorContext::new()
                .with_field_path("template[4]")
                .with_source("template_parser"),
        );
        assert_eq!(
            err.to_string(),
            "Template error: empty block (field: template[4], source: template_parser)"
        );
        assert!(err.context().is_some());
    }

    #[test]
    fn test_remote_class() {
        let err = Error::Remote {
            status: 401,
            class: "authentication".to_string(),
            message: "Incorrect API key provided".to_string(),
        };
        assert_eq!(err.remote_class(), Some("authentication"));
        assert!(Error::configuration("x").remote_class().is_none());
    }
}
