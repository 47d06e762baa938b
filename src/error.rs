use std::fmt;

use crate::api::endpoint::{ResourceType, Verb};

/// Classification of a failure below the JSON envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    Connect,
    TooManyRedirects,
    Other,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TransportKind::Timeout => "timed out",
            TransportKind::Connect => "connection failed",
            TransportKind::TooManyRedirects => "too many redirects",
            TransportKind::Other => "request failed",
        };
        f.write_str(text)
    }
}

/// Error types for talking to the platform and materializing records
#[derive(Debug)]
pub enum ImportError {
    /// Timeout, connection or redirect failure. Never retried by the gateway.
    Transport {
        url: String,
        kind: TransportKind,
        message: String,
    },

    /// Envelope status 401 persisted past the retry bound
    Unauthorized { url: String, attempts: u32 },

    /// Body was not JSON, or the envelope lacked an expected key
    MalformedResponse { url: String, reason: String },

    /// Any other non-2xx envelope status
    Application {
        url: String,
        status: i64,
        body: String,
    },

    /// No endpoint registered for this (type, verb) pair
    NotConfigured {
        resource_type: ResourceType,
        verb: Verb,
    },

    /// The search index has no type tag for this type
    NotSearchable(ResourceType),

    /// A record offered for cloning has no locatable name
    MissingName { resource_type: ResourceType },

    /// A record is missing a field the importer depends on
    MissingField { context: String, field: String },

    /// A field is present but has the wrong shape
    UnexpectedShape { field: String, expected: &'static str },

    /// Some association types of a built-in rule could not be resolved
    IncompleteAssociations { rule: String, missing: String },

    /// Template rendering failed
    Render(String),

    /// Writing output failed
    Io(String),
}

impl ImportError {
    pub fn missing_field(context: impl Into<String>, field: impl Into<String>) -> Self {
        ImportError::MissingField {
            context: context.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Transport { url, kind, message } => {
                write!(f, "Request to {} {}: {}", url, kind, message)
            }
            ImportError::Unauthorized { url, attempts } => {
                write!(
                    f,
                    "Unauthorized response from {} after {} attempts",
                    url, attempts
                )
            }
            ImportError::MalformedResponse { url, reason } => {
                write!(f, "Malformed response from {}: {}", url, reason)
            }
            ImportError::Application { url, status, body } => {
                write!(f, "Error calling API {} (status {}): {}", url, status, body)
            }
            ImportError::NotConfigured {
                resource_type,
                verb,
            } => {
                write!(f, "No {} endpoint configured for {}", verb, resource_type)
            }
            ImportError::NotSearchable(resource_type) => {
                write!(f, "Search is not supported for {}", resource_type)
            }
            ImportError::MissingName { resource_type } => {
                write!(f, "Couldn't find the name of the {} record", resource_type)
            }
            ImportError::MissingField { context, field } => {
                write!(f, "Missing field '{}' in {}", field, context)
            }
            ImportError::UnexpectedShape { field, expected } => {
                write!(f, "Field '{}' is not {}", field, expected)
            }
            ImportError::IncompleteAssociations { rule, missing } => {
                write!(
                    f,
                    "Could not resolve {} for {}; not cloning from a partial set of associations",
                    missing, rule
                )
            }
            ImportError::Render(msg) => write!(f, "Render error: {}", msg),
            ImportError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<handlebars::RenderError> for ImportError {
    fn from(err: handlebars::RenderError) -> Self {
        ImportError::Render(err.to_string())
    }
}

impl From<anyhow::Error> for ImportError {
    fn from(err: anyhow::Error) -> Self {
        ImportError::Io(format!("{:#}", err))
    }
}

/// Result type for platform and import operations
pub type ImportResult<T> = Result<T, ImportError>;
