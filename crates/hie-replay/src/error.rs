//! Error types for the replay pipeline.
//!
//! Store failures are fatal for a run. Payload and transport failures are
//! scoped to a single record and surface in the replay summary instead.

/// Errors raised while reading the transaction log.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached (network failure, unreadable file).
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection failure.
        message: String,
    },

    /// The store answered with a non-success HTTP status.
    #[error("Transaction log returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A transaction document could not be decoded.
    #[error("Failed to decode transaction{}: {message}", line_suffix(.line))]
    Decode {
        /// 1-based line number for line-delimited exports.
        line: Option<usize>,
        /// Decoder message.
        message: String,
    },
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

impl StoreError {
    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Decode` error without line information.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            line: None,
            message: message.into(),
        }
    }

    /// Returns `true` if the store was unreachable.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Errors raised while turning a logged request body into a replayable resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The record carries no request body.
    #[error("Transaction has no request body")]
    MissingBody,

    /// The request body is not valid JSON.
    #[error("Request body is not valid JSON: {0}")]
    Parse(String),

    /// The request body is JSON but not an object.
    #[error("Request body is not a JSON object")]
    NotAnObject,

    /// The payload declares a different resource type.
    #[error("Expected a QuestionnaireResponse, found {0}")]
    UnexpectedResourceType(String),

    /// `subject.reference` is missing or not a string.
    #[error("Payload has no subject.reference to derive an id from")]
    MissingSubject,
}

/// Errors raised while submitting a resource to the SHR.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response.
    #[error("Failed to reach {url}: {message}")]
    Connect {
        /// Target URL.
        url: String,
        /// Transport message.
        message: String,
    },

    /// The SHR answered but refused the resource.
    #[error("HTTP {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// OperationOutcome diagnostics or raw body.
        message: String,
    },
}

impl TransportError {
    /// HTTP status of a rejection, if the SHR answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Connect { .. } => None,
        }
    }
}

/// Fatal errors that abort a whole run.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ReplayResult<T> = Result<T, ReplayError>;
