use std::fmt;

/// Classification of a policy-resolution failure.
///
/// - `Permerror` – permanent rejection: malformed or ambiguous policy,
///   exceeded lookup ceilings, invalid caller input. Retrying cannot help.
/// - `Unknown` – unclassified: transport failures and void DNS results.
///   Possibly transient; the caller decides whether to run a fresh
///   top-level evaluation. The core never retries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Permerror,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Permerror => f.write_str("permerror"),
            ErrorKind::Unknown => f.write_str("unknown"),
        }
    }
}

/// Failure raised anywhere in the resolution pipeline.
///
/// Callers may rely on `kind` and `message`; the chained `cause` is for
/// diagnostics only and its shape is not part of the contract.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct PolicyError {
    message: String,
    kind: ErrorKind,
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl PolicyError {
    pub fn permerror(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::Permerror,
            cause: None,
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::Unknown,
            cause: None,
        }
    }

    /// Chains an underlying error without altering the kind.
    pub fn with_cause(
        mut self,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
