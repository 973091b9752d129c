//! # Errors (Feathers-style)
//!
//! blobway reports every failure to HTTP clients through one structured
//! error type. Core goals:
//! - consistent status codes + class names
//! - can be carried through `anyhow::Error` between layers
//! - transport-agnostic (the axum crate decides how to serialize)
//! - a single redaction point, [`BlobwayError::sanitize_for_client`],
//!   driven by the runtime [`Mode`]
//!
//! If you enable feature `serde`, you also get a `to_json()` helper.

use std::fmt;

use anyhow::Error as AnyError;

use crate::Mode;

/// A convenience result type for blobway core APIs.
pub type BlobwayResult<T> = std::result::Result<T, AnyError>;

/// Error class names + status codes the gateway can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,         // 404
    MethodNotAllowed, // 405
    GeneralError,     // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::GeneralError => 500,
        }
    }

    /// Feathers error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::GeneralError => "GeneralError",
        }
    }

    /// Feathers error `className` (kebab-cased)
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::MethodNotAllowed => "method-not-allowed",
            ErrorKind::GeneralError => "general-error",
        }
    }

    /// Message used when the real one must not leave the process.
    pub fn generic_message(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "Not Found",
            ErrorKind::MethodNotAllowed => "Method Not Allowed",
            ErrorKind::GeneralError => "Internal Server Error",
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

/// A structured blobway error that can live inside `anyhow::Error`.
///
/// Fields:
/// - kind (name, code, class_name)
/// - message
/// - detail: diagnostic lines, only ever populated on the client copy in
///   non-production mode
/// - source (never serialized)
#[derive(Debug)]
pub struct BlobwayError {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: Vec<String>,
    pub source: Option<AnyError>,
}

impl BlobwayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: Vec::new(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Convert into `anyhow::Error`.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to a `BlobwayError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&BlobwayError> {
        err.downcast_ref::<BlobwayError>()
    }

    /// Turn any error into a BlobwayError:
    /// - if it's already a BlobwayError, keep it (lossless)
    /// - otherwise wrap as GeneralError
    pub fn normalize(err: AnyError) -> BlobwayError {
        match err.downcast::<BlobwayError>() {
            Ok(err) => err,
            Err(other) => {
                BlobwayError::new(ErrorKind::GeneralError, other.to_string()).with_source(other)
            }
        }
    }

    /// The copy that is allowed to reach a client.
    ///
    /// The inner `source` is always dropped. In production the message is
    /// replaced by the kind's generic text; elsewhere the source chain is
    /// flattened into `detail` for debugging.
    pub fn sanitize_for_client(&self, mode: Mode) -> BlobwayError {
        if mode.is_production() {
            return BlobwayError::new(self.kind, self.kind.generic_message());
        }

        let mut detail = self.detail.clone();
        if let Some(source) = &self.source {
            detail.extend(source.chain().map(|cause| cause.to_string()));
        }

        BlobwayError {
            kind: self.kind,
            message: self.message.clone(),
            detail,
            source: None,
        }
    }

    // ---- Constructors ----

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
}

impl fmt::Display for BlobwayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for BlobwayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(feature = "serde")]
impl BlobwayError {
    /// Feathers-ish JSON payload.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let mut base = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if !self.detail.is_empty() {
            base["detail"] = json!(self.detail);
        }
        base
    }
}
