//! Error types for the board engine

use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors that can occur while projecting, resolving or syncing the board
#[derive(Debug, Error)]
pub enum BoardError {
    /// Field-level validation failure, raised locally or by the server (422)
    #[error("validation error on {field}: {message}")]
    Validation { field: String, message: String },

    /// Server rejected the payload as malformed (400)
    #[error("invalid data: {message}")]
    InvalidData { message: String },

    /// Caller may not mutate structure, locally gated or refused by the server (403)
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// Delete blocked by dependents (409)
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Resource missing on the server (404)
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Cultivation area not present on the current board
    #[error("cultivation area not found on board: {id}")]
    AreaNotFound { id: String },

    /// Stage not present on the current board
    #[error("stage not found on board: {id}")]
    StageNotFound { id: String },

    /// Another structural operation is still in flight
    #[error("another board operation is in progress")]
    Busy,

    /// Any other non-success response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network or connection failure
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl BoardError {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create an area-not-found error
    pub fn area_not_found(id: impl ToString) -> Self {
        Self::AreaNotFound { id: id.to_string() }
    }

    /// Create a stage-not-found error
    pub fn stage_not_found(id: impl ToString) -> Self {
        Self::StageNotFound { id: id.to_string() }
    }

    /// Map a non-success HTTP status and its extracted message to an error.
    ///
    /// `details` carries the first field message of a 422 body, if any.
    pub fn from_status(status: u16, message: String, details: Option<(String, String)>) -> Self {
        match status {
            422 => match details {
                Some((field, detail)) => Self::Validation {
                    field,
                    message: detail,
                },
                None => Self::Validation {
                    field: "request".into(),
                    message,
                },
            },
            400 => Self::InvalidData { message },
            403 => Self::PermissionDenied { message },
            404 => Self::NotFound { message },
            409 => Self::Conflict { message },
            _ => Self::Api { status, message },
        }
    }

    /// Check if this error came from the network layer rather than the server
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this error is a defensive board lookup failure
    pub fn is_board_inconsistency(&self) -> bool {
        matches!(self, Self::AreaNotFound { .. } | Self::StageNotFound { .. })
    }
}

impl From<figment::Error> for BoardError {
    fn from(e: figment::Error) -> Self {
        Self::Config(Box::new(e))
    }
}
