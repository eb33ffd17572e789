//! Error types for registrar.
//!
//! The variants follow what the user sees: field errors shown inline, a
//! missing photo, failures reported by the remote store, and a refused
//! camera. Everything else is plumbing.

use registrar_camera::CameraError;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Message shown when the remote store failed without saying why.
pub const GENERIC_REMOTE_MESSAGE: &str = "The remote store could not complete the request";

/// The main error type for registrar operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Submission Errors ===
    /// One or more fields failed validation.
    #[error("validation failed:\n{0}")]
    Validation(ValidationErrors),

    /// A record was submitted without a photo.
    #[error("photo is required")]
    MissingPhoto,

    // === Remote Store Errors ===
    /// The remote store rejected the request or could not be reached.
    #[error("remote store error: {message}")]
    Remote {
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Best available description of the failure.
        message: String,
    },

    // === Camera Errors ===
    /// Camera access was refused.
    #[error("camera permission denied")]
    PermissionDenied,

    /// The camera failed for a reason other than permission.
    #[error("camera error: {0}")]
    Camera(CameraError),

    // === Photo Errors ===
    /// Image processing failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// A stored photo could not be decoded.
    #[error("invalid photo data: {0}")]
    PhotoDecode(String),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for registrar operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<CameraError> for Error {
    fn from(err: CameraError) -> Self {
        match err {
            CameraError::PermissionDenied => Self::PermissionDenied,
            other => Self::Camera(other),
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl Error {
    /// Create a remote error for a non-success response.
    #[must_use]
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Create a remote error from a transport failure.
    #[must_use]
    pub fn transport(err: &reqwest::Error) -> Self {
        Self::Remote {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    /// The text to put in a notification for this error.
    ///
    /// Remote failures show the store's own message, or a generic one when
    /// the store gave none.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Remote { message, .. } if message.trim().is_empty() => {
                GENERIC_REMOTE_MESSAGE.to_string()
            }
            Self::Remote { message, .. } => message.clone(),
            Self::MissingPhoto => "Photo is required".to_string(),
            other => other.to_string(),
        }
    }

    /// Check if this error came from the remote store.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Check if this error is a camera permission issue.
    #[must_use]
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Field;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::MissingPhoto.to_string(), "photo is required");
        assert_eq!(
            Error::PermissionDenied.to_string(),
            "camera permission denied"
        );
        assert_eq!(
            Error::remote(Some(500), "boom").to_string(),
            "remote store error: boom"
        );
    }

    #[test]
    fn test_remote_display_message_uses_store_message() {
        let err = Error::remote(Some(400), "Invalid column apellidoPaterno");
        assert_eq!(err.display_message(), "Invalid column apellidoPaterno");
        assert!(err.is_remote());
    }

    #[test]
    fn test_remote_display_message_falls_back() {
        let err = Error::remote(Some(502), "   ");
        assert_eq!(err.display_message(), GENERIC_REMOTE_MESSAGE);
    }

    #[test]
    fn test_missing_photo_display_message() {
        assert_eq!(Error::MissingPhoto.display_message(), "Photo is required");
    }

    #[test]
    fn test_camera_permission_maps_to_permission_denied() {
        let err: Error = CameraError::PermissionDenied.into();
        assert!(err.is_permission_error());

        let err: Error = CameraError::Unavailable("gone".to_string()).into();
        assert!(matches!(err, Error::Camera(_)));
        assert!(!err.is_permission_error());
    }

    #[test]
    fn test_validation_error_lists_fields() {
        let mut errors = ValidationErrors::default();
        errors.insert(Field::PostalCode, "Postal code must be exactly 5 digits");
        let err: Error = errors.into();
        let msg = err.to_string();
        assert!(msg.contains("address.postal_code"));
        assert!(msg.contains("5 digits"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "page_size must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }
}
