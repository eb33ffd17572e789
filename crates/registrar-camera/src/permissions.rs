//! Camera permission checks.
//!
//! There is no way to ask most platforms whether camera access *would* be
//! granted without asking for it, so the check opens a stream and releases
//! it immediately.

use tracing::{debug, warn};

use crate::device::{CameraDevice, CameraError};

/// Outcome of a camera permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionStatus {
    /// Whether a stream could be opened.
    pub is_granted: bool,

    /// Human-readable description of the status.
    pub description: String,
}

impl PermissionStatus {
    /// Create a granted status.
    #[must_use]
    pub fn granted() -> Self {
        Self {
            is_granted: true,
            description: "Camera access is granted".to_string(),
        }
    }

    /// Create a denied status with the reason reported by the device.
    #[must_use]
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            is_granted: false,
            description: reason.into(),
        }
    }
}

/// Check whether `camera` will hand out a stream.
///
/// Any failure counts as "denied"; the stream opened for the check is stopped
/// before returning.
pub async fn check_permission(camera: &dyn CameraDevice) -> PermissionStatus {
    match camera.open_stream().await {
        Ok(mut stream) => {
            stream.stop();
            debug!(camera = camera.name(), "Camera permission granted");
            PermissionStatus::granted()
        }
        Err(CameraError::PermissionDenied) => {
            warn!(camera = camera.name(), "Camera permission denied");
            PermissionStatus::denied("Camera access was denied")
        }
        Err(e) => {
            warn!(camera = camera.name(), error = %e, "Camera not usable");
            PermissionStatus::denied(e.to_string())
        }
    }
}

/// Instructions shown next to a denied-permission warning.
#[must_use]
pub fn get_permission_instructions() -> &'static str {
    r"Photo capture needs access to a camera.

Allow camera access for this application in your system privacy settings,
or pass an existing image with --photo to use it as the captured frame."
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::still::UnavailableCamera;

    #[test]
    fn test_permission_status_granted() {
        let status = PermissionStatus::granted();
        assert!(status.is_granted);
        assert!(!status.description.is_empty());
    }

    #[test]
    fn test_permission_status_denied() {
        let status = PermissionStatus::denied("nope");
        assert!(!status.is_granted);
        assert_eq!(status.description, "nope");
    }

    #[test]
    fn test_get_permission_instructions() {
        assert!(get_permission_instructions().contains("--photo"));
    }

    #[tokio::test]
    async fn test_check_permission_denied() {
        let camera = UnavailableCamera::denied();
        let status = check_permission(&camera).await;
        assert!(!status.is_granted);
        assert!(status.description.contains("denied"));
    }

    #[tokio::test]
    async fn test_check_permission_unavailable() {
        let camera = UnavailableCamera::missing("no video device");
        let status = check_permission(&camera).await;
        assert!(!status.is_granted);
        assert!(status.description.contains("no video device"));
    }
}
