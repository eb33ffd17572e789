//! Camera access for registrar.
//!
//! This crate defines the device/stream abstraction the photo capture dialog
//! is written against, the permission check, and the still-image backends
//! used by the command-line shell.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod device;
pub mod permissions;
pub mod still;

pub use device::{CameraDevice, CameraError, Frame, VideoStream};
pub use permissions::{check_permission, get_permission_instructions, PermissionStatus};
pub use still::{StillCamera, StillStream, UnavailableCamera};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exports() {
        let camera = StillCamera::dark();
        let status = check_permission(&camera).await;
        assert!(status.is_granted);
        assert_eq!(camera.active_streams(), 0);
    }
}
