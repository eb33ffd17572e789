//! Camera device and video stream abstractions.
//!
//! A [`CameraDevice`] hands out a [`VideoStream`] once the user has granted
//! access. The stream is a scoped resource: callers stop it as soon as they
//! have the frame they need.

use chrono::{DateTime, Utc};
use image::RgbaImage;
use thiserror::Error;

/// Errors raised while acquiring or reading a camera stream.
#[derive(Debug, Error)]
pub enum CameraError {
    /// The user (or the platform) refused camera access.
    #[error("camera permission denied")]
    PermissionDenied,

    /// No usable camera could be found.
    #[error("camera unavailable: {0}")]
    Unavailable(String),

    /// The source produced data that could not be decoded into a frame.
    #[error("failed to decode frame: {0}")]
    Decode(String),
}

/// Result type for camera operations.
pub type Result<T> = std::result::Result<T, CameraError>;

/// A single still taken from a video stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Pixel data.
    pub image: RgbaImage,

    /// When the frame was taken.
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    /// Wrap an image as a frame captured now.
    #[must_use]
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            captured_at: Utc::now(),
        }
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// A live stream of frames from a camera.
pub trait VideoStream: Send + std::fmt::Debug {
    /// The most recent frame, if the device has produced one yet.
    fn latest_frame(&mut self) -> Option<Frame>;

    /// Release the device. Calling this more than once is harmless.
    fn stop(&mut self);

    /// Whether the stream still holds the device.
    fn is_active(&self) -> bool;
}

/// A camera that can be asked for a video stream.
#[async_trait::async_trait]
pub trait CameraDevice: Send + Sync + std::fmt::Debug {
    /// Human-readable device name, for logs.
    fn name(&self) -> &str;

    /// Request a live stream.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::PermissionDenied`] when access is refused and
    /// [`CameraError::Unavailable`] when no device can serve the request.
    async fn open_stream(&self) -> Result<Box<dyn VideoStream>>;
}
