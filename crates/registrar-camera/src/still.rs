//! Still-image camera backends.
//!
//! [`StillCamera`] serves one fixed image as every frame of its stream. The
//! CLI uses it to feed an existing photo through the capture and crop
//! pipeline; tests use it to drive the capture dialog deterministically.
//! [`UnavailableCamera`] never opens, which exercises the degraded path.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, trace};

use crate::device::{CameraDevice, CameraError, Frame, Result, VideoStream};

#[derive(Debug, Clone)]
enum StillSource {
    File(PathBuf),
    Image(RgbaImage),
    /// A device that opens but never produces a frame.
    Dark,
}

/// A camera whose stream repeats a single still image.
#[derive(Debug, Clone)]
pub struct StillCamera {
    source: StillSource,
    active_streams: Arc<AtomicUsize>,
}

impl StillCamera {
    /// Serve the image stored at `path`. The file is decoded when a stream
    /// is opened.
    #[must_use]
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::with_source(StillSource::File(path.into()))
    }

    /// Serve an in-memory image.
    #[must_use]
    pub fn from_image(image: RgbaImage) -> Self {
        Self::with_source(StillSource::Image(image))
    }

    /// A camera that opens but has not produced a frame yet.
    #[must_use]
    pub fn dark() -> Self {
        Self::with_source(StillSource::Dark)
    }

    fn with_source(source: StillSource) -> Self {
        Self {
            source,
            active_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of streams opened from this camera that have not been stopped.
    #[must_use]
    pub fn active_streams(&self) -> usize {
        self.active_streams.load(Ordering::SeqCst)
    }

    fn load(&self) -> Result<Option<RgbaImage>> {
        match &self.source {
            StillSource::File(path) => {
                if !path.exists() {
                    return Err(CameraError::Unavailable(format!(
                        "no image at {}",
                        path.display()
                    )));
                }
                let image = image::open(path)
                    .map_err(|e| CameraError::Decode(format!("{}: {e}", path.display())))?;
                Ok(Some(image.to_rgba8()))
            }
            StillSource::Image(image) => Ok(Some(image.clone())),
            StillSource::Dark => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl CameraDevice for StillCamera {
    fn name(&self) -> &str {
        match self.source {
            StillSource::File(_) => "still-file",
            StillSource::Image(_) => "still-image",
            StillSource::Dark => "still-dark",
        }
    }

    async fn open_stream(&self) -> Result<Box<dyn VideoStream>> {
        let image = self.load()?;
        self.active_streams.fetch_add(1, Ordering::SeqCst);
        debug!(camera = self.name(), "Opened still stream");
        Ok(Box::new(StillStream {
            image,
            active: true,
            active_streams: Arc::clone(&self.active_streams),
        }))
    }
}

/// Stream handed out by [`StillCamera`].
#[derive(Debug)]
pub struct StillStream {
    image: Option<RgbaImage>,
    active: bool,
    active_streams: Arc<AtomicUsize>,
}

impl VideoStream for StillStream {
    fn latest_frame(&mut self) -> Option<Frame> {
        if !self.active {
            return None;
        }
        self.image.clone().map(Frame::new)
    }

    fn stop(&mut self) {
        if self.active {
            self.active = false;
            self.active_streams.fetch_sub(1, Ordering::SeqCst);
            trace!("Still stream stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for StillStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A camera that can never be opened.
#[derive(Debug, Clone)]
pub struct UnavailableCamera {
    reason: Option<String>,
}

impl UnavailableCamera {
    /// A camera whose access the user refused.
    #[must_use]
    pub fn denied() -> Self {
        Self { reason: None }
    }

    /// A missing camera, with the reason reported to callers.
    #[must_use]
    pub fn missing(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

#[async_trait::async_trait]
impl CameraDevice for UnavailableCamera {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn open_stream(&self) -> Result<Box<dyn VideoStream>> {
        match &self.reason {
            None => Err(CameraError::PermissionDenied),
            Some(reason) => Err(CameraError::Unavailable(reason.clone())),
        }
    }
}
