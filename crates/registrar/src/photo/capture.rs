//! The photo capture dialog.
//!
//! Two working states: `Capturing` shows the live stream until a still is
//! taken, `Cropping` lets the user adjust a crop box over that still. Either
//! crop action emits one encoded photo and closes the dialog; `retake` goes
//! back to the live stream and `dismiss` closes without emitting anything.

use std::fmt;

use image::RgbaImage;
use registrar_camera::{CameraDevice, CameraError, PermissionStatus, VideoStream};
use tracing::{debug, info, warn};

use super::crop::{auto_crop, encode_png, manual_crop, CropSelection};
use super::PhotoSettings;
use crate::error::Result;
use crate::record::Photo;

/// Which screen the dialog is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    /// Live preview, waiting for a still.
    Capturing,
    /// Adjusting the crop box over a still.
    Cropping,
    /// Finished; nothing more will be emitted.
    Closed,
}

/// How the selection becomes the final square photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropMode {
    /// Stretch the selection over the whole output square.
    #[default]
    Auto,
    /// Fit the selection inside the output square, padding with white.
    Manual,
}

impl std::str::FromStr for CropMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown crop mode: {other}")),
        }
    }
}

enum Stage {
    Capturing {
        stream: Option<Box<dyn VideoStream>>,
    },
    Cropping {
        still: RgbaImage,
        selection: CropSelection,
    },
    Closed,
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capturing { stream } => f
                .debug_struct("Capturing")
                .field("has_stream", &stream.is_some())
                .finish(),
            Self::Cropping { still, selection } => f
                .debug_struct("Cropping")
                .field("still", &still.dimensions())
                .field("selection", selection)
                .finish(),
            Self::Closed => f.write_str("Closed"),
        }
    }
}

/// Camera capture and crop dialog.
#[derive(Debug)]
pub struct CaptureDialog<'a> {
    camera: &'a dyn CameraDevice,
    settings: PhotoSettings,
    permission: PermissionStatus,
    camera_error: Option<CameraError>,
    stage: Stage,
}

impl<'a> CaptureDialog<'a> {
    /// Open the dialog and request the camera stream.
    ///
    /// A refused or missing camera does not fail: the dialog opens without a
    /// live preview and [`permission`](Self::permission) says why, so the
    /// caller can warn the user.
    pub async fn open(camera: &'a dyn CameraDevice, settings: PhotoSettings) -> Self {
        let mut dialog = Self {
            camera,
            settings,
            permission: PermissionStatus::granted(),
            camera_error: None,
            stage: Stage::Closed,
        };
        dialog.acquire().await;
        dialog
    }

    async fn acquire(&mut self) {
        let stream = match self.camera.open_stream().await {
            Ok(stream) => {
                self.permission = PermissionStatus::granted();
                self.camera_error = None;
                Some(stream)
            }
            Err(e) => {
                if matches!(e, CameraError::PermissionDenied) {
                    warn!(
                        camera = self.camera.name(),
                        "Camera permission denied; no live preview"
                    );
                    self.permission = PermissionStatus::denied("Camera access was denied");
                } else {
                    warn!(
                        camera = self.camera.name(),
                        error = %e,
                        "Camera unavailable; no live preview"
                    );
                    self.permission = PermissionStatus::denied(e.to_string());
                }
                self.camera_error = Some(e);
                None
            }
        };
        self.stage = Stage::Capturing { stream };
    }

    /// The current screen.
    #[must_use]
    pub fn state(&self) -> DialogState {
        match self.stage {
            Stage::Capturing { .. } => DialogState::Capturing,
            Stage::Cropping { .. } => DialogState::Cropping,
            Stage::Closed => DialogState::Closed,
        }
    }

    /// Outcome of the last stream request.
    #[must_use]
    pub fn permission(&self) -> &PermissionStatus {
        &self.permission
    }

    /// Take the error from the last failed stream request, if any.
    pub fn take_camera_error(&mut self) -> Option<CameraError> {
        self.camera_error.take()
    }

    /// Whether a live preview is showing.
    #[must_use]
    pub fn has_preview(&self) -> bool {
        matches!(&self.stage, Stage::Capturing { stream: Some(s) } if s.is_active())
    }

    /// Snapshot the current frame and switch to cropping.
    ///
    /// Returns `false` and stays put when no frame is available. The live
    /// stream is released once the still is taken.
    pub fn capture_still(&mut self) -> bool {
        let Stage::Capturing {
            stream: Some(stream),
        } = &mut self.stage
        else {
            return false;
        };
        let Some(frame) = stream.latest_frame() else {
            debug!("No camera frame available yet");
            return false;
        };
        stream.stop();

        debug!(
            width = frame.width(),
            height = frame.height(),
            "Captured still frame"
        );
        let selection =
            CropSelection::new(frame.width(), frame.height(), self.settings.min_crop_box);
        self.stage = Stage::Cropping {
            still: frame.image,
            selection,
        };
        true
    }

    /// The still being cropped.
    #[must_use]
    pub fn still(&self) -> Option<&RgbaImage> {
        match &self.stage {
            Stage::Cropping { still, .. } => Some(still),
            _ => None,
        }
    }

    /// The crop box, while cropping.
    pub fn selection_mut(&mut self) -> Option<&mut CropSelection> {
        match &mut self.stage {
            Stage::Cropping { selection, .. } => Some(selection),
            _ => None,
        }
    }

    /// Render the selection over the whole output square, emit it and close.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn auto_crop(&mut self) -> Result<Option<Photo>> {
        self.finish(CropMode::Auto)
    }

    /// Fit the selection inside the output square, emit it and close.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn manual_crop(&mut self) -> Result<Option<Photo>> {
        self.finish(CropMode::Manual)
    }

    /// Crop with the given mode. Outside the cropping screen this does
    /// nothing and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn finish(&mut self, mode: CropMode) -> Result<Option<Photo>> {
        let Stage::Cropping { still, selection } = &self.stage else {
            return Ok(None);
        };
        let size = self.settings.output_size;
        let crop = selection.crop_box();
        let output = match mode {
            CropMode::Auto => auto_crop(still, crop, size),
            CropMode::Manual => manual_crop(still, crop, size),
        };
        let photo = encode_png(&output)?;

        info!(
            mode = ?mode,
            size,
            fingerprint = %photo.fingerprint(),
            "Photo captured"
        );
        self.stage = Stage::Closed;
        Ok(Some(photo))
    }

    /// Drop the still and go back to the live stream.
    pub async fn retake(&mut self) {
        if !matches!(self.stage, Stage::Cropping { .. }) {
            return;
        }
        self.acquire().await;
    }

    /// Close without emitting a photo.
    pub fn dismiss(&mut self) {
        self.release();
        self.stage = Stage::Closed;
    }

    fn release(&mut self) {
        if let Stage::Capturing {
            stream: Some(stream),
        } = &mut self.stage
        {
            stream.stop();
        }
    }
}

impl Drop for CaptureDialog<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::crop::{decode_photo, CropBox};
    use image::Rgba;
    use registrar_camera::{StillCamera, UnavailableCamera};

    fn settings() -> PhotoSettings {
        PhotoSettings {
            output_size: 300,
            min_crop_box: 100,
        }
    }

    fn camera() -> StillCamera {
        StillCamera::from_image(RgbaImage::from_pixel(640, 480, Rgba([10, 120, 200, 255])))
    }

    #[tokio::test]
    async fn test_open_shows_preview() {
        let camera = camera();
        let dialog = CaptureDialog::open(&camera, settings()).await;
        assert_eq!(dialog.state(), DialogState::Capturing);
        assert!(dialog.has_preview());
        assert!(dialog.permission().is_granted);
        assert_eq!(camera.active_streams(), 1);
    }

    #[tokio::test]
    async fn test_capture_releases_stream_and_starts_cropping() {
        let camera = camera();
        let mut dialog = CaptureDialog::open(&camera, settings()).await;

        assert!(dialog.capture_still());
        assert_eq!(dialog.state(), DialogState::Cropping);
        assert_eq!(camera.active_streams(), 0);
        assert_eq!(dialog.still().unwrap().dimensions(), (640, 480));
        assert_eq!(
            dialog.selection_mut().unwrap().crop_box(),
            CropBox::new(80, 0, 480, 480)
        );
    }

    #[tokio::test]
    async fn test_capture_without_frame_is_noop() {
        let camera = StillCamera::dark();
        let mut dialog = CaptureDialog::open(&camera, settings()).await;

        assert!(!dialog.capture_still());
        assert_eq!(dialog.state(), DialogState::Capturing);
        assert_eq!(camera.active_streams(), 1);
    }

    #[tokio::test]
    async fn test_denied_camera_degrades_without_preview() {
        let camera = UnavailableCamera::denied();
        let mut dialog = CaptureDialog::open(&camera, settings()).await;

        assert_eq!(dialog.state(), DialogState::Capturing);
        assert!(!dialog.has_preview());
        assert!(!dialog.permission().is_granted);
        assert!(!dialog.capture_still());
    }

    #[tokio::test]
    async fn test_crop_before_capture_is_noop() {
        let camera = camera();
        let mut dialog = CaptureDialog::open(&camera, settings()).await;

        assert!(dialog.auto_crop().unwrap().is_none());
        assert!(dialog.manual_crop().unwrap().is_none());
        assert!(dialog.selection_mut().is_none());
        assert_eq!(dialog.state(), DialogState::Capturing);
    }

    #[tokio::test]
    async fn test_auto_crop_emits_square_photo_and_closes() {
        let camera = camera();
        let mut dialog = CaptureDialog::open(&camera, settings()).await;
        dialog.capture_still();

        let photo = dialog.auto_crop().unwrap().unwrap();
        assert_eq!(dialog.state(), DialogState::Closed);
        assert_eq!(decode_photo(&photo).unwrap().dimensions(), (300, 300));

        // Closed dialogs emit nothing further.
        assert!(dialog.auto_crop().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_manual_crop_of_adjusted_selection() {
        let camera = camera();
        let mut dialog = CaptureDialog::open(&camera, settings()).await;
        dialog.capture_still();
        dialog
            .selection_mut()
            .unwrap()
            .set(CropBox::new(0, 0, 400, 200));

        let photo = dialog.manual_crop().unwrap().unwrap();
        let image = decode_photo(&photo).unwrap();
        assert_eq!(image.dimensions(), (300, 300));
        assert_eq!(image.get_pixel(150, 5), &Rgba([255, 255, 255, 255]));
    }

    #[tokio::test]
    async fn test_retake_returns_to_live_stream() {
        let camera = camera();
        let mut dialog = CaptureDialog::open(&camera, settings()).await;
        dialog.capture_still();
        assert_eq!(camera.active_streams(), 0);

        dialog.retake().await;
        assert_eq!(dialog.state(), DialogState::Capturing);
        assert!(dialog.has_preview());
        assert_eq!(camera.active_streams(), 1);
    }

    #[tokio::test]
    async fn test_dismiss_releases_stream() {
        let camera = camera();
        let mut dialog = CaptureDialog::open(&camera, settings()).await;
        dialog.dismiss();

        assert_eq!(dialog.state(), DialogState::Closed);
        assert_eq!(camera.active_streams(), 0);
        assert!(!dialog.capture_still());
    }

    #[tokio::test]
    async fn test_drop_releases_stream() {
        let camera = camera();
        {
            let _dialog = CaptureDialog::open(&camera, settings()).await;
            assert_eq!(camera.active_streams(), 1);
        }
        assert_eq!(camera.active_streams(), 0);
    }

    #[test]
    fn test_crop_mode_parse() {
        assert_eq!("auto".parse::<CropMode>().unwrap(), CropMode::Auto);
        assert_eq!("MANUAL".parse::<CropMode>().unwrap(), CropMode::Manual);
        assert!("free".parse::<CropMode>().is_err());
    }
}
