//! Photo capture and crop.
//!
//! - [`CaptureDialog`] owns the camera stream, takes a still and hands out a
//!   crop selection.
//! - [`crop`] turns a selection into a fixed-size PNG, either stretched over
//!   the whole square ([`CropMode::Auto`]) or fitted inside it with white
//!   padding ([`CropMode::Manual`]).

pub mod capture;
pub mod crop;

use registrar_camera::CameraDevice;
use serde::{Deserialize, Serialize};

pub use capture::{CaptureDialog, CropMode, DialogState};
pub use crop::{auto_crop, decode_photo, encode_png, manual_crop, CropBox, CropSelection};

use crate::error::Result;
use crate::record::Photo;

/// Output size and crop constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoSettings {
    /// Side of the square output image in pixels.
    pub output_size: u32,
    /// Minimum crop box side in source pixels.
    pub min_crop_box: u32,
}

impl Default for PhotoSettings {
    fn default() -> Self {
        Self {
            output_size: 300,
            min_crop_box: 100,
        }
    }
}

/// Run the capture dialog start to finish without interaction: take a still,
/// apply `crop` (or keep the initial square), and crop with `mode`.
///
/// Returns `Ok(None)` when the camera produced no frame.
///
/// # Errors
///
/// Returns [`crate::Error::PermissionDenied`] or [`crate::Error::Camera`] when no stream
/// could be opened, and image errors from encoding.
pub async fn capture_photo(
    camera: &dyn CameraDevice,
    settings: PhotoSettings,
    mode: CropMode,
    crop: Option<CropBox>,
) -> Result<Option<Photo>> {
    let mut dialog = CaptureDialog::open(camera, settings).await;
    if let Some(err) = dialog.take_camera_error() {
        dialog.dismiss();
        return Err(err.into());
    }

    if !dialog.capture_still() {
        dialog.dismiss();
        return Ok(None);
    }
    if let (Some(crop), Some(selection)) = (crop, dialog.selection_mut()) {
        selection.set(crop);
    }
    dialog.finish(mode)
}
