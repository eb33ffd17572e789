//! Crop selection and fixed-size re-encoding of captured stills.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::Photo;

/// Background used wherever the output is not covered by the selection.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A rectangle in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CropBox {
    /// Create a crop box.
    #[must_use]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Width divided by height.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }
}

impl std::str::FromStr for CropBox {
    type Err = String;

    /// Parse `X,Y,W,H`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<u32> = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| format!("invalid crop box {s:?}: {e}"))?;
        match parts.as_slice() {
            [x, y, w, h] => Ok(Self::new(*x, *y, *w, *h)),
            _ => Err(format!("crop box must be X,Y,W,H, got {s:?}")),
        }
    }
}

/// A crop box kept inside the bounds of a still image.
///
/// Starts as the largest centred square. Moving and resizing never let the
/// box leave the image or shrink below the minimum size (which is itself
/// capped at the image size).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropSelection {
    image_width: u32,
    image_height: u32,
    min_width: u32,
    min_height: u32,
    crop: CropBox,
}

impl CropSelection {
    /// Initial selection for an image of the given size.
    #[must_use]
    pub fn new(image_width: u32, image_height: u32, min_size: u32) -> Self {
        let image_width = image_width.max(1);
        let image_height = image_height.max(1);
        let side = image_width.min(image_height);
        Self {
            image_width,
            image_height,
            min_width: min_size.clamp(1, image_width),
            min_height: min_size.clamp(1, image_height),
            crop: CropBox::new(
                (image_width - side) / 2,
                (image_height - side) / 2,
                side,
                side,
            ),
        }
    }

    /// The current crop box.
    #[must_use]
    pub fn crop_box(&self) -> CropBox {
        self.crop
    }

    /// Size of the image being cropped.
    #[must_use]
    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    /// Move the box so its top-left corner is at (`x`, `y`), clamped.
    pub fn move_to(&mut self, x: u32, y: u32) {
        self.crop.x = x.min(self.image_width - self.crop.width);
        self.crop.y = y.min(self.image_height - self.crop.height);
    }

    /// Move the box by a signed offset, clamped.
    pub fn move_by(&mut self, dx: i64, dy: i64) {
        let x = (i64::from(self.crop.x) + dx).max(0);
        let y = (i64::from(self.crop.y) + dy).max(0);
        self.move_to(
            u32::try_from(x).unwrap_or(u32::MAX),
            u32::try_from(y).unwrap_or(u32::MAX),
        );
    }

    /// Resize the box keeping its top-left corner where possible.
    ///
    /// When the new size would run past the image edge the box slides back
    /// inside instead of being cut.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.crop.width = width.clamp(self.min_width, self.image_width);
        self.crop.height = height.clamp(self.min_height, self.image_height);
        self.move_to(self.crop.x, self.crop.y);
    }

    /// Replace the whole box, clamped to the image.
    pub fn set(&mut self, crop: CropBox) {
        self.resize(crop.width, crop.height);
        self.move_to(crop.x, crop.y);
    }
}

fn white_canvas(size: u32) -> RgbaImage {
    RgbaImage::from_pixel(size, size, WHITE)
}

fn region(image: &RgbaImage, crop: CropBox) -> RgbaImage {
    imageops::crop_imm(image, crop.x, crop.y, crop.width.max(1), crop.height.max(1)).to_image()
}

/// Render the selection straight into a `size`x`size` square on white,
/// with high-quality resampling.
#[must_use]
pub fn auto_crop(image: &RgbaImage, crop: CropBox, size: u32) -> RgbaImage {
    let resized = imageops::resize(&region(image, crop), size, size, FilterType::Lanczos3);
    let mut canvas = white_canvas(size);
    imageops::overlay(&mut canvas, &resized, 0, 0);
    canvas
}

/// Fit the selection inside a `size`x`size` white square, preserving its
/// aspect ratio and centring it.
#[must_use]
pub fn manual_crop(image: &RgbaImage, crop: CropBox, size: u32) -> RgbaImage {
    let cropped = region(image, crop);
    let (width, height) = fitted_size(cropped.width(), cropped.height(), size);
    let resized = imageops::resize(&cropped, width, height, FilterType::Triangle);

    let mut canvas = white_canvas(size);
    imageops::overlay(
        &mut canvas,
        &resized,
        i64::from((size - width) / 2),
        i64::from((size - height) / 2),
    );
    canvas
}

/// Scale (`width`, `height`) by `min(size / width, size / height)`.
#[must_use]
pub fn fitted_size(width: u32, height: u32, size: u32) -> (u32, u32) {
    let (w, h) = (f64::from(width.max(1)), f64::from(height.max(1)));
    let ratio = (f64::from(size) / w).min(f64::from(size) / h);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scale = |v: f64| ((v * ratio).round() as u32).clamp(1, size);
    (scale(w), scale(h))
}

/// Encode an image as a PNG photo.
///
/// # Errors
///
/// Returns an error if PNG encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<Photo> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(Photo::from_png_bytes(&bytes))
}

/// Decode a stored photo back into pixels.
///
/// # Errors
///
/// Returns an error if the payload is not valid base64 or not an image.
pub fn decode_photo(photo: &Photo) -> Result<RgbaImage> {
    let bytes = photo.decode()?;
    if bytes.is_empty() {
        return Err(Error::PhotoDecode("empty image".to_string()));
    }
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}
