//! On-demand decode of still images: downsample to the display cap and
//! rotate upright per EXIF orientation.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use fast_image_resize as fir;
use image::{ImageReader, RgbaImage, imageops};
use tracing::debug;

use crate::error::Error;

/// A decoded, display-ready RGBA8 buffer.
#[derive(Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Narrow decode seam so the engine can be exercised without touching disk.
pub trait DecodeBackend {
    fn decode(&self, path: &Path) -> Result<DecodedImage, Error>;
}

/// Image-crate-backed decoder with a fixed output dimension cap.
#[derive(Debug, Clone)]
pub struct StillImageDecoder {
    max_width: u32,
    max_height: u32,
}

impl StillImageDecoder {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    fn decode_inner(&self, path: &Path) -> anyhow::Result<DecodedImage> {
        let img = ImageReader::open(path)?
            .with_guessed_format()? // sniff based on content/extension
            .decode()?;
        let mut rgba = img.to_rgba8();

        let divisor = sample_divisor(rgba.width(), rgba.height(), self.max_width, self.max_height);
        if divisor > 1 {
            let target_w = (rgba.width() / divisor).max(1);
            let target_h = (rgba.height() / divisor).max(1);
            debug!(divisor, target_w, target_h, path = %path.display(), "downsampling");
            rgba = resize_rgba(&rgba, target_w, target_h)?;
        }

        let orientation = read_orientation(path).unwrap_or(1);
        if orientation != 1 {
            debug!(orientation, path = %path.display(), "applying exif orientation");
            rgba = apply_orientation(rgba, orientation);
        }

        let (width, height) = rgba.dimensions();
        Ok(DecodedImage {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }
}

impl Default for StillImageDecoder {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl DecodeBackend for StillImageDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, Error> {
        self.decode_inner(path).map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Smallest power-of-two divisor that brings both dimensions under the cap.
fn sample_divisor(width: u32, height: u32, max_width: u32, max_height: u32) -> u32 {
    let mut divisor = 1;
    while width / divisor > max_width || height / divisor > max_height {
        divisor *= 2;
    }
    divisor
}

fn resize_rgba(source: &RgbaImage, target_w: u32, target_h: u32) -> anyhow::Result<RgbaImage> {
    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .context("creating source view for downsample")?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .context("downsample failed")?;
    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .context("constructing downsampled RGBA image")
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    field.value.get_uint(0).map(|v| v as u16)
}

// EXIF orientation 1 is upright; 2-8 are mirrored/rotated placements.
fn apply_orientation(img: RgbaImage, orientation: u16) -> RgbaImage {
    match orientation {
        2 => imageops::flip_horizontal(&img),
        3 => imageops::rotate180(&img),
        4 => imageops::flip_vertical(&img),
        5 => imageops::flip_horizontal(&imageops::rotate90(&img)),
        6 => imageops::rotate90(&img),
        7 => imageops::flip_horizontal(&imageops::rotate270(&img)),
        8 => imageops::rotate270(&img),
        _ => img,
    }
}
