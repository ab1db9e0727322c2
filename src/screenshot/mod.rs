//! Screenshots: full-page stitching and artifact naming

pub mod naming;
pub mod stitch;
pub mod surface;

pub use naming::screenshot_file_name;
pub use stitch::{compose, stitch};
pub use surface::DriverSurface;

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, RgbaImage};
use sha2::{Digest, Sha256};

use crate::Result;

/// Something that can be scrolled vertically and photographed one viewport
/// at a time
///
/// All values are in logical (CSS) pixels; `capture_viewport` returns PNG
/// bytes in device pixels.
pub trait CaptureSurface {
    fn scroll_top(&mut self) -> Result<i64>;
    fn set_scroll_top(&mut self, top: i64) -> Result<()>;
    fn full_height(&mut self) -> Result<i64>;
    fn viewport_height(&mut self) -> Result<i64>;
    fn capture_viewport(&mut self) -> Result<Vec<u8>>;
}

impl<S: CaptureSurface + ?Sized> CaptureSurface for &mut S {
    fn scroll_top(&mut self) -> Result<i64> {
        (**self).scroll_top()
    }

    fn set_scroll_top(&mut self, top: i64) -> Result<()> {
        (**self).set_scroll_top(top)
    }

    fn full_height(&mut self) -> Result<i64> {
        (**self).full_height()
    }

    fn viewport_height(&mut self) -> Result<i64> {
        (**self).viewport_height()
    }

    fn capture_viewport(&mut self) -> Result<Vec<u8>> {
        (**self).capture_viewport()
    }
}

/// One decoded viewport capture and the scroll offset it was requested at
#[derive(Debug, Clone)]
pub struct Segment {
    pub offset: i64,
    pub image: RgbaImage,
}

/// The stitched page
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeImage {
    image: RgbaImage,
}

impl CompositeImage {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Write a PNG file, creating parent directories as needed
    pub fn save_png(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_png()?)?;
        Ok(())
    }

    /// Hex SHA-256 of the raw RGBA pixels (dimensions included)
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width().to_be_bytes());
        hasher.update(self.height().to_be_bytes());
        hasher.update(self.image.as_raw());
        hex::encode(hasher.finalize())
    }
}
