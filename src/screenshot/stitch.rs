//! Full-page screenshot stitching
//!
//! The page is photographed one viewport at a time, top to bottom, and the
//! captures are painted onto a single canvas. The browser clamps the last
//! scroll to `page_height - viewport_height`, so the final capture overlaps
//! the previous one; only its bottom `page_height % viewport_height` rows are
//! new and it is painted shifted up by the overlap.

use std::ops::{Deref, DerefMut};

use image::{imageops, RgbaImage};
use log::{debug, info, warn};

use super::{CaptureSurface, CompositeImage, Segment};
use crate::{Error, Result};

/// Capture the whole scrollable page of `surface` as one image
///
/// The scroll position is restored before returning, whether or not the
/// captures succeeded. A failure to restore is reported as
/// [`Error::ScrollRestoreFailed`], carrying the capture error if there was one.
pub fn stitch<S: CaptureSurface + ?Sized>(surface: &mut S) -> Result<CompositeImage> {
    let original = surface.scroll_top()?;
    let page_height = surface.full_height()?;
    let viewport_height = surface.viewport_height()?;
    if viewport_height <= 0 {
        return Err(Error::InvalidSurface(viewport_height));
    }

    let mut guard = ScrollGuard::new(surface, original);
    let captured = capture_segments(&mut *guard, page_height, viewport_height);
    let restored = guard.release();

    let segments = match (captured, restored) {
        (Ok(segments), Ok(())) => segments,
        (Err(e), Ok(())) => return Err(e),
        (Ok(_), Err(r)) => {
            return Err(Error::ScrollRestoreFailed { restore: Box::new(r), cause: None });
        }
        (Err(e), Err(r)) => {
            return Err(Error::ScrollRestoreFailed { restore: Box::new(r), cause: Some(Box::new(e)) });
        }
    };

    let composite = compose(&segments, page_height, viewport_height)?;
    info!(
        "Stitched {} segments into {}x{} (sha256 {})",
        segments.len(),
        composite.width(),
        composite.height(),
        composite.digest()
    );
    Ok(composite)
}

fn capture_segments<S: CaptureSurface + ?Sized>(
    surface: &mut S,
    page_height: i64,
    viewport_height: i64,
) -> Result<Vec<Segment>> {
    let count = page_height.max(0) / viewport_height + 1;
    // `count` is surface-reported, so the up-front allocation is capped.
    let mut segments = Vec::with_capacity(count.min(64) as usize);
    for i in 0..count {
        let offset = i * viewport_height;
        let image = capture_one(surface, offset).map_err(|e| Error::CaptureError {
            offset,
            source: Box::new(e),
        })?;
        debug!("Captured segment {} at offset {} ({}x{})", i, offset, image.width(), image.height());
        segments.push(Segment { offset, image });
    }
    Ok(segments)
}

fn capture_one<S: CaptureSurface + ?Sized>(surface: &mut S, offset: i64) -> Result<RgbaImage> {
    surface.set_scroll_top(offset)?;
    let png = surface.capture_viewport()?;
    Ok(image::load_from_memory(&png)?.to_rgba8())
}

/// Paint captured segments onto one canvas
///
/// `page_height` and `viewport_height` are the logical sizes the segments
/// were captured with; the device pixel ratio is derived from the first
/// segment. A single segment is returned unchanged.
pub fn compose(segments: &[Segment], page_height: i64, viewport_height: i64) -> Result<CompositeImage> {
    if viewport_height <= 0 {
        return Err(Error::InvalidSurface(viewport_height));
    }
    let (first, last) = match (segments.first(), segments.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(Error::EmptyPage),
    };
    if segments.len() == 1 {
        return Ok(CompositeImage::new(first.image.clone()));
    }
    if let Some(pair) = segments.windows(2).find(|pair| pair[1].offset <= pair[0].offset) {
        return Err(Error::Other(format!(
            "segment at offset {} follows offset {}",
            pair[1].offset, pair[0].offset
        )));
    }

    let dpi = first.image.height() as f64 / viewport_height as f64;
    let last_logical = page_height - (page_height / viewport_height) * viewport_height;
    let last_height = last.image.height() as i64;
    let last_pixels = ((last_logical as f64 * dpi).round() as i64).clamp(0, last_height);

    let total: i64 = segments.iter().map(|s| s.image.height() as i64).sum::<i64>() - last_height + last_pixels;
    let total = u32::try_from(total).map_err(|_| Error::Other(format!("composite height {} out of range", total)))?;

    let mut canvas = RgbaImage::new(first.image.width(), total);
    let mut current_top: i64 = 0;
    for (i, segment) in segments.iter().enumerate() {
        let height = segment.image.height() as i64;
        if i == segments.len() - 1 {
            current_top -= height - last_pixels;
        }
        debug!("Painting segment from offset {} at row {}", segment.offset, current_top);
        imageops::overlay(&mut canvas, &segment.image, 0, current_top);
        current_top += height;
    }

    Ok(CompositeImage::new(canvas))
}

/// Scoped ownership of a surface's scroll position
///
/// `release` restores the original position and reports failure; if the
/// guard is dropped without being released (early return, panic) restoration
/// is attempted on a best-effort basis.
struct ScrollGuard<'a, S: CaptureSurface + ?Sized> {
    surface: &'a mut S,
    original: i64,
    released: bool,
}

impl<'a, S: CaptureSurface + ?Sized> ScrollGuard<'a, S> {
    fn new(surface: &'a mut S, original: i64) -> Self {
        Self { surface, original, released: false }
    }

    fn release(mut self) -> Result<()> {
        self.released = true;
        self.surface.set_scroll_top(self.original)
    }
}

impl<S: CaptureSurface + ?Sized> Deref for ScrollGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: CaptureSurface + ?Sized> DerefMut for ScrollGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: CaptureSurface + ?Sized> Drop for ScrollGuard<'_, S> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.surface.set_scroll_top(self.original) {
                warn!("Failed to restore scroll position to {}: {}", self.original, e);
            }
        }
    }
}
