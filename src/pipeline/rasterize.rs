//! Region rasterisation behind the [`Rasterizer`] seam.
//!
//! Turning markup into pixels needs a layout engine the library does not
//! ship; callers embed one by implementing [`Rasterizer`] and injecting it
//! through the exporter builder. The built-in [`BitmapRasterizer`] covers
//! regions backed by pre-rendered images, scaling them by the quality
//! factor with a Catmull-Rom filter.
//!
//! Backends run inside `spawn_blocking` (see the export orchestrator), so
//! they are free to do CPU-heavy or blocking work directly.

use crate::error::RasterizeError;
use crate::region::{Region, RegionContent};
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// Renders a region to pixels at the given scale factor.
pub trait Rasterizer: Send + Sync {
    /// Produce the raster for `region`, `scale` times its natural size.
    fn rasterize(&self, region: &Region, scale: f32) -> Result<DynamicImage, RasterizeError>;
}

/// Built-in backend for bitmap-backed regions.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitmapRasterizer;

impl Rasterizer for BitmapRasterizer {
    fn rasterize(&self, region: &Region, scale: f32) -> Result<DynamicImage, RasterizeError> {
        let image = match &region.content {
            RegionContent::Bitmap(image) => image,
            RegionContent::Markup(_) => {
                return Err(RasterizeError::Unsupported { kind: "markup" });
            }
        };

        if !(scale.is_finite() && scale > 0.0) {
            return Err(RasterizeError::Failed(format!("invalid scale {scale}")));
        }

        if (scale - 1.0).abs() < f32::EPSILON {
            return Ok(image.clone());
        }

        let w = ((image.width() as f32 * scale).round() as u32).max(1);
        let h = ((image.height() as f32 * scale).round() as u32).max(1);
        debug!(
            "Scaling bitmap region '{}' {}x{} -> {}x{}",
            region.id,
            image.width(),
            image.height(),
            w,
            h
        );
        Ok(image.resize_exact(w, h, FilterType::CatmullRom))
    }
}
