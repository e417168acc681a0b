//! PDF assembly: turn a raster plus a band plan into document bytes.
//!
//! Each band is cropped out of the raster and embedded as an RGB image on
//! its own page, anchored at the margin origin. printpdf's coordinate
//! system has its origin at the bottom-left corner, so band placement is
//! computed from the page top down. Rasters are flattened to RGB before
//! embedding; the regions this pipeline renders sit on opaque backgrounds,
//! and RGB keeps the embedding path simple.
//!
//! Runs inside `spawn_blocking` — cropping and PDF serialisation are
//! CPU-bound.

use crate::config::ExportSettings;
use crate::error::ExportError;
use crate::pipeline::paginate::Pagination;
use image::DynamicImage;
use printpdf::{BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, Rgb};
use std::path::Path;
use tracing::debug;

/// Footer text size in points.
const FOOTER_SIZE_PT: f32 = 10.0;
/// Footer baseline distance from the bottom edge, in millimetres.
const FOOTER_BASELINE_MM: f32 = 10.0;
/// Footer grey level (0..1).
const FOOTER_GREY: f32 = 0.39;
/// DPI the embedded images are declared at. Combined with the per-band
/// scale factors this maps each crop onto its mm extent exactly.
const PLACEMENT_DPI: f32 = 300.0;
/// Printer's point, in millimetres.
const MM_PER_PT: f32 = 0.3528;

/// Assemble the paginated PDF and return its bytes.
///
/// Page numbers are stamped only on multi-page output, and only when the
/// settings ask for them.
pub fn build_pdf(
    raster: &DynamicImage,
    pagination: &Pagination,
    settings: &ExportSettings,
    title: &str,
    out_path: &Path,
) -> Result<Vec<u8>, ExportError> {
    let page_w = settings.page_width_mm();
    let page_h = settings.page_height_mm();
    let margin = settings.margin_mm;
    let content_w = settings.content_width_mm();

    let write_error = |detail: String| ExportError::WriteError {
        path: out_path.to_path_buf(),
        detail,
    };

    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(page_w), Mm(page_h), "content");

    let stamp_numbers = settings.show_page_numbers && !pagination.is_single_page();
    let font = if stamp_numbers {
        Some(
            doc.add_builtin_font(BuiltinFont::Helvetica)
                .map_err(|e| write_error(format!("failed to load footer font: {e}")))?,
        )
    } else {
        None
    };

    let rgb = raster.to_rgb8();

    for band in &pagination.bands {
        let (page, layer) = if band.index == 1 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(page_w), Mm(page_h), "content")
        };
        let layer = doc.get_page(page).get_layer(layer);

        let crop =
            image::imageops::crop_imm(&rgb, 0, band.src_y, rgb.width(), band.src_height)
                .to_image();
        let embedded = Image::from_dynamic_image(&DynamicImage::ImageRgb8(crop));

        // Stretch the crop to content_w × band.height_mm. At PLACEMENT_DPI
        // a pixel is 25.4/dpi mm, so scale = target_mm · dpi / (px · 25.4).
        let scale_x = content_w * PLACEMENT_DPI / (rgb.width() as f32 * 25.4);
        let scale_y = band.height_mm * PLACEMENT_DPI / (band.src_height as f32 * 25.4);

        embedded.add_to_layer(
            layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(margin)),
                translate_y: Some(Mm(page_h - margin - band.height_mm)),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                dpi: Some(PLACEMENT_DPI),
                ..Default::default()
            },
        );

        if let Some(font) = &font {
            stamp_page_number(&layer, font, band.index, page_w);
        }
        debug!(
            "Placed band {} ({} px rows, {:.1} mm)",
            band.index, band.src_height, band.height_mm
        );
    }

    doc.save_to_bytes().map_err(|e| write_error(e.to_string()))
}

/// Draw a centred grey "Page N" near the bottom edge.
///
/// Helvetica has no metrics at hand, so centring approximates the label
/// width as half an em per glyph.
fn stamp_page_number(
    layer: &printpdf::PdfLayerReference,
    font: &IndirectFontRef,
    page_number: usize,
    page_w: f32,
) {
    let label = format!("Page {page_number}");
    let label_width_mm = label.len() as f32 * FOOTER_SIZE_PT * 0.5 * MM_PER_PT;
    layer.set_fill_color(Color::Rgb(Rgb::new(FOOTER_GREY, FOOTER_GREY, FOOTER_GREY, None)));
    layer.use_text(
        label,
        FOOTER_SIZE_PT,
        Mm((page_w - label_width_mm) / 2.0),
        Mm(FOOTER_BASELINE_MM),
        font,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExportSettings, PageSize, Quality};
    use crate::pipeline::paginate::paginate;
    use image::RgbImage;
    use std::path::PathBuf;

    fn solid_raster(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, image::Rgb([200, 220, 240])))
    }

    fn settings() -> ExportSettings {
        ExportSettings::builder()
            .quality(Quality::Low)
            .page_size(PageSize::A4)
            .build()
            .unwrap()
    }

    #[test]
    fn single_page_pdf_has_magic_and_one_page() {
        let s = settings();
        let raster = solid_raster(850, 850);
        let p = paginate(850, 850, s.content_width_mm(), s.printable_height_mm()).unwrap();
        assert!(p.is_single_page());

        let bytes = build_pdf(&raster, &p, &s, "cert", &PathBuf::from("cert.pdf")).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(count_occurrences(&bytes, b"/Type /Page") >= 1);
    }

    #[test]
    fn multi_page_pdf_emits_one_page_per_band() {
        let s = settings();
        // 170 mm wide at 5 px/mm; 4000 px tall -> 800 mm -> 4 pages of 257 mm
        let raster = solid_raster(850, 4000);
        let p = paginate(850, 4000, s.content_width_mm(), s.printable_height_mm()).unwrap();
        assert_eq!(p.page_count(), 4);

        let bytes = build_pdf(&raster, &p, &s, "cert", &PathBuf::from("cert.pdf")).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        // the page tree's /Kids holds one entry per band
        let pages = count_occurrences(&bytes, b"/Type /Page")
            - count_occurrences(&bytes, b"/Type /Pages");
        assert_eq!(pages, 4);
    }

    fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
        haystack
            .windows(needle.len())
            .filter(|w| *w == needle)
            .count()
    }
}
