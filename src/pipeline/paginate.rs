//! Band partitioning: slice a raster into page-sized horizontal bands.
//!
//! All sizing happens in millimetres. The raster is scaled
//! aspect-preserving to the page content width, giving a content height of
//! `raster_h · content_w / raster_w` mm. If that fits the printable height
//! (page height minus both margins) the result is a single band; otherwise
//! the content is cut into full printable-height bands plus a short
//! remainder.
//!
//! Pixel extents come from cumulative rounding of the mm→px map: band *i*
//! covers rows `[round(y_i·s), round(y_{i+1}·s))`. Rounding the running
//! offsets rather than each band's height means the bands partition the
//! raster exactly — every row lands in precisely one band.

use crate::error::ExportError;

/// One horizontal slice of the raster, destined for one PDF page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageBand {
    /// 1-based page index.
    pub index: usize,
    /// First raster row of this band.
    pub src_y: u32,
    /// Number of raster rows in this band (never zero).
    pub src_height: u32,
    /// Height this band occupies on its page, in millimetres.
    pub height_mm: f32,
}

/// The full partition plan for one export.
#[derive(Debug, Clone)]
pub struct Pagination {
    /// Content height after scaling to the page content width.
    pub content_height_mm: f32,
    /// Vertical space available per page.
    pub printable_height_mm: f32,
    /// Top-to-bottom bands; one per page.
    pub bands: Vec<PageBand>,
}

impl Pagination {
    pub fn page_count(&self) -> usize {
        self.bands.len()
    }

    pub fn is_single_page(&self) -> bool {
        self.bands.len() == 1
    }
}

/// Partition a raster into page bands.
///
/// # Errors
/// [`ExportError::InvalidConfig`] when the geometry is degenerate: zero
/// raster dimensions, non-positive content width or printable height, or a
/// printable height that maps to less than one raster row per page.
pub fn paginate(
    raster_w: u32,
    raster_h: u32,
    content_width_mm: f32,
    printable_height_mm: f32,
) -> Result<Pagination, ExportError> {
    if raster_w == 0 || raster_h == 0 {
        return Err(ExportError::InvalidConfig(format!(
            "raster has zero dimension ({raster_w}x{raster_h} px)"
        )));
    }
    if content_width_mm <= 0.0 || printable_height_mm <= 0.0 {
        return Err(ExportError::InvalidConfig(format!(
            "non-positive page area ({content_width_mm} x {printable_height_mm} mm)"
        )));
    }

    // px per mm once the raster is fitted to the content width
    let scale = raster_w as f64 / content_width_mm as f64;
    let printable = printable_height_mm as f64;
    let content_height = raster_h as f64 / scale;

    if printable * scale < 1.0 {
        return Err(ExportError::InvalidConfig(format!(
            "printable height {printable_height_mm} mm maps to less than one raster row"
        )));
    }

    if content_height <= printable {
        return Ok(Pagination {
            content_height_mm: content_height as f32,
            printable_height_mm,
            bands: vec![PageBand {
                index: 1,
                src_y: 0,
                src_height: raster_h,
                height_mm: content_height as f32,
            }],
        });
    }

    let mut bands: Vec<PageBand> = Vec::new();
    let mut offset_mm = 0.0_f64;
    let mut prev_px = 0_u32;
    let mut index = 1;

    while offset_mm < content_height - 1e-9 {
        let band_mm = printable.min(content_height - offset_mm);
        offset_mm += band_mm;
        // The final band always closes on the last raster row.
        let end_px = if offset_mm >= content_height - 1e-9 {
            raster_h
        } else {
            ((offset_mm * scale).round() as u32).min(raster_h)
        };
        // A trailing remainder under half a raster row folds into the
        // previous band rather than becoming an empty page.
        if end_px == prev_px {
            if let Some(last) = bands.last_mut() {
                last.height_mm += band_mm as f32;
            }
            continue;
        }
        bands.push(PageBand {
            index,
            src_y: prev_px,
            src_height: end_px - prev_px,
            height_mm: band_mm as f32,
        });
        prev_px = end_px;
        index += 1;
    }

    Ok(Pagination {
        content_height_mm: content_height as f32,
        printable_height_mm,
        bands,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bands must be contiguous, start at row 0, and end at the last row.
    fn assert_partitions(p: &Pagination, raster_h: u32) {
        let mut expected_y = 0;
        for (i, band) in p.bands.iter().enumerate() {
            assert_eq!(band.index, i + 1, "bands indexed from 1");
            assert_eq!(band.src_y, expected_y, "band {} must be contiguous", i + 1);
            assert!(band.src_height > 0, "band {} is empty", i + 1);
            expected_y += band.src_height;
        }
        assert_eq!(expected_y, raster_h, "bands must cover every raster row");
    }

    #[test]
    fn short_content_is_a_single_full_band() {
        // A4 portrait, margin 20: content 170 mm wide, printable 257 mm.
        // 1000x1200 px -> content height 204 mm, fits one page.
        let p = paginate(1000, 1200, 170.0, 257.0).unwrap();
        assert!(p.is_single_page());
        assert_eq!(p.bands[0].src_y, 0);
        assert_eq!(p.bands[0].src_height, 1200);
        assert!((p.content_height_mm - 204.0).abs() < 0.001);
        assert_partitions(&p, 1200);
    }

    #[test]
    fn page_count_is_ceiling_of_height_ratio() {
        // content height = 5000 * 170 / 800 = 1062.5 mm; ceil(1062.5/257) = 5
        let p = paginate(800, 5000, 170.0, 257.0).unwrap();
        assert_eq!(p.page_count(), 5);
        assert_partitions(&p, 5000);
        // every band but the last spans a full printable page
        for band in &p.bands[..4] {
            assert!((band.height_mm - 257.0).abs() < 0.001);
        }
        assert!(p.bands[4].height_mm < 257.0);
    }

    #[test]
    fn exactly_divisible_content_has_no_phantom_page() {
        // scale = 1000/170; pick raster_h so content height == 2 * 257 mm
        let scale: f64 = 1000.0 / 170.0;
        let raster_h = (2.0 * 257.0 * scale).round() as u32;
        let p = paginate(1000, raster_h, 170.0, 257.0).unwrap();
        assert!(p.page_count() <= 2, "got {} pages", p.page_count());
        assert_partitions(&p, raster_h);
    }

    #[test]
    fn letter_portrait_tall_region() {
        // Letter, margin 20: content 176 mm, printable 239 mm.
        // 880 px wide -> 5 px/mm; 6000 px tall -> 1200 mm -> ceil(1200/239) = 6
        let p = paginate(880, 6000, 176.0, 239.0).unwrap();
        assert_eq!(p.page_count(), 6);
        assert_partitions(&p, 6000);
    }

    #[test]
    fn barely_overflowing_content_gets_two_pages() {
        let scale: f64 = 500.0 / 170.0;
        let raster_h = (257.5 * scale).ceil() as u32;
        let p = paginate(500, raster_h, 170.0, 257.0).unwrap();
        assert_eq!(p.page_count(), 2);
        assert_partitions(&p, raster_h);
        // the trailing band is tiny but never empty
        assert!(p.bands[1].src_height >= 1);
    }

    #[test]
    fn single_row_raster() {
        let p = paginate(100, 1, 170.0, 257.0).unwrap();
        assert!(p.is_single_page());
        assert_eq!(p.bands[0].src_height, 1);
    }

    #[test]
    fn degenerate_geometry_is_rejected() {
        assert!(matches!(
            paginate(0, 100, 170.0, 257.0),
            Err(ExportError::InvalidConfig(_))
        ));
        assert!(matches!(
            paginate(100, 0, 170.0, 257.0),
            Err(ExportError::InvalidConfig(_))
        ));
        assert!(matches!(
            paginate(100, 100, 0.0, 257.0),
            Err(ExportError::InvalidConfig(_))
        ));
        assert!(matches!(
            paginate(100, 100, 170.0, -1.0),
            Err(ExportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn sub_pixel_printable_height_is_rejected() {
        // 10 px over 1000 mm = 0.01 px/mm; 0.05 mm printable < 1 px
        assert!(matches!(
            paginate(10, 100, 1000.0, 0.05),
            Err(ExportError::InvalidConfig(_))
        ));
    }
}
