//! Output types: the per-export report and the batch result entry.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Summary of one successful export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    /// Filename the PDF was saved under.
    pub filename: String,
    /// Full path of the written file.
    pub path: PathBuf,
    /// Number of PDF pages emitted.
    pub pages: usize,
    /// Measured content height after scaling to the page content width.
    pub content_height_mm: f32,
    /// Raster dimensions produced by the rasteriser.
    pub raster_width_px: u32,
    pub raster_height_px: u32,
    /// Time spent rasterising the region.
    pub render_duration_ms: u64,
    /// Time spent assembling and saving the PDF.
    pub write_duration_ms: u64,
    /// Wall-clock time for the whole export.
    pub total_duration_ms: u64,
}

/// Outcome of a single item in a batch export.
///
/// Batch export never aborts on a failed item; each failure is captured
/// here and the remaining jobs still run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    pub success: bool,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportResult {
    pub fn ok(filename: impl Into<String>) -> Self {
        Self {
            success: true,
            filename: filename.into(),
            error: None,
        }
    }

    pub fn failed(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            filename: filename.into(),
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_result_has_no_error() {
        let r = ExportResult::ok("cert.pdf");
        assert!(r.success);
        assert!(r.error.is_none());
    }

    #[test]
    fn failed_result_serialises_error() {
        let r = ExportResult::failed("cert.pdf", "region missing");
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("region missing"));
    }

    #[test]
    fn ok_result_omits_error_field_in_json() {
        let json = serde_json::to_string(&ExportResult::ok("a.pdf")).unwrap();
        assert!(!json.contains("error"));
    }
}
