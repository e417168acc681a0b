//! Error types for the certpress library.
//!
//! Two distinct error types reflect two distinct layers:
//!
//! * [`ExportError`] — **Fatal**: the export cannot produce a PDF at all
//!   (unknown region, another export in flight, the rasteriser failed, the
//!   file could not be written). Returned as `Err(ExportError)` from the
//!   top-level `export*` functions.
//!
//! * [`RasterizeError`] — the rasteriser backend's own failure vocabulary.
//!   Backends return it from [`crate::pipeline::Rasterizer::rasterize`]; the
//!   pipeline converts it into [`ExportError::RenderError`] at the boundary,
//!   attaching the region id the backend does not know about.
//!
//! Batch export never propagates `ExportError` per item — each failure is
//! folded into an [`crate::ExportResult`] so the remaining jobs still run.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the certpress library.
#[derive(Debug, Error)]
pub enum ExportError {
    // ── Lookup errors ─────────────────────────────────────────────────────
    /// The requested region id is not present in the registry.
    #[error("Document region '{region_id}' not found.\nRegister it before exporting.")]
    NotFound { region_id: String },

    // ── Concurrency errors ────────────────────────────────────────────────
    /// Another export is already in flight. There is no queueing: retry
    /// after the current export finishes.
    #[error("An export is already in progress. Wait for it to finish and retry.")]
    Busy,

    // ── Render errors ─────────────────────────────────────────────────────
    /// The rasteriser backend failed to produce an image for the region.
    #[error("Failed to render region '{region_id}': {detail}")]
    RenderError { region_id: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// The PDF could not be assembled or saved.
    #[error("Failed to write PDF '{path}': {detail}")]
    WriteError { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Settings validation failed (empty filename, margins that leave no
    /// printable area, …).
    #[error("Invalid export settings: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure vocabulary for [`crate::pipeline::Rasterizer`] backends.
#[derive(Debug, Clone, Error)]
pub enum RasterizeError {
    /// The backend cannot handle this kind of region content.
    #[error("no rasteriser backend for {kind} content")]
    Unsupported { kind: &'static str },

    /// The backend attempted to render and failed.
    #[error("{0}")]
    Failed(String),
}
