//! Export orchestration: the top-level entry points of the library.
//!
//! [`Exporter`] wires the collaborators together — region registry,
//! rasteriser backend, preference store, notifier, optional usage ledger —
//! and runs the pipeline:
//!
//! 1. acquire the busy guard (at most one export in flight, no queueing)
//! 2. merge persisted defaults with per-call overrides and validate
//! 3. clone the target region, sized to the page content width
//! 4. rasterise the clone at the quality scale (`spawn_blocking`)
//! 5. partition the raster into page bands
//! 6. assemble the PDF and write it atomically (temp file + rename)
//!
//! The clone's registry entry and the busy guard are both owned by scoped
//! guards inside the orchestration function, so cleanup completes before
//! the result reaches the caller on every path, errors included.

use crate::analytics::VisitorLedger;
use crate::config::{ExportSettings, Orientation, PageSize, Quality, SettingsOverride};
use crate::error::ExportError;
use crate::notify::{LogNotifier, Notifier};
use crate::output::{ExportReport, ExportResult};
use crate::pipeline::{build_pdf, paginate, BitmapRasterizer, Rasterizer};
use crate::prefs::PreferenceStore;
use crate::region::{RegionContent, RegionRegistry};
use crate::storage::{KvStore, MemoryStore};
use crate::templates::{
    render_attendance_sheet, render_certificate, AttendanceSheetData, CertificateData,
    CertificateLayout,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One item of a batch export.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub region_id: String,
    /// Defaults to `document_<n>.pdf` when absent.
    pub filename: Option<String>,
}

/// The export orchestrator. Build one with [`Exporter::builder`].
pub struct Exporter {
    registry: RegionRegistry,
    rasterizer: Arc<dyn Rasterizer>,
    prefs: PreferenceStore,
    notifier: Arc<dyn Notifier>,
    ledger: Option<Arc<VisitorLedger>>,
    output_dir: PathBuf,
    in_flight: AtomicBool,
}

/// Builder for [`Exporter`]. Every collaborator has a working default:
/// in-memory preferences, the bitmap rasteriser, log notifications, no
/// ledger, output into the current directory.
pub struct ExporterBuilder {
    registry: RegionRegistry,
    rasterizer: Arc<dyn Rasterizer>,
    store: Arc<dyn KvStore>,
    notifier: Arc<dyn Notifier>,
    ledger: Option<Arc<VisitorLedger>>,
    output_dir: PathBuf,
}

impl Default for ExporterBuilder {
    fn default() -> Self {
        Self {
            registry: RegionRegistry::new(),
            rasterizer: Arc::new(BitmapRasterizer),
            store: Arc::new(MemoryStore::new()),
            notifier: Arc::new(LogNotifier),
            ledger: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl ExporterBuilder {
    pub fn registry(mut self, registry: RegionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.store = store;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn ledger(mut self, ledger: Arc<VisitorLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn build(self) -> Exporter {
        Exporter {
            registry: self.registry,
            rasterizer: self.rasterizer,
            prefs: PreferenceStore::new(self.store),
            notifier: self.notifier,
            ledger: self.ledger,
            output_dir: self.output_dir,
            in_flight: AtomicBool::new(false),
        }
    }
}

impl Exporter {
    pub fn builder() -> ExporterBuilder {
        ExporterBuilder::default()
    }

    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    /// The persisted default settings.
    pub fn settings(&self) -> ExportSettings {
        self.prefs.load_defaults()
    }

    /// Persist a new default quality.
    pub fn set_quality(&self, quality: Quality) {
        let mut settings = self.prefs.load_defaults();
        settings.quality = quality;
        self.prefs.save(&settings);
        self.notifier
            .notify_success(&format!("PDF quality set to {}", quality.as_str()));
    }

    /// Persist a new default orientation.
    pub fn set_orientation(&self, orientation: Orientation) {
        let mut settings = self.prefs.load_defaults();
        settings.orientation = orientation;
        self.prefs.save(&settings);
        self.notifier
            .notify_success(&format!("Page orientation set to {}", orientation.as_str()));
    }

    /// Persist a new default page size.
    pub fn set_page_size(&self, page_size: PageSize) {
        let mut settings = self.prefs.load_defaults();
        settings.page_size = page_size;
        self.prefs.save(&settings);
        self.notifier
            .notify_success(&format!("Page size set to {}", page_size.as_str()));
    }

    /// Export a registered region to a PDF file.
    pub async fn export_region(
        &self,
        region_id: &str,
        filename: &str,
        overrides: Option<SettingsOverride>,
    ) -> Result<ExportReport, ExportError> {
        self.export_with_kind(region_id, filename, overrides, "pdf")
            .await
    }

    /// Export markup directly: registers a temporary region, exports it,
    /// and always deregisters it again.
    pub async fn export_html(
        &self,
        markup: &str,
        filename: &str,
        overrides: Option<SettingsOverride>,
    ) -> Result<ExportReport, ExportError> {
        self.export_markup_with_kind(markup, filename, overrides, "pdf")
            .await
    }

    /// Render a certificate layout and export it.
    pub async fn export_certificate(
        &self,
        layout: CertificateLayout,
        data: &CertificateData,
        filename: &str,
        overrides: Option<SettingsOverride>,
    ) -> Result<ExportReport, ExportError> {
        let markup = render_certificate(layout, data);
        self.export_markup_with_kind(&markup, filename, overrides, "certificate")
            .await
    }

    /// Render the attendance sheet and export it.
    pub async fn export_attendance_sheet(
        &self,
        data: &AttendanceSheetData,
        filename: &str,
        overrides: Option<SettingsOverride>,
    ) -> Result<ExportReport, ExportError> {
        let markup = render_attendance_sheet(data);
        self.export_markup_with_kind(&markup, filename, overrides, "attendance-sheet")
            .await
    }

    /// Export several regions sequentially, one result per job.
    ///
    /// Failures never abort the batch; each is folded into its
    /// [`ExportResult`].
    pub async fn export_batch(&self, jobs: &[ExportJob]) -> Vec<ExportResult> {
        let mut results = Vec::with_capacity(jobs.len());
        for (i, job) in jobs.iter().enumerate() {
            let filename = job
                .filename
                .clone()
                .unwrap_or_else(|| format!("document_{}.pdf", i + 1));
            match self.export_region(&job.region_id, &filename, None).await {
                Ok(_) => results.push(ExportResult::ok(filename)),
                Err(e) => results.push(ExportResult::failed(filename, e.to_string())),
            }
        }
        results
    }

    /// Blocking wrapper around [`Exporter::export_region`] for callers
    /// without an async runtime.
    pub fn export_region_sync(
        &self,
        region_id: &str,
        filename: &str,
        overrides: Option<SettingsOverride>,
    ) -> Result<ExportReport, ExportError> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| ExportError::Internal(format!("Failed to create runtime: {e}")))?;
        runtime.block_on(self.export_region(region_id, filename, overrides))
    }

    async fn export_markup_with_kind(
        &self,
        markup: &str,
        filename: &str,
        overrides: Option<SettingsOverride>,
        kind: &str,
    ) -> Result<ExportReport, ExportError> {
        let temp_id = format!("inline-{}", Uuid::new_v4());
        self.registry
            .register(temp_id.as_str(), RegionContent::Markup(markup.to_string()));
        let result = self
            .export_with_kind(&temp_id, filename, overrides, kind)
            .await;
        self.registry.remove(&temp_id);
        result
    }

    async fn export_with_kind(
        &self,
        region_id: &str,
        filename: &str,
        overrides: Option<SettingsOverride>,
        kind: &str,
    ) -> Result<ExportReport, ExportError> {
        // ── Step 1: reject concurrent exports ─────────────────────────────
        let Some(_guard) = ExportGuard::acquire(&self.in_flight) else {
            warn!("Rejecting export of '{}': already generating", region_id);
            self.notifier.notify_error("PDF generation already in progress");
            return Err(ExportError::Busy);
        };

        self.notifier.notify_info("Generating PDF...");
        let result = self.run_export(region_id, filename, overrides).await;

        match &result {
            Ok(report) => {
                self.notifier.notify_success(&format!(
                    "PDF generated: {} ({} page{})",
                    report.filename,
                    report.pages,
                    if report.pages == 1 { "" } else { "s" }
                ));
                if let Some(ledger) = &self.ledger {
                    ledger.record_document(kind);
                    ledger.record_event(
                        "pdf_export",
                        json!({ "filename": report.filename, "pages": report.pages }),
                    );
                }
            }
            Err(e) => {
                self.notifier.notify_error(&e.to_string());
            }
        }
        result
    }

    async fn run_export(
        &self,
        region_id: &str,
        filename: &str,
        overrides: Option<SettingsOverride>,
    ) -> Result<ExportReport, ExportError> {
        let started = Instant::now();

        // ── Step 2: resolve and validate settings ─────────────────────────
        if filename.trim().is_empty() {
            return Err(ExportError::InvalidConfig("filename is empty".into()));
        }
        let mut settings = self.prefs.load_defaults();
        if let Some(overrides) = &overrides {
            settings = settings.merged(overrides);
        }
        settings.validate()?;
        let content_w = settings.content_width_mm();

        // ── Step 3: clone the region, sized to the content width ──────────
        let (clone, _clone_guard) = self
            .registry
            .clone_for_export(region_id, content_w)
            .ok_or_else(|| ExportError::NotFound {
                region_id: region_id.to_string(),
            })?;
        info!(
            "Exporting region '{}' as '{}' ({} {}, quality {})",
            region_id,
            filename,
            settings.page_size.as_str(),
            settings.orientation.as_str(),
            settings.quality.as_str()
        );

        // ── Step 4: rasterise the clone ───────────────────────────────────
        let render_started = Instant::now();
        let raster = {
            let rasterizer = Arc::clone(&self.rasterizer);
            let scale = settings.quality.scale();
            tokio::task::spawn_blocking(move || rasterizer.rasterize(&clone, scale))
                .await
                .map_err(|e| ExportError::Internal(format!("Render task panicked: {e}")))?
                .map_err(|e| ExportError::RenderError {
                    region_id: region_id.to_string(),
                    detail: e.to_string(),
                })?
        };
        if raster.width() == 0 || raster.height() == 0 {
            return Err(ExportError::RenderError {
                region_id: region_id.to_string(),
                detail: "rasteriser produced an empty image".into(),
            });
        }
        let render_duration_ms = render_started.elapsed().as_millis() as u64;
        debug!(
            "Rasterised '{}': {}x{} px in {} ms",
            region_id,
            raster.width(),
            raster.height(),
            render_duration_ms
        );

        // ── Step 5: partition into page bands ─────────────────────────────
        let pagination = paginate(
            raster.width(),
            raster.height(),
            content_w,
            settings.printable_height_mm(),
        )?;
        debug!(
            "Content {:.1} mm over {} page(s)",
            pagination.content_height_mm,
            pagination.page_count()
        );

        // ── Step 6: assemble and write atomically ─────────────────────────
        let (raster_width_px, raster_height_px) = (raster.width(), raster.height());
        let write_started = Instant::now();
        let path = self.output_dir.join(filename);
        let title = filename.trim_end_matches(".pdf").to_string();
        let bytes = {
            let settings = settings.clone();
            let pagination_task = pagination.clone();
            let path = path.clone();
            tokio::task::spawn_blocking(move || {
                build_pdf(&raster, &pagination_task, &settings, &title, &path)
            })
            .await
            .map_err(|e| ExportError::Internal(format!("Write task panicked: {e}")))??
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ExportError::WriteError {
                    path: path.clone(),
                    detail: e.to_string(),
                })?;
        }
        // Atomic write: temp file in the target directory, then rename.
        let tmp_path = path.with_extension("pdf.tmp");
        tokio::fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| ExportError::WriteError {
                path: path.clone(),
                detail: e.to_string(),
            })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| ExportError::WriteError {
                path: path.clone(),
                detail: e.to_string(),
            })?;
        let write_duration_ms = write_started.elapsed().as_millis() as u64;

        let report = ExportReport {
            filename: filename.to_string(),
            path,
            pages: pagination.page_count(),
            content_height_mm: pagination.content_height_mm,
            raster_width_px,
            raster_height_px,
            render_duration_ms,
            write_duration_ms,
            total_duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "Export complete: '{}' ({} pages, {} ms)",
            report.filename, report.pages, report.total_duration_ms
        );
        Ok(report)
        // _clone_guard drops here: the clone is deregistered before the
        // result is returned.
    }
}

/// Scoped ownership of the exporter's busy flag.
///
/// `acquire` flips Idle→Exporting with a compare-exchange; `Drop` restores
/// Idle, so every exit path releases the flag.
struct ExportGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ExportGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let guard = ExportGuard::acquire(&flag).unwrap();
        assert!(ExportGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(ExportGuard::acquire(&flag).is_some());
    }
}
