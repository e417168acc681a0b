//! End-to-end tests for the export pipeline: registry in, PDF file out.

use certpress::{
    ExportError, ExportJob, Exporter, MemoryStore, Quality, Rasterizer, RasterizeError, Region,
    RegionContent, RegionRegistry, SettingsOverride, VisitorLedger,
};
use image::DynamicImage;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn solid(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([200, 200, 200]),
    ))
}

fn pdf_bytes(path: &std::path::Path) -> Vec<u8> {
    std::fs::read(path).expect("exported PDF should exist")
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_writes_multi_page_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let registry = RegionRegistry::new();
    // 880 px wide on a 176 mm letter content width = 5 px/mm, so 3000 px
    // of height measures 600 mm -> 3 pages of 239 mm printable height.
    registry.register("report", RegionContent::Bitmap(solid(880, 3000)));

    let exporter = Exporter::builder()
        .registry(registry)
        .output_dir(dir.path())
        .build();

    let overrides = SettingsOverride {
        quality: Some(Quality::Low),
        page_size: Some(certpress::PageSize::Letter),
        ..Default::default()
    };
    let report = exporter
        .export_region("report", "report.pdf", Some(overrides))
        .await
        .unwrap();

    assert_eq!(report.pages, 3);
    assert_eq!(report.raster_width_px, 880);
    assert_eq!(report.raster_height_px, 3000);
    assert!((report.content_height_mm - 600.0).abs() < 0.5);

    let bytes = pdf_bytes(&report.path);
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn short_content_stays_on_one_page() {
    let dir = tempfile::tempdir().unwrap();
    let registry = RegionRegistry::new();
    registry.register("card", RegionContent::Bitmap(solid(880, 500)));

    let exporter = Exporter::builder()
        .registry(registry)
        .output_dir(dir.path())
        .build();

    let overrides = SettingsOverride {
        quality: Some(Quality::Low),
        page_size: Some(certpress::PageSize::Letter),
        ..Default::default()
    };
    let report = exporter
        .export_region("card", "card.pdf", Some(overrides))
        .await
        .unwrap();

    assert_eq!(report.pages, 1);
    assert!(report.path.is_file());
}

// ── Failure paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_region_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = Exporter::builder().output_dir(dir.path()).build();

    let err = exporter
        .export_region("nope", "out.pdf", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::NotFound { ref region_id } if region_id.as_str() == "nope"));
}

#[tokio::test]
async fn empty_filename_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let registry = RegionRegistry::new();
    registry.register("card", RegionContent::Bitmap(solid(100, 100)));
    let exporter = Exporter::builder()
        .registry(registry)
        .output_dir(dir.path())
        .build();

    let err = exporter.export_region("card", "  ", None).await.unwrap_err();
    assert!(matches!(err, ExportError::InvalidConfig(_)));
}

struct FailingRasterizer;

impl Rasterizer for FailingRasterizer {
    fn rasterize(&self, _region: &Region, _scale: f32) -> Result<DynamicImage, RasterizeError> {
        Err(RasterizeError::Failed("backend crashed".into()))
    }
}

#[tokio::test]
async fn render_failure_cleans_up_clone_and_busy_flag() {
    let dir = tempfile::tempdir().unwrap();
    let registry = RegionRegistry::new();
    registry.register("card", RegionContent::Bitmap(solid(100, 100)));

    let exporter = Exporter::builder()
        .registry(registry.clone())
        .rasterizer(Arc::new(FailingRasterizer))
        .output_dir(dir.path())
        .build();

    let err = exporter
        .export_region("card", "card.pdf", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::RenderError { .. }));

    // the export clone is gone again
    assert_eq!(registry.len(), 1);

    // and the busy flag was released: the next call fails the same way,
    // not with Busy
    let err = exporter
        .export_region("card", "card.pdf", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::RenderError { .. }));
}

#[tokio::test]
async fn markup_without_backend_fails_and_deregisters_temp_region() {
    let dir = tempfile::tempdir().unwrap();
    let registry = RegionRegistry::new();
    let exporter = Exporter::builder()
        .registry(registry.clone())
        .output_dir(dir.path())
        .build();

    // the default rasteriser only understands bitmaps
    let err = exporter
        .export_html("<div>hello</div>", "page.pdf", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::RenderError { .. }));
    assert!(registry.is_empty());
}

// ── Concurrency ──────────────────────────────────────────────────────────────

/// Signals when rasterisation starts, then waits for the gate before
/// delegating to the real bitmap rasteriser.
struct GatedRasterizer {
    started: mpsc::Sender<()>,
    gate: Mutex<mpsc::Receiver<()>>,
}

impl Rasterizer for GatedRasterizer {
    fn rasterize(&self, region: &Region, _scale: f32) -> Result<DynamicImage, RasterizeError> {
        let _ = self.started.send(());
        if let Ok(gate) = self.gate.lock() {
            let _ = gate.recv_timeout(Duration::from_secs(5));
        }
        certpress::BitmapRasterizer.rasterize(region, 1.0)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn second_export_is_rejected_while_one_is_in_flight() {
    let dir = tempfile::tempdir().unwrap();
    let (started_tx, started_rx) = mpsc::channel();
    let (gate_tx, gate_rx) = mpsc::channel();

    let registry = RegionRegistry::new();
    registry.register("card", RegionContent::Bitmap(solid(880, 500)));

    let exporter = Arc::new(
        Exporter::builder()
            .registry(registry)
            .rasterizer(Arc::new(GatedRasterizer {
                started: started_tx,
                gate: Mutex::new(gate_rx),
            }))
            .output_dir(dir.path())
            .build(),
    );

    let first = {
        let exporter = Arc::clone(&exporter);
        tokio::spawn(async move { exporter.export_region("card", "first.pdf", None).await })
    };

    // wait until the first export is inside the rasteriser
    tokio::task::spawn_blocking(move || started_rx.recv_timeout(Duration::from_secs(5)))
        .await
        .unwrap()
        .unwrap();

    let err = exporter
        .export_region("card", "second.pdf", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Busy));

    gate_tx.send(()).unwrap();
    let report = first.await.unwrap().unwrap();
    assert_eq!(report.filename, "first.pdf");

    // flag released: a third export goes through
    drop(gate_tx);
    exporter
        .export_region("card", "third.pdf", None)
        .await
        .unwrap();
}

// ── Batch ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_continues_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let registry = RegionRegistry::new();
    registry.register("card", RegionContent::Bitmap(solid(880, 500)));

    let exporter = Exporter::builder()
        .registry(registry)
        .output_dir(dir.path())
        .build();

    let jobs = vec![
        ExportJob {
            region_id: "card".into(),
            filename: Some("ok.pdf".into()),
        },
        ExportJob {
            region_id: "missing".into(),
            filename: None,
        },
        ExportJob {
            region_id: "card".into(),
            filename: None,
        },
    ];
    let results = exporter.export_batch(&jobs).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].success);
    assert_eq!(results[0].filename, "ok.pdf");
    assert!(!results[1].success);
    assert_eq!(results[1].filename, "document_2.pdf");
    assert!(results[1].error.is_some());
    assert!(results[2].success);
    assert_eq!(results[2].filename, "document_3.pdf");
    assert!(dir.path().join("document_3.pdf").is_file());
}

// ── Settings persistence ─────────────────────────────────────────────────────

#[tokio::test]
async fn quality_setting_survives_across_exporters() {
    let store = Arc::new(MemoryStore::new());

    let first = Exporter::builder().store(store.clone()).build();
    first.set_quality(Quality::Low);

    let second = Exporter::builder().store(store).build();
    assert_eq!(second.settings().quality, Quality::Low);
}

// ── Usage ledger ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn successful_export_is_counted_in_the_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let ledger = Arc::new(VisitorLedger::open(store.clone()));

    let registry = RegionRegistry::new();
    registry.register("card", RegionContent::Bitmap(solid(880, 500)));

    let exporter = Exporter::builder()
        .registry(registry)
        .store(store)
        .ledger(ledger.clone())
        .output_dir(dir.path())
        .build();

    exporter
        .export_region("card", "card.pdf", None)
        .await
        .unwrap();

    let stats = ledger.stats();
    assert_eq!(stats.documents_generated, 1);
    assert_eq!(stats.document_history.len(), 1);
    assert_eq!(stats.document_history[0].kind, "pdf");
    assert!(stats.events.iter().any(|e| e.name == "pdf_export"));
}

#[tokio::test]
async fn failed_export_is_not_counted() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let ledger = Arc::new(VisitorLedger::open(store.clone()));

    let exporter = Exporter::builder()
        .store(store)
        .ledger(ledger.clone())
        .output_dir(dir.path())
        .build();

    let _ = exporter
        .export_region("missing", "card.pdf", None)
        .await
        .unwrap_err();
    assert_eq!(ledger.stats().documents_generated, 0);
}

// ── Sync wrapper ─────────────────────────────────────────────────────────────

#[test]
fn sync_wrapper_exports_without_a_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let registry = RegionRegistry::new();
    registry.register("card", RegionContent::Bitmap(solid(880, 500)));

    let exporter = Exporter::builder()
        .registry(registry)
        .output_dir(dir.path())
        .build();

    let report = exporter
        .export_region_sync("card", "card.pdf", None)
        .unwrap();
    assert_eq!(report.pages, 1);
    assert!(report.path.is_file());
}
