//! # certpress
//!
//! Paginated PDF export for training certificates and attendance sheets.
//!
//! A registered document region — certificate markup or a pre-rendered
//! bitmap — is rasterised, sliced into page-sized bands, and written out
//! as a multi-page PDF with optional page-number footers.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐
//! │  region │──▶│ rasterize │──▶│ paginate  │──▶│  write   │
//! │  clone  │   │ (backend) │   │ (bands)   │   │ (printpdf)│
//! └─────────┘   └───────────┘   └───────────┘   └──────────┘
//! ```
//!
//! At most one export runs at a time; a second call fails fast with
//! [`ExportError::Busy`]. The region clone and the busy flag are released
//! on every exit path before the result reaches the caller.
//!
//! ## Quick start
//!
//! ```no_run
//! use certpress::{CertificateData, CertificateLayout, Exporter};
//!
//! # async fn run() -> Result<(), certpress::ExportError> {
//! let exporter = Exporter::builder().output_dir("out").build();
//! let report = exporter
//!     .export_certificate(
//!         CertificateLayout::Safety,
//!         &CertificateData::default(),
//!         "certificate.pdf",
//!         None,
//!     )
//!     .await?;
//! println!("{} pages written to {}", report.pages, report.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! Markup regions need a rasteriser backend that understands markup; the
//! built-in [`BitmapRasterizer`] covers bitmap-backed regions, and custom
//! backends plug in through [`Rasterizer`] on the exporter builder.
//!
//! ## Feature flags
//!
//! * `cli` *(default)* — builds the `certpress` binary (clap, indicatif,
//!   tracing-subscriber).

pub mod analytics;
pub mod config;
pub mod error;
pub mod export;
pub mod notify;
pub mod output;
pub mod pipeline;
pub mod prefs;
pub mod region;
pub mod storage;
pub mod templates;

pub use analytics::{PeriodStats, VisitorLedger, VisitorStats};
pub use config::{
    ExportSettings, ExportSettingsBuilder, Orientation, PageSize, Quality, SettingsOverride,
};
pub use error::{ExportError, RasterizeError};
pub use export::{ExportJob, Exporter, ExporterBuilder};
pub use notify::{LogNotifier, NoopNotifier, Notifier};
pub use output::{ExportReport, ExportResult};
pub use pipeline::{paginate, BitmapRasterizer, PageBand, Pagination, Rasterizer};
pub use prefs::PreferenceStore;
pub use region::{Region, RegionContent, RegionRegistry};
pub use storage::{FileStore, KvStore, MemoryStore};
pub use templates::{
    render_attendance_sheet, render_certificate, AttendanceSheetData, CertificateData,
    CertificateLayout, Participant,
};
