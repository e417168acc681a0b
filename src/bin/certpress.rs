//! CLI binary for certpress.
//!
//! A thin shim over the library crate that maps CLI flags to export
//! settings and prints results.

use anyhow::{Context, Result};
use certpress::{
    render_attendance_sheet, render_certificate, AttendanceSheetData, CertificateData,
    CertificateLayout, Exporter, FileStore, Notifier, Orientation, PageSize, PreferenceStore,
    Quality, RegionContent, RegionRegistry, SettingsOverride, VisitorLedger,
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Spinner notifier using indicatif ─────────────────────────────────────────

/// Terminal notifier: keeps a spinner alive while the pipeline works and
/// prints the terminal success/error notification above it.
struct SpinnerNotifier {
    bar: ProgressBar,
}

impl SpinnerNotifier {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Notifier for SpinnerNotifier {
    fn notify_success(&self, message: &str) {
        self.bar.println(format!("{} {}", green("✔"), message));
    }

    fn notify_error(&self, message: &str) {
        self.bar.println(format!("{} {}", red("✗"), message));
    }

    fn notify_info(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Export a pre-rendered region image as a paginated PDF
  certpress export preview.png -o certificate.pdf

  # Letter paper, draft quality, no page numbers
  certpress export report.png --page-size letter --quality low --no-page-numbers

  # Render a certificate to HTML (rasterise it with your browser or
  # embed a markup rasteriser via the library API)
  certpress certificate --layout safety --recipient "Avery Quinn" -o cert.html

  # Attendance sheet from a participant list
  certpress attendance --from-json participants.json -o sheet.html

  # Persisted defaults
  certpress settings                 # show
  certpress settings --quality low   # change

  # Usage statistics
  certpress stats --days 30 --csv

ENVIRONMENT VARIABLES:
  CERTPRESS_DATA_DIR   Where settings and usage stats are stored
                       (default: .certpress in the working directory)
"#;

/// Paginated PDF export for training certificates and attendance sheets.
#[derive(Parser, Debug)]
#[command(
    name = "certpress",
    version,
    about = "Paginated PDF export for training certificates and attendance sheets",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory for persisted settings and usage stats.
    #[arg(long, global = true, env = "CERTPRESS_DATA_DIR", default_value = ".certpress")]
    data_dir: PathBuf,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CERTPRESS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "CERTPRESS_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a pre-rendered region image as a paginated PDF.
    Export {
        /// Image file holding the rendered region (PNG or JPEG).
        image: PathBuf,

        /// Output PDF filename.
        #[arg(short, long, default_value = "document.pdf")]
        output: String,

        /// Directory the PDF is written into.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Raster quality: low, medium, high.
        #[arg(long, value_enum)]
        quality: Option<QualityArg>,

        /// Page orientation: portrait, landscape.
        #[arg(long, value_enum)]
        orientation: Option<OrientationArg>,

        /// Paper size: a4, letter, legal, a3.
        #[arg(long, value_enum)]
        page_size: Option<PageSizeArg>,

        /// Page margin in millimetres.
        #[arg(long)]
        margin: Option<f32>,

        /// Skip the "Page N" footer on multi-page output.
        #[arg(long)]
        no_page_numbers: bool,

        /// Print the export report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Render a certificate layout to a self-contained HTML file.
    Certificate {
        /// Layout: professional, corporate, elegant, minimal, safety.
        #[arg(long, value_enum, default_value = "professional")]
        layout: LayoutArg,

        /// Recipient name.
        #[arg(long)]
        recipient: Option<String>,

        /// Training title.
        #[arg(long)]
        training: Option<String>,

        /// Issuing organization.
        #[arg(long)]
        organization: Option<String>,

        /// Trainer name.
        #[arg(long)]
        trainer: Option<String>,

        /// Completion date (free text).
        #[arg(long)]
        date: Option<String>,

        /// Read the full certificate data from a JSON file instead.
        #[arg(long, conflicts_with_all = ["recipient", "training", "organization", "trainer", "date"])]
        from_json: Option<PathBuf>,

        /// Output HTML filename.
        #[arg(short, long, default_value = "certificate.html")]
        output: PathBuf,
    },

    /// Render an attendance sheet to a self-contained HTML file.
    Attendance {
        /// Training title.
        #[arg(long)]
        title: Option<String>,

        /// Trainer name.
        #[arg(long)]
        trainer: Option<String>,

        /// Training location.
        #[arg(long)]
        location: Option<String>,

        /// Read the full sheet data (participants included) from a JSON file.
        #[arg(long)]
        from_json: Option<PathBuf>,

        /// Output HTML filename.
        #[arg(short, long, default_value = "attendance_sheet.html")]
        output: PathBuf,
    },

    /// Show or change the persisted export defaults.
    Settings {
        /// New default raster quality.
        #[arg(long, value_enum)]
        quality: Option<QualityArg>,

        /// New default orientation.
        #[arg(long, value_enum)]
        orientation: Option<OrientationArg>,

        /// New default paper size.
        #[arg(long, value_enum)]
        page_size: Option<PageSizeArg>,
    },

    /// Show usage statistics.
    Stats {
        /// Number of trailing days in the summary.
        #[arg(long, default_value_t = 7)]
        days: u32,

        /// Print the full stats document as JSON.
        #[arg(long, conflicts_with = "csv")]
        json: bool,

        /// Print the daily summary as CSV.
        #[arg(long)]
        csv: bool,

        /// Clear all recorded statistics.
        #[arg(long)]
        reset: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum QualityArg {
    Low,
    Medium,
    High,
}

impl From<QualityArg> for Quality {
    fn from(v: QualityArg) -> Self {
        match v {
            QualityArg::Low => Quality::Low,
            QualityArg::Medium => Quality::Medium,
            QualityArg::High => Quality::High,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(v: OrientationArg) -> Self {
        match v {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    A4,
    Letter,
    Legal,
    A3,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::Letter,
            PageSizeArg::Legal => PageSize::Legal,
            PageSizeArg::A3 => PageSize::A3,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LayoutArg {
    Professional,
    Corporate,
    Elegant,
    Minimal,
    Safety,
}

impl From<LayoutArg> for CertificateLayout {
    fn from(v: LayoutArg) -> Self {
        match v {
            LayoutArg::Professional => CertificateLayout::Professional,
            LayoutArg::Corporate => CertificateLayout::Corporate,
            LayoutArg::Elegant => CertificateLayout::Elegant,
            LayoutArg::Minimal => CertificateLayout::Minimal,
            LayoutArg::Safety => CertificateLayout::Safety,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let store = Arc::new(
        FileStore::open(&cli.data_dir)
            .with_context(|| format!("Failed to open data dir {}", cli.data_dir.display()))?,
    );
    let ledger = Arc::new(VisitorLedger::open(store.clone()));
    ledger.record_visit();

    match cli.command {
        Command::Export {
            image,
            output,
            out_dir,
            quality,
            orientation,
            page_size,
            margin,
            no_page_numbers,
            json,
        } => {
            let bitmap = image::open(&image)
                .with_context(|| format!("Failed to read image {}", image.display()))?;

            let registry = RegionRegistry::new();
            registry.register("cli-input", RegionContent::Bitmap(bitmap));

            let spinner = SpinnerNotifier::new();
            let exporter = Exporter::builder()
                .registry(registry)
                .store(store)
                .notifier(spinner.clone())
                .ledger(ledger)
                .output_dir(out_dir)
                .build();

            let overrides = SettingsOverride {
                quality: quality.map(Into::into),
                orientation: orientation.map(Into::into),
                page_size: page_size.map(Into::into),
                margin_mm: margin,
                show_page_numbers: if no_page_numbers { Some(false) } else { None },
            };

            let result = exporter
                .export_region("cli-input", &output, Some(overrides))
                .await;
            spinner.finish();
            let report = result.context("Export failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if !cli.quiet {
                eprintln!(
                    "{}  {} page{}  {}ms  →  {}",
                    green("✔"),
                    report.pages,
                    if report.pages == 1 { "" } else { "s" },
                    report.total_duration_ms,
                    bold(&report.path.display().to_string()),
                );
                eprintln!(
                    "   {}",
                    dim(&format!(
                        "{}x{} px raster, {:.0} mm content, render {} ms / write {} ms",
                        report.raster_width_px,
                        report.raster_height_px,
                        report.content_height_mm,
                        report.render_duration_ms,
                        report.write_duration_ms
                    ))
                );
            }
        }

        Command::Certificate {
            layout,
            recipient,
            training,
            organization,
            trainer,
            date,
            from_json,
            output,
        } => {
            let mut data = match from_json {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    serde_json::from_str::<CertificateData>(&raw)
                        .with_context(|| format!("Invalid certificate data in {}", path.display()))?
                }
                None => CertificateData::default(),
            };
            if let Some(v) = recipient {
                data.recipient_name = v;
            }
            if let Some(v) = training {
                data.training_title = v;
            }
            if let Some(v) = organization {
                data.organization = v;
            }
            if let Some(v) = trainer {
                data.trainer_name = v;
            }
            if let Some(v) = date {
                data.completion_date = v;
            }

            let html = render_certificate(layout.into(), &data);
            std::fs::write(&output, wrap_html_document(&html))
                .with_context(|| format!("Failed to write {}", output.display()))?;
            ledger.record_event(
                "template_render",
                serde_json::json!({ "layout": CertificateLayout::from(layout).as_str() }),
            );
            if !cli.quiet {
                eprintln!("{}  {}", green("✔"), bold(&output.display().to_string()));
            }
        }

        Command::Attendance {
            title,
            trainer,
            location,
            from_json,
            output,
        } => {
            let mut data = match from_json {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    serde_json::from_str::<AttendanceSheetData>(&raw)
                        .with_context(|| format!("Invalid attendance data in {}", path.display()))?
                }
                None => AttendanceSheetData::default(),
            };
            if let Some(v) = title {
                data.training_title = v;
            }
            if let Some(v) = trainer {
                data.trainer_name = v;
            }
            if let Some(v) = location {
                data.location = v;
            }

            let html = render_attendance_sheet(&data);
            std::fs::write(&output, wrap_html_document(&html))
                .with_context(|| format!("Failed to write {}", output.display()))?;
            ledger.record_event(
                "template_render",
                serde_json::json!({ "layout": "attendance-sheet" }),
            );
            if !cli.quiet {
                eprintln!("{}  {}", green("✔"), bold(&output.display().to_string()));
            }
        }

        Command::Settings {
            quality,
            orientation,
            page_size,
        } => {
            let prefs = PreferenceStore::new(store);
            let mut settings = prefs.load_defaults();
            let changed = quality.is_some() || orientation.is_some() || page_size.is_some();

            if let Some(q) = quality {
                settings.quality = q.into();
            }
            if let Some(o) = orientation {
                settings.orientation = o.into();
            }
            if let Some(p) = page_size {
                settings.page_size = p.into();
            }
            if changed {
                prefs.save(&settings);
            }

            println!("quality:      {}", settings.quality.as_str());
            println!("orientation:  {}", settings.orientation.as_str());
            println!("page size:    {}", settings.page_size.as_str());
            if changed && !cli.quiet {
                eprintln!("{} settings saved", green("✔"));
            }
        }

        Command::Stats {
            days,
            json,
            csv,
            reset,
        } => {
            if reset {
                ledger.reset();
                if !cli.quiet {
                    eprintln!("{} statistics cleared", green("✔"));
                }
                return Ok(());
            }
            if json {
                println!("{}", ledger.export_json());
            } else if csv {
                print!("{}", ledger.export_csv(days));
            } else {
                let stats = ledger.stats();
                println!("visitors:     {}", stats.total_visitors);
                println!("unique:       {}", stats.unique_visitors);
                println!("page views:   {}", stats.page_views);
                println!("sessions:     {}", stats.sessions);
                println!("documents:    {}", stats.documents_generated);
                println!();
                println!("{}", dim("last days (visits / documents):"));
                for (date, day) in ledger.daily_summary(days) {
                    println!("  {}  {:>4}  {:>4}", date, day.visits, day.documents_generated);
                }
            }
        }
    }

    Ok(())
}

/// Wrap a rendered fragment in a minimal standalone HTML document.
fn wrap_html_document(fragment: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\"/>\n\
         <title>certpress</title>\n</head>\n<body>\n{fragment}\n</body>\n</html>\n"
    )
}
