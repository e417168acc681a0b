//! Export settings: page geometry, quality profile, and the validating builder.
//!
//! Settings are immutable per export call. Defaults come from the persisted
//! preference store ([`crate::prefs::PreferenceStore`]); callers may override
//! individual fields per call through [`SettingsOverride`].

use crate::error::ExportError;
use serde::{Deserialize, Serialize};

/// Rasterisation quality preset.
///
/// Maps to the scale factor applied when rendering a region to pixels —
/// higher quality renders more pixels per millimetre of page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// 1.0× scale — smallest output, fastest.
    Low,
    /// 1.5× scale.
    Medium,
    /// 2.0× scale — crispest output (default).
    #[default]
    High,
}

impl Quality {
    /// The raster scale factor for this preset.
    pub fn scale(self) -> f32 {
        match self {
            Quality::Low => 1.0,
            Quality::Medium => 1.5,
            Quality::High => 2.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
        }
    }
}

/// Page orientation. Landscape swaps the page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Supported paper sizes (portrait dimensions in millimetres).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    A3,
}

impl PageSize {
    /// Portrait `(width_mm, height_mm)` of the paper.
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (216.0, 279.0),
            PageSize::Legal => (216.0, 356.0),
            PageSize::A3 => (297.0, 420.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PageSize::A4 => "a4",
            PageSize::Letter => "letter",
            PageSize::Legal => "legal",
            PageSize::A3 => "a3",
        }
    }
}

/// Default page margin on every edge, in millimetres.
pub const DEFAULT_MARGIN_MM: f32 = 20.0;

/// Complete settings for one export call.
///
/// Construct with [`ExportSettings::builder`] for validation, or take the
/// persisted defaults from a [`crate::prefs::PreferenceStore`] and adjust
/// with [`ExportSettings::merged`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    pub quality: Quality,
    pub orientation: Orientation,
    pub page_size: PageSize,
    /// Margin applied to all four edges, in millimetres.
    pub margin_mm: f32,
    /// Stamp a centred "Page N" footer on multi-page output.
    pub show_page_numbers: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            orientation: Orientation::default(),
            page_size: PageSize::default(),
            margin_mm: DEFAULT_MARGIN_MM,
            show_page_numbers: true,
        }
    }
}

impl ExportSettings {
    pub fn builder() -> ExportSettingsBuilder {
        ExportSettingsBuilder::default()
    }

    /// Page width in millimetres, orientation applied.
    pub fn page_width_mm(&self) -> f32 {
        let (w, h) = self.page_size.dimensions_mm();
        match self.orientation {
            Orientation::Portrait => w,
            Orientation::Landscape => h,
        }
    }

    /// Page height in millimetres, orientation applied.
    pub fn page_height_mm(&self) -> f32 {
        let (w, h) = self.page_size.dimensions_mm();
        match self.orientation {
            Orientation::Portrait => h,
            Orientation::Landscape => w,
        }
    }

    /// Horizontal space available to content: page width minus both margins.
    pub fn content_width_mm(&self) -> f32 {
        self.page_width_mm() - 2.0 * self.margin_mm
    }

    /// Vertical space available per page: page height minus both margins.
    pub fn printable_height_mm(&self) -> f32 {
        self.page_height_mm() - 2.0 * self.margin_mm
    }

    /// Apply per-call overrides on top of these settings.
    pub fn merged(mut self, overrides: &SettingsOverride) -> Self {
        if let Some(q) = overrides.quality {
            self.quality = q;
        }
        if let Some(o) = overrides.orientation {
            self.orientation = o;
        }
        if let Some(p) = overrides.page_size {
            self.page_size = p;
        }
        if let Some(m) = overrides.margin_mm {
            self.margin_mm = m;
        }
        if let Some(n) = overrides.show_page_numbers {
            self.show_page_numbers = n;
        }
        self
    }

    /// Check the geometry is usable: margins must leave a positive content
    /// area in both directions.
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.margin_mm < 0.0 {
            return Err(ExportError::InvalidConfig(format!(
                "margin must be >= 0 mm (got {})",
                self.margin_mm
            )));
        }
        if self.content_width_mm() <= 0.0 || self.printable_height_mm() <= 0.0 {
            return Err(ExportError::InvalidConfig(format!(
                "margin of {} mm leaves no printable area on {} {}",
                self.margin_mm,
                self.page_size.as_str(),
                self.orientation.as_str()
            )));
        }
        Ok(())
    }
}

/// Optional per-call overrides merged on top of the persisted defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsOverride {
    pub quality: Option<Quality>,
    pub orientation: Option<Orientation>,
    pub page_size: Option<PageSize>,
    pub margin_mm: Option<f32>,
    pub show_page_numbers: Option<bool>,
}

/// Builder for [`ExportSettings`] with validation at `build()`.
#[derive(Debug, Clone, Default)]
pub struct ExportSettingsBuilder {
    settings: ExportSettings,
}

impl ExportSettingsBuilder {
    pub fn quality(mut self, quality: Quality) -> Self {
        self.settings.quality = quality;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.settings.orientation = orientation;
        self
    }

    pub fn page_size(mut self, page_size: PageSize) -> Self {
        self.settings.page_size = page_size;
        self
    }

    pub fn margin_mm(mut self, margin_mm: f32) -> Self {
        self.settings.margin_mm = margin_mm;
        self
    }

    pub fn show_page_numbers(mut self, show: bool) -> Self {
        self.settings.show_page_numbers = show;
        self
    }

    /// Validate and build the settings.
    ///
    /// # Errors
    /// [`ExportError::InvalidConfig`] if the margins leave no printable area.
    pub fn build(self) -> Result<ExportSettings, ExportError> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}
