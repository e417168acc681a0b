//! The export pipeline stages.
//!
//! ```text
//! region clone ──▶ rasterize ──▶ paginate ──▶ write
//!                  (backend)     (pure math)  (printpdf)
//! ```
//!
//! Each stage is independently testable; the orchestrator in
//! [`crate::export`] wires them together and owns the busy guard and the
//! clone's lifetime.

pub mod paginate;
pub mod rasterize;
pub mod write;

pub use paginate::{paginate, PageBand, Pagination};
pub use rasterize::{BitmapRasterizer, Rasterizer};
pub use write::build_pdf;
