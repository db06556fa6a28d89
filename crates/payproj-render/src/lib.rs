//! # payproj-render
//!
//! Output backends for projection grids.
//!
//! This crate provides:
//! - Excel calendar export (status-colored cells, totals footer, legend)
//! - Plain-text tables for terminals and logs
//!
//! Both implement [`payproj_core::GridRenderer`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use payproj_core::GridRenderer;
//! use payproj_render::{ExcelExporter, TextGridRenderer};
//!
//! // Terminal table
//! println!("{}", TextGridRenderer::new().render(&grid)?);
//!
//! // Excel calendar
//! let exporter = ExcelExporter::new().currency("€").logo("brand.png");
//! let path = exporter.export_to_path(&grid, "exports/")?;
//! ```

pub mod excel;
pub mod text;

pub use excel::{
    export_file_name, CellSpec, CellStyle, CellValue, ExcelExporter, SheetLayout, StatusPalette,
    MAX_COLUMNS,
};
pub use text::TextGridRenderer;
