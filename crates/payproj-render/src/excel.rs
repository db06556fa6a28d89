//! Excel projection calendar exporter
//!
//! Generates an XLSX workbook with a single "Projections" sheet:
//! - One row per client, one column per business day, trailing Total column
//! - Cells filled by projection status, placeholder glyph for empty cells
//! - Totals footer (per date and grand total)
//! - Status legend with the same swatch colors as the grid
//!
//! ## Example Output Structure
//!
//! ```text
//! | [logo]  Payment projections                generated 2024-06-03 09:15 |
//! | Client  | Monday     | Tuesday    | ... | Total    |
//! |         | 03/06/2024 | 04/06/2024 |     |          |
//! |---------|------------|------------|-----|----------|
//! | Acme    | 100.00 €   | —          |     | 100.00 € |
//! |         | Pending    |            |     |          |
//! | Total   | 100.00 €   | 0.00 €     |     | 100.00 € |
//!
//! | Legend    |
//! | [#FFF2CC] | Pending   |
//! | [#C6EFCE] | Fulfilled |
//! | ...       |
//! ```
//!
//! The sheet is first laid out as plain data ([`SheetLayout`]) and then
//! written, so the placement and coloring of every cell can be inspected
//! without reading the workbook back.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use payproj_core::{GridRenderer, ProjectionGrid, ProjectionStatus, RenderError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Image, Workbook, Worksheet};
use tracing::{debug, warn};

/// Worksheet column limit of the XLSX format
pub const MAX_COLUMNS: usize = 16_384;

/// Fill color per projection status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusPalette {
    pub pending: u32,
    pub fulfilled: u32,
    pub cancelled: u32,
    pub overdue: u32,
}

impl Default for StatusPalette {
    fn default() -> Self {
        Self {
            pending: 0xFFF2CC,   // Light gold
            fulfilled: 0xC6EFCE, // Light green
            cancelled: 0xD9D9D9, // Grey
            overdue: 0xFFC7CE,   // Light red
        }
    }
}

impl StatusPalette {
    pub fn color(&self, status: ProjectionStatus) -> u32 {
        match status {
            ProjectionStatus::Pending => self.pending,
            ProjectionStatus::Fulfilled => self.fulfilled,
            ProjectionStatus::Cancelled => self.cancelled,
            ProjectionStatus::Overdue => self.overdue,
        }
    }
}

/// Content of a laid-out cell
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

/// Role of a cell, which selects its format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellStyle {
    Title,
    Header,
    ClientName,
    Projection,
    Empty,
    RowTotal,
    FooterLabel,
    FooterTotal,
    LegendHeader,
    Swatch,
    LegendLabel,
}

/// One cell of the laid-out sheet
#[derive(Clone, Debug, PartialEq)]
pub struct CellSpec {
    pub row: u32,
    pub col: u16,
    pub value: CellValue,
    pub style: CellStyle,
    /// Status background, when the cell is status-colored
    pub fill: Option<u32>,
}

/// Plain-data description of the exported sheet
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SheetLayout {
    pub cells: Vec<CellSpec>,
    /// Row holding the day headers
    pub header_row: u32,
    /// First client row
    pub first_data_row: u32,
    /// Totals footer row
    pub footer_row: u32,
    /// "Legend" heading row
    pub legend_row: u32,
    /// Number of columns of the grid (client + days + total)
    pub columns: u16,
}

impl SheetLayout {
    pub fn cell(&self, row: u32, col: u16) -> Option<&CellSpec> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    /// Legend swatch color for `status`
    pub fn legend_fill(&self, status: ProjectionStatus) -> Option<u32> {
        let label = status.label();
        let label_cell = self.cells.iter().find(|c| {
            c.style == CellStyle::LegendLabel && c.value == CellValue::Text(label.to_string())
        })?;
        self.cell(label_cell.row, label_cell.col - 1)
            .and_then(|swatch| swatch.fill)
    }
}

/// Excel projection calendar exporter
#[derive(Clone, Debug)]
pub struct ExcelExporter {
    /// Currency symbol appended to amounts
    pub currency: String,
    /// Text shown in empty cells
    pub placeholder: String,
    /// Title written above the grid (None = no title row)
    pub title: Option<String>,
    /// Optional branding image placed in the title row
    pub logo: Option<PathBuf>,
    /// Status colors
    pub palette: StatusPalette,
    /// Timestamp printed in the title row (defaults to now)
    pub generated_at: Option<NaiveDateTime>,
}

impl Default for ExcelExporter {
    fn default() -> Self {
        Self {
            currency: "€".into(),
            placeholder: "—".into(),
            title: Some("Payment projections".into()),
            logo: None,
            palette: StatusPalette::default(),
            generated_at: None,
        }
    }
}

impl ExcelExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set currency symbol
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Set the empty-cell glyph
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Set the sheet title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Omit the title row
    pub fn no_title(mut self) -> Self {
        self.title = None;
        self
    }

    /// Place a branding image in the title row
    pub fn logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.logo = Some(path.into());
        self
    }

    /// Replace the status palette
    pub fn palette(mut self, palette: StatusPalette) -> Self {
        self.palette = palette;
        self
    }

    /// Fix the generation timestamp (for reproducible output)
    pub fn generated_at(mut self, at: NaiveDateTime) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// Lay out the sheet as plain data
    pub fn layout(&self, grid: &ProjectionGrid) -> Result<SheetLayout, RenderError> {
        // Client column + days + Total column
        if grid.days.len() + 2 > MAX_COLUMNS {
            return Err(RenderError::InvalidData(format!(
                "{} business days do not fit in {MAX_COLUMNS} columns",
                grid.days.len()
            )));
        }
        let mut cells = Vec::new();
        let total_col = day_column(grid.days.len())?;

        let mut row = 0u32;
        if let Some(ref title) = self.title {
            let generated = self
                .generated_at
                .unwrap_or_else(|| Local::now().naive_local());
            cells.push(text_cell(
                row,
                0,
                format!("{title} (generated {})", generated.format("%Y-%m-%d %H:%M")),
                CellStyle::Title,
            ));
            row += 2;
        }

        // Header
        let header_row = row;
        cells.push(text_cell(header_row, 0, "Client", CellStyle::Header));
        for (i, day) in grid.days.iter().enumerate() {
            let label = format!("{}\n{}", day.weekday_name(), day.date().format("%d/%m/%Y"));
            cells.push(text_cell(header_row, day_column(i)?, label, CellStyle::Header));
        }
        cells.push(text_cell(header_row, total_col, "Total", CellStyle::Header));

        // Client rows
        let first_data_row = header_row + 1;
        row = first_data_row;
        for group in &grid.groups {
            cells.push(text_cell(row, 0, group.display_name.clone(), CellStyle::ClientName));
            for (i, day) in grid.days.iter().enumerate() {
                let col = day_column(i)?;
                match group.cell(*day) {
                    Some(record) => {
                        let mut text = format!(
                            "{}\n{}",
                            self.money(record.amount),
                            record.status.label()
                        );
                        let hidden = group.hidden_on(*day);
                        if hidden > 0 {
                            text.push_str(&format!(" (+{hidden})"));
                        }
                        cells.push(CellSpec {
                            row,
                            col,
                            value: CellValue::Text(text),
                            style: CellStyle::Projection,
                            fill: Some(self.palette.color(record.status)),
                        });
                    }
                    None => {
                        cells.push(text_cell(row, col, self.placeholder.clone(), CellStyle::Empty));
                    }
                }
            }
            cells.push(number_cell(
                row,
                total_col,
                grid.totals.for_client(group.client_id),
                CellStyle::RowTotal,
            ));
            row += 1;
        }

        // Footer
        let footer_row = row;
        cells.push(text_cell(footer_row, 0, "Total", CellStyle::FooterLabel));
        for (i, day) in grid.days.iter().enumerate() {
            cells.push(number_cell(
                footer_row,
                day_column(i)?,
                grid.totals.for_date(*day),
                CellStyle::FooterTotal,
            ));
        }
        cells.push(number_cell(footer_row, total_col, grid.totals.grand, CellStyle::FooterTotal));

        // Legend
        let legend_row = footer_row + 2;
        cells.push(text_cell(legend_row, 0, "Legend", CellStyle::LegendHeader));
        for (i, status) in ProjectionStatus::ALL.iter().enumerate() {
            let r = legend_row + 1 + i as u32;
            cells.push(CellSpec {
                row: r,
                col: 0,
                value: CellValue::Text(String::new()),
                style: CellStyle::Swatch,
                fill: Some(self.palette.color(*status)),
            });
            cells.push(text_cell(r, 1, status.label(), CellStyle::LegendLabel));
        }

        Ok(SheetLayout {
            cells,
            header_row,
            first_data_row,
            footer_row,
            legend_row,
            columns: total_col + 1,
        })
    }

    /// Generate Excel workbook bytes
    pub fn export(&self, grid: &ProjectionGrid) -> Result<Vec<u8>, RenderError> {
        if grid.days.is_empty() {
            return Err(RenderError::InvalidData("No business days to export".into()));
        }

        let layout = self.layout(grid)?;
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet
            .set_name("Projections")
            .map_err(|e| RenderError::Format(e.to_string()))?;

        self.write_layout(sheet, &layout)?;
        match (&self.title, &self.logo) {
            (Some(_), Some(_)) => self.insert_logo(sheet, layout.columns),
            (None, Some(path)) => {
                warn!(path = %path.display(), "logo needs a title row, exporting without it");
            }
            _ => {}
        }

        let buffer = workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))?;
        debug!(
            clients = grid.groups.len(),
            days = grid.days.len(),
            bytes = buffer.len(),
            "exported projection grid"
        );
        Ok(buffer)
    }

    /// Export into `path`; a directory gets a timestamped file name
    pub fn export_to_path(
        &self,
        grid: &ProjectionGrid,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf, RenderError> {
        let path = path.as_ref();
        let target = if path.is_dir() {
            let now = self
                .generated_at
                .unwrap_or_else(|| Local::now().naive_local());
            path.join(export_file_name(now))
        } else {
            path.to_path_buf()
        };
        let bytes = self.export(grid)?;
        std::fs::write(&target, bytes)?;
        Ok(target)
    }

    fn write_layout(&self, sheet: &mut Worksheet, layout: &SheetLayout) -> Result<(), RenderError> {
        let formats = self.create_formats();

        for cell in &layout.cells {
            let format = formats.for_cell(cell);
            match &cell.value {
                CellValue::Text(text) => sheet
                    .write_with_format(cell.row, cell.col, text.as_str(), &format)
                    .map_err(|e| RenderError::Format(e.to_string()))?,
                CellValue::Number(n) => sheet
                    .write_with_format(cell.row, cell.col, *n, &format)
                    .map_err(|e| RenderError::Format(e.to_string()))?,
            };
        }

        // Column widths
        sheet.set_column_width(0, 28).ok();
        for col in 1..layout.columns {
            sheet.set_column_width(col, 15).ok();
        }

        // Two-line header and cells
        sheet.set_row_height(layout.header_row, 32).ok();
        for row in layout.first_data_row..layout.footer_row {
            sheet.set_row_height(row, 32).ok();
        }

        // Freeze client column and header row
        sheet.set_freeze_panes(layout.first_data_row, 1).ok();

        Ok(())
    }

    /// Best effort: a missing or unreadable logo only logs a warning
    fn insert_logo(&self, sheet: &mut Worksheet, columns: u16) {
        let Some(ref path) = self.logo else {
            return;
        };
        match Image::new(path) {
            Ok(image) => {
                let image = image.set_scale_height(0.5).set_scale_width(0.5);
                if let Err(e) = sheet.insert_image(0, columns.saturating_sub(1), &image) {
                    warn!(path = %path.display(), error = %e, "could not place logo, exporting without it");
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load logo, exporting without it");
            }
        }
    }

    fn money(&self, amount: Decimal) -> String {
        format!("{} {}", format_amount(amount), self.currency)
    }

    /// Create reusable formats
    fn create_formats(&self) -> ExcelFormats {
        let currency_format = format!("#,##0.00 \"{}\"", self.currency);

        let title = Format::new().set_bold().set_font_size(14);

        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_background_color(0x4472C4)
            .set_font_color(0xFFFFFF)
            .set_border(FormatBorder::Thin);

        let client = Format::new()
            .set_bold()
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin);

        let projection = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin);

        let empty = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_font_color(0xA6A6A6)
            .set_border(FormatBorder::Thin);

        let row_total = Format::new()
            .set_bold()
            .set_num_format(&currency_format)
            .set_border(FormatBorder::Thin);

        let footer_label = Format::new()
            .set_bold()
            .set_background_color(0xE2EFDA)
            .set_border(FormatBorder::Thin);

        let footer_total = Format::new()
            .set_bold()
            .set_num_format(&currency_format)
            .set_background_color(0xE2EFDA)
            .set_border(FormatBorder::Thin);

        let legend_header = Format::new().set_bold();

        let swatch = Format::new().set_border(FormatBorder::Thin);

        let legend_label = Format::new();

        ExcelFormats {
            title,
            header,
            client,
            projection,
            empty,
            row_total,
            footer_label,
            footer_total,
            legend_header,
            swatch,
            legend_label,
        }
    }
}

/// File name for an export generated at `at`, e.g. `projections_20240603_091500.xlsx`
pub fn export_file_name(at: NaiveDateTime) -> String {
    format!("projections_{}.xlsx", at.format("%Y%m%d_%H%M%S"))
}

/// Two decimals with thousands separators, e.g. `1,234.50`
pub(crate) fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{grouped}.{frac_part}", if negative { "-" } else { "" })
}

/// Sheet column of the day at `index` (column 0 holds client names)
fn day_column(index: usize) -> Result<u16, RenderError> {
    u16::try_from(index + 1)
        .map_err(|_| RenderError::InvalidData(format!("Column {} is out of range", index + 1)))
}

fn text_cell(row: u32, col: u16, text: impl Into<String>, style: CellStyle) -> CellSpec {
    CellSpec {
        row,
        col,
        value: CellValue::Text(text.into()),
        style,
        fill: None,
    }
}

fn number_cell(row: u32, col: u16, amount: Decimal, style: CellStyle) -> CellSpec {
    CellSpec {
        row,
        col,
        value: CellValue::Number(amount.to_f64().unwrap_or_default()),
        style,
        fill: None,
    }
}

/// Reusable Excel formats
struct ExcelFormats {
    title: Format,
    header: Format,
    client: Format,
    projection: Format,
    empty: Format,
    row_total: Format,
    footer_label: Format,
    footer_total: Format,
    legend_header: Format,
    swatch: Format,
    legend_label: Format,
}

impl ExcelFormats {
    /// Style format with the cell's status fill applied
    fn for_cell(&self, cell: &CellSpec) -> Format {
        let format = self.for_style(cell.style);
        match cell.fill {
            Some(fill) => format.set_background_color(fill),
            None => format,
        }
    }

    fn for_style(&self, style: CellStyle) -> Format {
        match style {
            CellStyle::Title => self.title.clone(),
            CellStyle::Header => self.header.clone(),
            CellStyle::ClientName => self.client.clone(),
            CellStyle::Projection => self.projection.clone(),
            CellStyle::Empty => self.empty.clone(),
            CellStyle::RowTotal => self.row_total.clone(),
            CellStyle::FooterLabel => self.footer_label.clone(),
            CellStyle::FooterTotal => self.footer_total.clone(),
            CellStyle::LegendHeader => self.legend_header.clone(),
            CellStyle::Swatch => self.swatch.clone(),
            CellStyle::LegendLabel => self.legend_label.clone(),
        }
    }
}

impl GridRenderer for ExcelExporter {
    type Output = Vec<u8>;

    fn render(&self, grid: &ProjectionGrid) -> Result<Vec<u8>, RenderError> {
        self.export(grid)
    }
}
