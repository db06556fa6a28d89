//! Plain-text projection grid
//!
//! Renders the grid as an aligned table for terminals and logs. Cells show
//! the amount followed by the one-letter status code, with `+n` appended
//! when other projections share the cell.

use payproj_core::{GridRenderer, ProjectionGrid, RenderError};

use crate::excel::format_amount;

/// Text table renderer
#[derive(Clone, Debug)]
pub struct TextGridRenderer {
    pub placeholder: String,
    /// Column separator
    pub separator: String,
}

impl Default for TextGridRenderer {
    fn default() -> Self {
        Self {
            placeholder: "—".into(),
            separator: " | ".into(),
        }
    }
}

impl TextGridRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    fn rows(&self, grid: &ProjectionGrid) -> Vec<Vec<String>> {
        let mut rows = Vec::with_capacity(grid.groups.len() + 2);

        let mut header = vec!["Client".to_string()];
        header.extend(
            grid.days
                .iter()
                .map(|d| format!("{} {}", &d.weekday_name()[..3], d.date().format("%d/%m"))),
        );
        header.push("Total".into());
        rows.push(header);

        for group in &grid.groups {
            let mut row = vec![group.display_name.clone()];
            for day in &grid.days {
                let cell = match group.cell(*day) {
                    Some(record) => {
                        let mut text =
                            format!("{} {}", format_amount(record.amount), record.status.code());
                        let hidden = group.hidden_on(*day);
                        if hidden > 0 {
                            text.push_str(&format!(" +{hidden}"));
                        }
                        text
                    }
                    None => self.placeholder.clone(),
                };
                row.push(cell);
            }
            row.push(format_amount(grid.totals.for_client(group.client_id)));
            rows.push(row);
        }

        let mut footer = vec!["Total".to_string()];
        footer.extend(grid.days.iter().map(|d| format_amount(grid.totals.for_date(*d))));
        footer.push(format_amount(grid.totals.grand));
        rows.push(footer);

        rows
    }
}

impl GridRenderer for TextGridRenderer {
    type Output = String;

    fn render(&self, grid: &ProjectionGrid) -> Result<String, RenderError> {
        if grid.days.is_empty() {
            return Err(RenderError::InvalidData("No business days to render".into()));
        }

        let rows = self.rows(grid);
        let columns = rows[0].len();
        let widths: Vec<usize> = (0..columns)
            .map(|col| {
                rows.iter()
                    .map(|row| row[col].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        let rule_sep = self.separator.replace(|c: char| c != ' ', "+").replace(' ', "-");
        let last = rows.len() - 1;

        let mut out = String::new();
        for (i, row) in rows.iter().enumerate() {
            if i == last {
                out.push_str(&rule.join(&rule_sep));
                out.push('\n');
            }
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(col, (text, width))| {
                    // Amount columns right-aligned
                    if col == 0 || i == 0 {
                        pad_right(text, *width)
                    } else {
                        pad_left(text, *width)
                    }
                })
                .collect();
            out.push_str(cells.join(&self.separator).trim_end());
            out.push('\n');
            if i == 0 {
                out.push_str(&rule.join(&rule_sep));
                out.push('\n');
            }
        }
        Ok(out)
    }
}

fn pad_right(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.chars().count());
    format!("{text}{}", " ".repeat(fill))
}

fn pad_left(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.chars().count());
    format!("{}{text}", " ".repeat(fill))
}
