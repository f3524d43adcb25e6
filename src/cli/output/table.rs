//! Table output for ingestion reports using comfy-table.

use crate::cli::output::truncate;
use crate::domain::models::BatchIngestReport;
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// One row per file: ingested, skipped or failed, with the reason.
    pub fn format_batch_report(&self, report: &BatchIngestReport) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Source").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Detail").add_attribute(Attribute::Bold),
        ]);

        for source in &report.succeeded {
            table.add_row(vec![
                Cell::new(source),
                self.status_cell("ingested", Color::Green),
                Cell::new("-"),
            ]);
        }

        for failure in &report.failed {
            let status = if failure.skipped {
                self.status_cell("skipped", Color::Yellow)
            } else {
                self.status_cell("failed", Color::Red)
            };
            table.add_row(vec![
                Cell::new(&failure.source),
                status,
                Cell::new(truncate(&failure.reason, 80)),
            ]);
        }

        table.to_string()
    }

    fn status_cell(&self, status: &str, color: Color) -> Cell {
        if self.use_colors {
            Cell::new(status).fg(color)
        } else {
            Cell::new(status)
        }
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}
