//! Combined validation report of both views.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Table};
use serde::Serialize;
use serde_json::Value;
use vlmd_model::{ErrorCode, ValidationError, ValidationReport};

use crate::error::ReportError;

/// Reports of the tabular and nested validators, in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub tabular: ValidationReport,
    pub nested: ValidationReport,
}

impl ErrorReport {
    pub fn new(tabular: ValidationReport, nested: ValidationReport) -> Self {
        Self { tabular, nested }
    }

    pub fn is_valid(&self) -> bool {
        self.tabular.valid && self.nested.valid
    }

    pub fn error_count(&self) -> usize {
        self.tabular.error_count() + self.nested.error_count()
    }

    /// Machine-readable document: `{"tabular": report, "nested": report}`.
    pub fn to_json(&self) -> Result<Value, ReportError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Human-readable text of the tabular report.
    pub fn tabular_summary(&self) -> String {
        let report = &self.tabular;
        let status = if report.valid { "valid" } else { "invalid" };
        let mut lines = vec![format!("Tabular data dictionary: {status}")];
        if report.valid {
            lines.push("No errors found.".to_string());
            return summary_text(&lines);
        }
        if let Some(summary) = &report.summary {
            lines.push(format!("Summary: {summary}"));
        }
        lines.push(format!("Errors: {}", report.error_count()));
        lines.push("Errors by type:".to_string());
        lines.extend(
            counts_by_code(&report.errors)
                .into_iter()
                .map(|(code, count)| format!("  {} ({code}): {count}", code.title())),
        );
        lines.push(String::new());
        lines.push(error_table(&report.errors).to_string());
        summary_text(&lines)
    }
}

fn summary_text(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn counts_by_code(errors: &[ValidationError]) -> Vec<(ErrorCode, usize)> {
    let mut counts: Vec<(ErrorCode, usize)> = Vec::new();
    for error in errors {
        match counts.iter_mut().find(|(code, _)| *code == error.code) {
            Some((_, count)) => *count += 1,
            None => counts.push((error.code, 1)),
        }
    }
    counts
}

fn error_table(errors: &[ValidationError]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Row", "Field", "Code", "Message"]);
    for error in errors {
        table.add_row(vec![
            Cell::new(
                error
                    .location
                    .row
                    .map_or_else(|| "-".to_string(), |row| row.to_string()),
            ),
            Cell::new(error.location.field.as_deref().unwrap_or("-")),
            Cell::new(error.code.as_str()),
            Cell::new(&error.message),
        ]);
    }
    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table
}
