use std::path::Path;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use vlmd_model::{Field, ValidationReport};
use vlmd_report::OutputPaths;

use vlmd_cli::pipeline::ConversionResult;

pub fn print_summary(result: &ConversionResult, output_dir: Option<&Path>) {
    println!("Data dictionary: {}", result.dictionary.title);
    if let Some(description) = &result.dictionary.description {
        println!("Description: {description}");
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Type"),
        header_cell("Description"),
        header_cell("Encodings"),
        header_cell("Missing"),
        header_cell("Enum"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Right);
    for field in result.dictionary.fields() {
        table.add_row(field_row(field));
    }
    println!("{table}");

    let mut validation = Table::new();
    validation.set_header(vec![
        header_cell("View"),
        header_cell("Status"),
        header_cell("Errors"),
        header_cell("Summary"),
    ]);
    apply_table_style(&mut validation);
    align_column(&mut validation, 2, CellAlignment::Right);
    validation.add_row(report_row("tabular", &result.errors.tabular));
    validation.add_row(report_row("nested", &result.errors.nested));
    println!("{validation}");

    print_error_table(result);

    if let Some(dir) = output_dir {
        let paths = OutputPaths::in_dir(dir);
        println!("Nested data dictionary: {}", paths.nested.display());
        println!("Tabular data dictionary: {}", paths.tabular.display());
        println!("Validation errors: {}", paths.validation_errors.display());
        println!("Tabular error summary: {}", paths.tabular_summary.display());
    }
}

fn print_error_table(result: &ConversionResult) {
    if result.errors.is_valid() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("View"),
        header_cell("Location"),
        header_cell("Code"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    for (view, report) in [
        ("tabular", &result.errors.tabular),
        ("nested", &result.errors.nested),
    ] {
        for error in &report.errors {
            table.add_row(vec![
                Cell::new(view),
                Cell::new(error.location.to_string()),
                Cell::new(error.code.as_str()).fg(Color::Red),
                Cell::new(&error.message),
            ]);
        }
    }
    println!();
    println!("Errors:");
    println!("{table}");
}

fn field_row(field: &Field) -> Vec<Cell> {
    vec![
        Cell::new(&field.name)
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold),
        Cell::new(field.field_type.as_str()),
        match &field.description {
            Some(description) => Cell::new(description),
            None => dim_cell("-"),
        },
        count_cell(field.encodings.len()),
        count_cell(field.missing_values.len()),
        count_cell(field.constraints.enumeration.len()),
    ]
}

fn report_row(view: &str, report: &ValidationReport) -> Vec<Cell> {
    let status = if report.valid {
        Cell::new("valid")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        Cell::new("invalid")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    };
    vec![
        Cell::new(view),
        status,
        count_cell(report.error_count()),
        match &report.summary {
            Some(summary) => Cell::new(summary),
            None => dim_cell("-"),
        },
    ]
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count)
    } else {
        dim_cell("-")
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
