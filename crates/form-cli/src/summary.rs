use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use form_model::Validity;
use form_cli::replay::{FieldSummary, ReplayResult};

use crate::commands::Inspection;

pub fn print_replay(result: &ReplayResult) {
    print_steps(result);
    print_fields(&result.fields);

    println!(
        "Form: {}{}",
        if result.valid { "valid" } else { "invalid" },
        if result.modified { ", modified" } else { "" }
    );
    if !result.blocked.is_empty() {
        eprintln!("Submission blocked by:");
        for path in &result.blocked {
            eprintln!("- {path}");
        }
    }
}

fn print_steps(result: &ReplayResult) {
    if result.steps.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Action"),
        header_cell("Validations"),
        header_cell("Moved"),
        header_cell("Result"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for step in &result.steps {
        let outcome = match &step.error {
            Some(error) => Cell::new(error).fg(Color::Red),
            None => Cell::new("ok").fg(Color::Green),
        };
        table.add_row(vec![
            dim_cell(step.index),
            Cell::new(step.action).fg(Color::Blue),
            count_cell(step.validations),
            count_cell(step.rewrites),
            outcome,
        ]);
    }
    println!("Steps:");
    println!("{table}");
}

pub fn print_fields(fields: &[FieldSummary]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Path"),
        header_cell("Kind"),
        header_cell("Value"),
        header_cell("Validity"),
        header_cell("Visible"),
        header_cell("Dirty"),
        header_cell("Label"),
    ]);
    apply_fields_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Center);
    align_column(&mut table, 5, CellAlignment::Center);
    for field in fields {
        let path_cell = if field.visible {
            Cell::new(&field.path)
        } else {
            dim_cell(&field.path)
        };
        table.add_row(vec![
            path_cell,
            dim_cell(field.kind.label()),
            Cell::new(&field.value),
            validity_cell(&field.validity),
            flag_cell(field.visible),
            flag_cell(field.dirty),
            field.label.as_ref().map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    println!("{table}");
}

pub fn print_inspection(inspection: &Inspection) {
    let snapshot = &inspection.snapshot;
    println!("Step: {}", snapshot.step);
    println!("Saved: {}", snapshot.saved_at.to_rfc3339());

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Path"),
        header_cell("Value"),
        header_cell("Initial"),
        header_cell("Validity"),
        header_cell("Visible"),
        header_cell("Rows"),
    ]);
    apply_fields_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Center);
    align_column(&mut table, 5, CellAlignment::Right);
    for (path, record) in snapshot.state.iter() {
        table.add_row(vec![
            Cell::new(path),
            Cell::new(&record.value),
            dim_cell(&record.initial_value),
            validity_cell(&record.validity),
            flag_cell(record.passes_condition),
            record.row_count.map_or_else(|| dim_cell("-"), Cell::new),
        ]);
    }
    println!("{table}");

    if let Some(errors) = &inspection.errors {
        if errors.is_empty() {
            println!("Form: valid");
        } else {
            println!("Form: invalid");
            for (path, reason) in errors {
                eprintln!("- {path}: {reason}");
            }
        }
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_fields_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 6 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Percentage(30)),
            ColumnConstraint::UpperBoundary(Width::Percentage(25)),
            ColumnConstraint::UpperBoundary(Width::Percentage(25)),
            ColumnConstraint::UpperBoundary(Width::Percentage(30)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::LowerBoundary(Width::Fixed(5)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn validity_cell(validity: &Validity) -> Cell {
    match validity {
        Validity::Valid => Cell::new("valid").fg(Color::Green),
        Validity::Unvalidated => dim_cell("unvalidated"),
        Validity::Invalid(reason) => Cell::new(format!("invalid: {reason}"))
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
    }
}

fn flag_cell(flag: bool) -> Cell {
    if flag {
        Cell::new("✓").fg(Color::Green)
    } else {
        dim_cell("-")
    }
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
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
