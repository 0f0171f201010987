use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use migrate_map::{ConfidenceLevel, ConfidenceReport, Progress};
use migrate_model::LinkOrigin;

use crate::types::{LinkRow, MatchResult, SuggestResult};

pub fn print_match_summary(result: &MatchResult) {
    println!("Policy: {}", result.policy);
    println!("Threshold: {:.2}", result.threshold);
    if result.dry_run {
        println!("Dry run: {} link(s) planned, nothing applied", result.matched);
    } else {
        println!("Auto-match: {} link(s) created", result.matched);
    }
    if let Some(path) = &result.output {
        println!("Mapping: {}", path.display());
    }

    if result.rows.is_empty() {
        println!("No links.");
    } else {
        println!("{}", links_table(&result.rows));
    }
    print_confidence(&result.confidence);
    print_progress(&result.progress);

    if !result.unlinked_old.is_empty() {
        let keys: Vec<String> = result.unlinked_old.iter().map(ToString::to_string).collect();
        println!("Unlinked old records: {}", keys.join(", "));
    }
    if result.incomplete {
        eprintln!(
            "error: {} old record(s) remain unlinked",
            result.progress.unlinked_old_count
        );
    }
}

pub fn print_suggestions(result: &SuggestResult) {
    println!("Candidates for {} ({})", result.old_key, result.old_display);
    if result.rows.is_empty() {
        println!("No candidates.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("New key"),
        header_cell("Display"),
        header_cell("Score"),
        header_cell("Linked"),
        header_cell("Why"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    for (rank, row) in result.rows.iter().enumerate() {
        table.add_row(vec![
            dim_cell(rank + 1),
            Cell::new(&row.new_key),
            Cell::new(&row.new_display),
            score_cell(Some(row.score)),
            if row.linked {
                Cell::new("✓").fg(Color::Green)
            } else {
                dim_cell("-")
            },
            dim_cell(&row.explanation),
        ]);
    }
    println!("{table}");
}

fn links_table(rows: &[LinkRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Old key"),
        header_cell("Old display"),
        header_cell("New key"),
        header_cell("New display"),
        header_cell("Score"),
        header_cell("Origin"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Center);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.old_key),
            Cell::new(&row.old_display),
            Cell::new(&row.new_key),
            Cell::new(&row.new_display),
            score_cell(row.score),
            origin_cell(row.origin),
        ]);
    }
    table
}

fn print_confidence(report: &ConfidenceReport) {
    if report.total() == 0 {
        return;
    }
    println!("Confidence:");
    for level in ConfidenceLevel::ALL {
        let count = report.count(level);
        if count > 0 {
            println!("  {count} {}: {}", level.label(), level.description());
        }
    }
    if report.uncategorized > 0 {
        println!("  {} below the lowest band", report.uncategorized);
    }
    if report.manual > 0 {
        println!("  {} without a score", report.manual);
    }
}

fn print_progress(progress: &Progress) {
    println!(
        "Progress: {}/{} old records linked ({:.0}%), {}/{} new records targeted",
        progress.linked_old_count,
        progress.total_old_count,
        progress.completion_ratio * 100.0,
        progress.linked_new_count,
        progress.total_new_count
    );
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn score_cell(score: Option<f64>) -> Cell {
    match score {
        Some(value) => {
            let color = if value >= 0.95 {
                Color::Green
            } else if value >= 0.8 {
                Color::Yellow
            } else {
                Color::Red
            };
            Cell::new(format!("{value:.3}")).fg(color)
        }
        None => dim_cell("-"),
    }
}

fn origin_cell(origin: LinkOrigin) -> Cell {
    match origin {
        LinkOrigin::Auto => Cell::new(origin).fg(Color::Cyan),
        LinkOrigin::Manual => Cell::new(origin).add_attribute(Attribute::Bold),
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
