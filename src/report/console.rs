// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Formats and prints report summaries to the console.

use comfy_table::{Cell, Table};

use super::Report;
use crate::checks::Severity;

/// Summarize the report to the console.
///
/// Prints the linted packages, severity and per-check statistics, and a
/// listing of every error-severity diagnostic.
pub fn summarize_report(report: &Report<'_>) {
    println!("Packages: {}", report.packages.join(", "));
    println!("Total diagnostics: {}\n", report.totals.total);

    println!("{}\n", severity_table(report));
    if !report.totals.by_id.is_empty() {
        println!("{}\n", check_table(report));
    }

    let errors: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .collect();
    if !errors.is_empty() {
        let mut table = default_table_preset();
        table.set_header(vec![
            Cell::new("Path").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Error").add_attribute(comfy_table::Attribute::Bold),
        ]);
        for diagnostic in &errors {
            table.add_row(vec![
                Cell::new(diagnostic.path.as_deref().unwrap_or("-")),
                Cell::new(&diagnostic.message),
            ]);
        }
        println!("{table}");
        println!("\nTotal: {} error(s)", errors.len());
    }
}

/// Create a table with the default preset styling.
fn default_table_preset() -> Table {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL_CONDENSED)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
    table
}

/// Create a table showing diagnostic counts per severity.
fn severity_table(report: &Report) -> Table {
    let mut table = default_table_preset();
    table
        .set_header(vec![
            Cell::new("Severity").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Count").add_attribute(comfy_table::Attribute::Bold),
        ])
        .add_row(vec![Cell::new("Errors"), Cell::new(report.totals.errors)])
        .add_row(vec![
            Cell::new("Warnings"),
            Cell::new(report.totals.warnings),
        ])
        .add_row(vec![Cell::new("Info"), Cell::new(report.totals.info)])
        .add_row(vec![
            Cell::new("Total").add_attribute(comfy_table::Attribute::Bold),
            Cell::new(report.totals.total).add_attribute(comfy_table::Attribute::Bold),
        ]);
    table
}

/// Create a table showing diagnostic counts per check identifier.
fn check_table(report: &Report) -> Table {
    let mut table = default_table_preset();
    table.set_header(vec![
        Cell::new("Check").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Count").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for (id, count) in &report.totals.by_id {
        table.add_row(vec![Cell::new(id), Cell::new(count)]);
    }
    table
}
