// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Report struct and public API for presenting lint results.

mod console;
mod totals;
mod validate;

pub use console::summarize_report;
pub use validate::validate_report;

use serde::Serialize;

use crate::checks::Diagnostic;
use crate::manifest::Manifest;
use totals::ReportTotals;

/// The outcome of one lint run: which packages were checked, the totals,
/// and every diagnostic in evaluation order.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    packages: Vec<String>,
    totals: ReportTotals,
    diagnostics: &'a [Diagnostic],
}

impl<'a> Report<'a> {
    #[must_use]
    pub fn new(candidates: &[Manifest], diagnostics: &'a [Diagnostic]) -> Self {
        Self {
            packages: candidates.iter().map(|m| m.fmri().to_string()).collect(),
            totals: ReportTotals::new(diagnostics),
            diagnostics,
        }
    }
}
