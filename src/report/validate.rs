// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Turns collected diagnostics into a process outcome.

use anyhow::Result;

use super::Report;
use crate::checks::Severity;

/// Validate the report.
///
/// # Errors
/// Returns an error if any error-severity diagnostic was recorded; warnings
/// and informational diagnostics do not fail the run.
pub fn validate_report(report: &Report<'_>) -> Result<()> {
    if report.totals.errors == 0 {
        return Ok(());
    }
    for diagnostic in report.diagnostics {
        if diagnostic.severity == Severity::Error {
            eprintln!(
                "ERROR: ({}) {}: {}",
                diagnostic.id,
                diagnostic.path.as_deref().unwrap_or("-"),
                diagnostic.message
            );
        }
    }
    Err(anyhow::anyhow!(
        "Lint errors found: {} error(s)",
        report.totals.errors
    ))
}
