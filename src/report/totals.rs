// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::checks::{Diagnostic, Severity};

// BTreeMap keeps the per-identifier counts alphabetical in the JSON output.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ReportTotals {
    pub(crate) errors: usize,
    pub(crate) warnings: usize,
    pub(crate) info: usize,
    pub(crate) total: usize,
    pub(crate) by_id: BTreeMap<&'static str, usize>,
}

impl ReportTotals {
    pub(crate) fn new(diagnostics: &[Diagnostic]) -> Self {
        let mut totals = Self {
            total: diagnostics.len(),
            ..Self::default()
        };
        for diagnostic in diagnostics {
            match diagnostic.severity {
                Severity::Error => totals.errors += 1,
                Severity::Warning => totals.warnings += 1,
                Severity::Info => totals.info += 1,
            }
            *totals.by_id.entry(diagnostic.id).or_default() += 1;
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::Diagnostics;

    #[test]
    fn test_totals_count_by_severity_and_id() {
        let mut sink = Diagnostics::new();
        sink.error("a.check", None, "one");
        sink.error("a.check", None, "two");
        sink.warning("b.check", None, "three");
        sink.info("c.check", None, "four");
        let items = sink.into_items();

        let totals = ReportTotals::new(&items);
        assert_eq!(totals.errors, 2);
        assert_eq!(totals.warnings, 1);
        assert_eq!(totals.info, 1);
        assert_eq!(totals.total, 4);
        assert_eq!(totals.by_id["a.check"], 2);
        assert_eq!(totals.by_id["b.check"], 1);
    }

    #[test]
    fn test_totals_of_empty_run() {
        let totals = ReportTotals::new(&[]);
        assert_eq!(totals, ReportTotals::default());
    }
}
