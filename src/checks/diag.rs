// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Diagnostics: severity, stable identifiers, and the accumulating sink.

use serde::Serialize;
use std::collections::BTreeSet;

/// Severity of one diagnostic occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One finding. The identifier is stable across releases so occurrences can
/// be suppressed by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub id: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

/// Ordered accumulator for diagnostics. No check aborts the run; everything
/// lands here and the caller decides what the collected set means.
#[derive(Default)]
pub struct Diagnostics {
    suppressed: BTreeSet<String>,
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that drops diagnostics with any of the given
    /// identifiers.
    #[must_use]
    pub fn with_suppressed(ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            suppressed: ids.into_iter().collect(),
            items: Vec::new(),
        }
    }

    pub fn error(&mut self, id: &'static str, path: Option<&str>, message: impl Into<String>) {
        self.push(Severity::Error, id, path, message.into());
    }

    pub fn warning(&mut self, id: &'static str, path: Option<&str>, message: impl Into<String>) {
        self.push(Severity::Warning, id, path, message.into());
    }

    pub fn info(&mut self, id: &'static str, path: Option<&str>, message: impl Into<String>) {
        self.push(Severity::Info, id, path, message.into());
    }

    fn push(&mut self, severity: Severity, id: &'static str, path: Option<&str>, message: String) {
        if self.suppressed.contains(id) {
            return;
        }
        self.items.push(Diagnostic {
            severity,
            id,
            path: path.map(str::to_string),
            message,
        });
    }

    #[must_use]
    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<Diagnostic> {
        self.items
    }
}
