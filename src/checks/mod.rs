// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Lint checks over candidate manifests: builds the projected path index
//! once, then evaluates every manifest and action sequentially.

mod actions;
mod binary;
mod diag;
mod links;
mod manifests;

use std::path::PathBuf;

pub use diag::{Diagnostic, Diagnostics, Severity};
pub use links::resolve_target;

use crate::inspect::Inspector;
use crate::manifest::{ActionKind, DeliveryAction, Manifest};
use crate::paths::PathIndex;
use binary::BinaryChecker;

/// Configuration shared by all checks of one lint run.
pub struct CheckConfig {
    /// Ignore publishers when deciding whether a candidate package
    /// supersedes a reference package.
    pub ignore_publisher: bool,
    /// Directories searched for the delivered file contents.
    pub proto_dirs: Vec<PathBuf>,
    /// Publishers a manifest may name; empty skips the check.
    pub allowed_publishers: Vec<String>,
    /// Architecture every `variant.arch` must equal; `None` skips the check.
    pub arch: Option<String>,
    /// OS release used in versioned architecture directory names.
    pub release: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            ignore_publisher: true,
            proto_dirs: Vec::new(),
            allowed_publishers: Vec::new(),
            arch: None,
            release: "2.11".to_string(),
        }
    }
}

/// Checks candidate manifests against the state the repository will have
/// once they are published.
pub struct ContentChecker<'a> {
    candidates: &'a [Manifest],
    paths: PathIndex<'a>,
    binary: BinaryChecker<'a>,
    config: &'a CheckConfig,
}

impl<'a> ContentChecker<'a> {
    /// Build the projected path index and wire up the per-file checker.
    ///
    /// Reference manifests superseded by any candidate are dropped before
    /// the reference index is built; the remaining reference view is then
    /// merged with the candidate view so that every later lookup sees the
    /// post-publish repository.
    #[must_use]
    pub fn new(
        candidates: &'a [Manifest],
        references: &'a [Manifest],
        inspector: &'a dyn Inspector,
        config: &'a CheckConfig,
    ) -> Self {
        let reference = PathIndex::build(references.iter().filter(|reference| {
            !candidates
                .iter()
                .any(|c| c.fmri().supersedes(reference.fmri(), config.ignore_publisher))
        }));
        let candidate = PathIndex::build(candidates.iter());
        let paths = PathIndex::merge(reference, candidate, config.ignore_publisher);
        let binary = BinaryChecker::new(inspector, &config.proto_dirs, &config.release);

        Self {
            candidates,
            paths,
            binary,
            config,
        }
    }

    /// The merged path index used by every check in this run.
    #[must_use]
    pub fn paths(&self) -> &PathIndex<'a> {
        &self.paths
    }

    /// Evaluate all checks over all candidate manifests, in order.
    pub fn check(&self, sink: &mut Diagnostics) {
        for manifest in self.candidates {
            manifests::check_manifest(manifest, self.config, sink);
            for action in manifest.actions() {
                self.check_action(action, sink);
            }
        }
    }

    fn check_action(&self, action: &DeliveryAction, sink: &mut Diagnostics) {
        actions::check_delivery_location(action, sink);
        actions::check_init_script(action, sink);
        actions::check_legacy(action, sink);

        match action.kind() {
            ActionKind::File => {
                actions::check_preserve(action, sink);
                self.binary.check_file(action, &self.paths, sink);
            }
            ActionKind::Link | ActionKind::Hardlink => {
                links::check_link(action, &self.paths, sink);
            }
            _ => {}
        }
    }
}
