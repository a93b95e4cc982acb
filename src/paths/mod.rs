// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Index of delivered paths: which (package, action) pairs place something at
//! each path, and the versioned merge projecting the post-publish state.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::manifest::{DeliveryAction, Fmri, Manifest};

/// All deliverers of one path.
pub type PathClaims<'a> = Vec<(&'a Fmri, &'a DeliveryAction)>;

/// Mapping from a delivered path to everything that places an object there.
///
/// Keys are stored exactly as the manifests declare them; leading and
/// trailing slashes are normalized away at lookup time.
pub struct PathIndex<'a> {
    entries: BTreeMap<String, PathClaims<'a>>,
}

impl<'a> PathIndex<'a> {
    /// Index every path-bearing action of the given manifests.
    ///
    /// Multiple deliverers of one path are legitimate (simultaneous
    /// attributes across variants) and are all recorded.
    #[must_use]
    pub fn build(manifests: impl IntoIterator<Item = &'a Manifest>) -> Self {
        let mut entries: BTreeMap<String, PathClaims<'a>> = BTreeMap::new();
        for manifest in manifests {
            for action in manifest.actions() {
                if let Some(path) = action.path() {
                    entries
                        .entry(path.to_string())
                        .or_default()
                        .push((manifest.fmri(), action));
                }
            }
        }
        Self { entries }
    }

    /// Project what the repository will contain once the candidate packages
    /// are published over the reference state.
    ///
    /// Paths only the candidate delivers are copied verbatim. Where both
    /// sides deliver a path, every reference claim whose package some
    /// candidate package supersedes is displaced; the survivors and all
    /// candidate claims make up the merged entry. Run once at startup —
    /// later checks may query the same path many times.
    #[must_use]
    pub fn merge(reference: Self, candidate: Self, ignore_publisher: bool) -> Self {
        let mut entries = reference.entries;
        for (path, candidate_claims) in candidate.entries {
            match entries.entry(path) {
                Entry::Vacant(entry) => {
                    entry.insert(candidate_claims);
                }
                Entry::Occupied(mut entry) => {
                    let merged = entry.get_mut();
                    merged.retain(|(reference_fmri, _)| {
                        !candidate_claims
                            .iter()
                            .any(|(c, _)| c.supersedes(reference_fmri, ignore_publisher))
                    });
                    merged.extend(candidate_claims);
                }
            }
        }
        Self { entries }
    }

    fn normalize(path: &str) -> &str {
        path.trim_matches('/')
    }

    /// Whether some action delivers exactly this path.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(Self::normalize(path))
    }

    /// Whether this path exists in the projected repository: delivered
    /// directly, or implied by a delivery underneath it (a directory that
    /// has no action of its own because it uses default attributes).
    #[must_use]
    pub fn covers(&self, path: &str) -> bool {
        let key = Self::normalize(path);
        if self.entries.contains_key(key) {
            return true;
        }
        let prefix = format!("{key}/");
        self.entries
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .next()
            .is_some_and(|(next, _)| next.starts_with(&prefix))
    }

    /// The first recorded deliverer of this path, if any.
    #[must_use]
    pub fn first_claim(&self, path: &str) -> Option<&(&'a Fmri, &'a DeliveryAction)> {
        self.entries
            .get(Self::normalize(path))
            .and_then(|claims| claims.first())
    }

    /// All deliverers of this path.
    #[must_use]
    pub fn claims(&self, path: &str) -> &[(&'a Fmri, &'a DeliveryAction)] {
        self.entries
            .get(Self::normalize(path))
            .map_or(&[], Vec::as_slice)
    }

    /// Number of distinct paths in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
