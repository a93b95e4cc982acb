// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Link target resolution against the projected repository, with no
//! filesystem access at all.

use crate::manifest::DeliveryAction;
use crate::paths::PathIndex;

use super::Diagnostics;

pub(crate) const UNRESOLVABLE: &str = "link.unresolvable";

/// Combine a link's path and target into the path the link denotes.
///
/// Pure string-segment arithmetic: starting from the directory containing
/// `path`, each `..` segment of `target` pops one component (a no-op at the
/// root), `.` and empty segments are skipped, and anything else is appended.
#[must_use]
pub fn resolve_target(path: &str, target: &str) -> String {
    let dirname = path.rsplit_once('/').map_or("", |(dir, _)| dir);
    let mut result: Vec<&str> = dirname.split('/').filter(|s| !s.is_empty()).collect();

    for segment in target.split('/') {
        match segment {
            ".." => {
                result.pop();
            }
            "" | "." => {}
            other => result.push(other),
        }
    }

    result.join("/")
}

/// Check that a link or hardlink action resolves somewhere the repository
/// will actually contain after publication.
pub(crate) fn check_link(action: &DeliveryAction, index: &PathIndex<'_>, sink: &mut Diagnostics) {
    let (Some(path), Some(target)) = (action.path(), action.target()) else {
        return;
    };

    // Links may resolve outside the packages delivering this component, so
    // the merged index is the one to ask: an exact delivered path, or a
    // directory that exists implicitly through a child's delivery.
    let realtarget = resolve_target(path, target);
    if index.covers(&realtarget) {
        return;
    }

    sink.error(
        UNRESOLVABLE,
        Some(path),
        format!(
            "{} {} has unresolvable target '{}'",
            action.kind().name(),
            path,
            target
        ),
    );
}
