// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Single-action hygiene checks: delivery locations, startup scripts,
//! deprecated actions, and preserve/mode agreement.

use crate::manifest::{ActionKind, DeliveryAction};

use super::Diagnostics;

pub(crate) const LOCATION: &str = "action.location";
pub(crate) const INITSCRIPT: &str = "action.initscript";
pub(crate) const LEGACY: &str = "action.legacy";
pub(crate) const PRESERVE: &str = "action.preserve";
pub(crate) const MODE: &str = "action.mode";

/// Objects may only be delivered into the known filesystem roots.
pub(crate) fn check_delivery_location(action: &DeliveryAction, sink: &mut Diagnostics) {
    if !action.kind().is_placed() {
        return;
    }
    let Some(path) = action.path() else {
        return;
    };
    if !location_allowed(path) {
        sink.error(
            LOCATION,
            Some(path),
            format!("object delivered into non-standard location: {path}"),
        );
    }
}

fn location_allowed(path: &str) -> bool {
    for prefix in ["boot/", "etc/", "usr/", "lib/", "kernel/"] {
        if path.starts_with(prefix) {
            return true;
        }
    }
    path.starts_with("var/") && !path.starts_with("var/share/")
}

/// SVR4-style startup scripts are superseded by service manifests.
pub(crate) fn check_init_script(action: &DeliveryAction, sink: &mut Diagnostics) {
    if !action.kind().is_placed() {
        return;
    }
    let Some(path) = action.path() else {
        return;
    };
    if is_init_script_path(path) {
        sink.warning(
            INITSCRIPT,
            Some(path),
            format!("SVR4 startup '{path}', deliver an SMF service instead"),
        );
    }
}

/// `etc/init.d` and `etc/rc?.d` (any run level).
fn is_init_script_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix("etc/") else {
        return false;
    };
    if let Some(after) = rest.strip_prefix("init") {
        return after.starts_with(".d");
    }
    if let Some(after) = rest.strip_prefix("rc") {
        let mut chars = after.chars();
        return chars.next().is_some() && chars.as_str().starts_with(".d");
    }
    false
}

pub(crate) fn check_legacy(action: &DeliveryAction, sink: &mut Diagnostics) {
    if action.kind() == &ActionKind::Legacy {
        sink.error(LEGACY, action.path(), "legacy actions are deprecated");
    }
}

/// A writable file must carry a preserve attribute, and only a writable file
/// may carry one.
pub(crate) fn check_preserve(action: &DeliveryAction, sink: &mut Diagnostics) {
    if action.kind() != &ActionKind::File {
        return;
    }
    let Some(path) = action.path() else {
        return;
    };
    let preserved = action.attr("preserve").is_some();

    let Some(mode) = action.attr("mode") else {
        if preserved {
            sink.error(
                PRESERVE,
                Some(path),
                format!("{path} has a preserve attribute, but no mode"),
            );
        }
        return;
    };
    let Ok(bits) = u32::from_str_radix(mode, 8) else {
        sink.error(
            MODE,
            Some(path),
            format!("{path} has unparseable mode '{mode}'"),
        );
        return;
    };

    let writable = bits & 0o222 != 0;
    if writable && !preserved {
        sink.error(
            PRESERVE,
            Some(path),
            format!("{path} is writable ({mode}), but missing a preserve attribute"),
        );
    } else if !writable && preserved {
        sink.error(
            PRESERVE,
            Some(path),
            format!("{path} has a preserve attribute, but is not writable ({mode})"),
        );
    }
}
