// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Whole-manifest checks: license presence, publisher allow-list,
//! architecture agreement, and unexpanded build variables.

use crate::manifest::{ActionKind, Manifest};

use super::{CheckConfig, Diagnostics};

pub(crate) const LICENSE: &str = "manifest.license.missing";
pub(crate) const PUBLISHER: &str = "manifest.publisher";
pub(crate) const ARCH: &str = "manifest.arch";
pub(crate) const UNEXPANDED: &str = "manifest.unexpanded-variable";

pub(crate) fn check_manifest(manifest: &Manifest, config: &CheckConfig, sink: &mut Diagnostics) {
    check_license(manifest, sink);
    check_publisher(manifest, config, sink);
    check_arch(manifest, config, sink);
    check_unexpanded(manifest, sink);
}

/// A manifest that delivers files must also deliver a license.
fn check_license(manifest: &Manifest, sink: &mut Diagnostics) {
    let kinds = |kind: ActionKind| manifest.actions().iter().any(|a| a.kind() == &kind);
    if !kinds(ActionKind::File) {
        return;
    }
    if !kinds(ActionKind::License) {
        sink.error(
            LICENSE,
            None,
            format!("{} delivers files but no license action", manifest.fmri()),
        );
    }
}

/// Opt-in: with an allow-list configured, a manifest naming a publisher
/// outside it is refused.
fn check_publisher(manifest: &Manifest, config: &CheckConfig, sink: &mut Diagnostics) {
    if config.allowed_publishers.is_empty() {
        return;
    }
    let Some(publisher) = manifest.fmri().publisher() else {
        return;
    };
    if !config.allowed_publishers.iter().any(|p| p == publisher) {
        sink.error(
            PUBLISHER,
            None,
            format!(
                "package {} has publisher '{publisher}' outside the allowed set",
                manifest.fmri()
            ),
        );
    }
}

/// Opt-in: every `variant.arch` restriction, at manifest and action level,
/// must name exactly the architecture being published.
fn check_arch(manifest: &Manifest, config: &CheckConfig, sink: &mut Diagnostics) {
    let Some(arch) = &config.arch else {
        return;
    };

    if let Some(values) = manifest.variants().get("variant.arch") {
        if !matches_arch(values, arch) {
            sink.error(
                ARCH,
                None,
                format!(
                    "package {} is being published for wrong architecture {values:?} instead of {arch}",
                    manifest.fmri()
                ),
            );
        }
    }

    for action in manifest.actions() {
        for (key, values) in action.variants() {
            if key == "variant.arch" && !matches_arch(values, arch) {
                sink.error(
                    ARCH,
                    action.path(),
                    format!(
                        "{} contains a {} action with wrong architecture {values:?} instead of {arch}",
                        manifest.fmri(),
                        action.kind().name()
                    ),
                );
            }
        }
    }
}

fn matches_arch(values: &[String], arch: &str) -> bool {
    !values.is_empty() && values.iter().all(|value| value == arch)
}

/// `$(...)` in any attribute value is a build-system variable the publish
/// pipeline failed to expand.
fn check_unexpanded(manifest: &Manifest, sink: &mut Diagnostics) {
    for action in manifest.actions() {
        for (key, value) in action.attrs() {
            for single in value.values() {
                if single.contains("$(") {
                    sink.error(
                        UNEXPANDED,
                        action.path(),
                        format!(
                            "unexpanded variable in {}: {} {key}={single}",
                            manifest.fmri(),
                            action.kind().name()
                        ),
                    );
                }
            }
        }
    }
}
