// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Manifest model: delivery actions, their attributes, and the owning manifest.

mod fmri;
mod parse;

use std::collections::BTreeMap;

pub use fmri::{Fmri, FmriError, Version};
pub use parse::ParseError;

/// The type of a delivery action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    File,
    Dir,
    Link,
    Hardlink,
    License,
    Legacy,
    /// Any other action type (`set`, `depend`, ...), kept for manifest-level
    /// checks but never placed on disk.
    Other(String),
}

impl ActionKind {
    fn from_name(name: &str) -> Self {
        match name {
            "file" => Self::File,
            "dir" => Self::Dir,
            "link" => Self::Link,
            "hardlink" => Self::Hardlink,
            "license" => Self::License,
            "legacy" => Self::Legacy,
            other => Self::Other(other.to_string()),
        }
    }

    /// The action type name as it appears in a manifest.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File => "file",
            Self::Dir => "dir",
            Self::Link => "link",
            Self::Hardlink => "hardlink",
            Self::License => "license",
            Self::Legacy => "legacy",
            Self::Other(name) => name,
        }
    }

    /// Whether actions of this type place an object at a path.
    #[must_use]
    pub fn is_placed(&self) -> bool {
        matches!(self, Self::File | Self::Dir | Self::Link | Self::Hardlink)
    }
}

/// An attribute value: a single string, or an ordered list when the key is
/// repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    One(String),
    Many(Vec<String>),
}

impl AttrValue {
    fn push(&mut self, value: String) {
        match self {
            Self::One(first) => {
                *self = Self::Many(vec![std::mem::take(first), value]);
            }
            Self::Many(values) => values.push(value),
        }
    }

    /// All values, in manifest order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }
}

/// A single declared unit of content placement or metadata within a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryAction {
    kind: ActionKind,
    payload: Option<String>,
    attrs: BTreeMap<String, AttrValue>,
}

impl DeliveryAction {
    pub(crate) fn new(
        kind: ActionKind,
        payload: Option<String>,
        attrs: BTreeMap<String, AttrValue>,
    ) -> Self {
        Self {
            kind,
            payload,
            attrs,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// The positional payload token (content hash), if any. `NOHASH` is
    /// normalized away at parse time.
    #[must_use]
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// First value of the named attribute.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .get(name)
            .map(|value| value.values()[0].as_str())
    }

    /// All values of the named attribute, empty if absent.
    #[must_use]
    pub fn attr_values(&self, name: &str) -> &[String] {
        self.attrs.get(name).map_or(&[], AttrValue::values)
    }

    /// The full attribute map.
    #[must_use]
    pub fn attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.attrs
    }

    /// The delivered path, for placed objects.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.attr("path")
    }

    /// The link target, for link and hardlink actions.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.attr("target")
    }

    /// Variant attributes declared directly on this action.
    pub fn variants(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.attrs
            .iter()
            .filter(|(key, _)| key.starts_with("variant."))
            .map(|(key, value)| (key.as_str(), value.values()))
    }
}

/// A parsed manifest: identity, ordered actions, and manifest-level variants.
pub struct Manifest {
    fmri: Fmri,
    actions: Vec<DeliveryAction>,
    variants: BTreeMap<String, Vec<String>>,
}

impl Manifest {
    pub(crate) fn new(
        fmri: Fmri,
        actions: Vec<DeliveryAction>,
        variants: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            fmri,
            actions,
            variants,
        }
    }

    #[must_use]
    pub fn fmri(&self) -> &Fmri {
        &self.fmri
    }

    #[must_use]
    pub fn actions(&self) -> &[DeliveryAction] {
        &self.actions
    }

    /// Manifest-level variant values (`set name=variant.arch value=...`).
    #[must_use]
    pub fn variants(&self) -> &BTreeMap<String, Vec<String>> {
        &self.variants
    }

    /// The variant values this action applies under: the action's declared
    /// variants layered over the manifest's. A variant neither side mentions
    /// is unrestricted ("don't care").
    #[must_use]
    pub fn effective_variants<'m>(
        &'m self,
        action: &'m DeliveryAction,
    ) -> BTreeMap<&'m str, &'m [String]> {
        let mut merged: BTreeMap<&str, &[String]> = self
            .variants
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
            .collect();
        for (key, values) in action.variants() {
            merged.insert(key, values);
        }
        merged
    }
}
