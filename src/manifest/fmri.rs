// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Package FMRIs: name, optional publisher, optional comparable version.

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

type Result<T> = std::result::Result<T, FmriError>;

/// Errors that can occur when parsing an FMRI string.
#[derive(Debug, Error)]
pub enum FmriError {
    #[error("FMRI has no package name: {fmri:?}")]
    MissingName { fmri: String },
    #[error("Invalid version {version:?} in FMRI {fmri:?}: {detail}")]
    InvalidVersion {
        fmri: String,
        version: String,
        detail: String,
    },
}

/// A package version: `release[,build][-branch][:timestamp]`.
///
/// Ordering compares the release sequence, then the branch (absent sorts
/// below present), then the timestamp string. The build component is parsed
/// for round-tripping but carries no ordering weight.
#[derive(Debug, Clone)]
pub struct Version {
    release: Vec<u64>,
    build: Option<Vec<u64>>,
    branch: Option<Vec<u64>>,
    timestamp: Option<String>,
}

impl Version {
    /// Parse a version string as it appears after `@` in an FMRI.
    ///
    /// # Errors
    /// Returns an error if any dotted sequence is empty or non-numeric.
    pub fn parse(fmri: &str, version: &str) -> Result<Self> {
        let (body, timestamp) = match version.split_once(':') {
            Some((body, ts)) => (body, Some(ts.to_string())),
            None => (version, None),
        };
        let (relbuild, branch) = match body.split_once('-') {
            Some((rb, br)) => (rb, Some(Self::sequence(fmri, version, br)?)),
            None => (body, None),
        };
        let (release, build) = match relbuild.split_once(',') {
            Some((rel, b)) => (rel, Some(Self::sequence(fmri, version, b)?)),
            None => (relbuild, None),
        };
        Ok(Self {
            release: Self::sequence(fmri, version, release)?,
            build,
            branch,
            timestamp,
        })
    }

    fn sequence(fmri: &str, version: &str, dotted: &str) -> Result<Vec<u64>> {
        dotted
            .split('.')
            .map(|part| {
                part.parse::<u64>().map_err(|_| FmriError::InvalidVersion {
                    fmri: fmri.to_string(),
                    version: version.to_string(),
                    detail: format!("component {part:?} is not a number"),
                })
            })
            .collect()
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.release, &self.branch, &self.timestamp).cmp(&(
            &other.release,
            &other.branch,
            &other.timestamp,
        ))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dotted = |seq: &[u64]| {
            seq.iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(".")
        };
        write!(f, "{}", dotted(&self.release))?;
        if let Some(build) = &self.build {
            write!(f, ",{}", dotted(build))?;
        }
        if let Some(branch) = &self.branch {
            write!(f, "-{}", dotted(branch))?;
        }
        if let Some(ts) = &self.timestamp {
            write!(f, ":{ts}")?;
        }
        Ok(())
    }
}

/// A package identity: name, optional publisher, optional version.
///
/// An absent version means "about to be released, no version pin yet" and
/// ranks strictly newer than any present version of the same package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fmri {
    name: String,
    publisher: Option<String>,
    version: Option<Version>,
}

impl Fmri {
    /// Parse an FMRI of the form `[pkg:/[/publisher/]]name[@version]`.
    ///
    /// # Errors
    /// Returns an error if the package name is empty or the version is
    /// malformed.
    pub fn parse(fmri: &str) -> Result<Self> {
        let trimmed = fmri.trim();
        let (publisher, rest) = if let Some(rest) = trimmed.strip_prefix("pkg://") {
            let (publisher, rest) =
                rest.split_once('/')
                    .ok_or_else(|| FmriError::MissingName {
                        fmri: fmri.to_string(),
                    })?;
            (Some(publisher.to_string()), rest)
        } else if let Some(rest) = trimmed.strip_prefix("pkg:/") {
            (None, rest)
        } else {
            (None, trimmed)
        };

        let (name, version) = match rest.split_once('@') {
            Some((name, version)) => (name, Some(Version::parse(fmri, version)?)),
            None => (rest, None),
        };
        if name.is_empty() {
            return Err(FmriError::MissingName {
                fmri: fmri.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            publisher: publisher.filter(|p| !p.is_empty()),
            version,
        })
    }

    /// Get the package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the publisher, if one was set in the FMRI.
    #[must_use]
    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    /// Get the version, if one was set in the FMRI.
    #[must_use]
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Whether publishing `self` displaces `other` from the repository.
    ///
    /// True when both name the same package (publisher compared only when
    /// `ignore_publisher` is false) and `self`'s version is equal or newer.
    /// An absent version on `self` beats anything; equal versions count as
    /// superseding, since republishing the same version still replaces the
    /// old entry.
    #[must_use]
    pub fn supersedes(&self, other: &Fmri, ignore_publisher: bool) -> bool {
        if self.name != other.name {
            return false;
        }
        if !ignore_publisher && self.publisher != other.publisher {
            return false;
        }
        match (&self.version, &other.version) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(mine), Some(theirs)) => mine >= theirs,
        }
    }
}

impl fmt::Display for Fmri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.publisher {
            Some(publisher) => write!(f, "pkg://{publisher}/{}", self.name)?,
            None => write!(f, "{}", self.name)?,
        }
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmri(s: &str) -> Fmri {
        Fmri::parse(s).expect("test FMRI should parse")
    }

    #[test]
    fn test_parse_bare_name() {
        let f = fmri("library/libfoo");
        assert_eq!(f.name(), "library/libfoo");
        assert_eq!(f.publisher(), None);
        assert!(f.version().is_none());
    }

    #[test]
    fn test_parse_full_fmri() {
        let f = fmri("pkg://solaris/library/libfoo@1.2,5.11-0.175.1:20230101T000000Z");
        assert_eq!(f.name(), "library/libfoo");
        assert_eq!(f.publisher(), Some("solaris"));
        let version = f.version().expect("version should be present");
        assert_eq!(
            version.to_string(),
            "1.2,5.11-0.175.1:20230101T000000Z"
        );
    }

    #[test]
    fn test_parse_scheme_without_publisher() {
        let f = fmri("pkg:/library/libfoo@2.0");
        assert_eq!(f.name(), "library/libfoo");
        assert_eq!(f.publisher(), None);
    }

    #[test]
    fn test_parse_rejects_empty_name() {
        assert!(Fmri::parse("pkg://solaris/").is_err());
        assert!(Fmri::parse("@1.0").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_version() {
        assert!(Fmri::parse("foo@1.x").is_err());
        assert!(Fmri::parse("foo@").is_err());
    }

    #[test]
    fn test_version_ordering() {
        let parse = |v| Version::parse("test", v).unwrap();
        assert!(parse("2.0") > parse("1.9"));
        assert!(parse("1.10") > parse("1.9"));
        assert!(parse("1.0-0.175.2") > parse("1.0-0.175.1"));
        // A branch sorts above no branch at the same release.
        assert!(parse("1.0-0") > parse("1.0"));
        // Timestamps break ties between otherwise equal versions.
        assert!(parse("1.0-0:20230201T000000Z") > parse("1.0-0:20230101T000000Z"));
        // The build component carries no ordering weight.
        assert_eq!(parse("1.0,5.11"), parse("1.0,5.12"));
    }

    #[test]
    fn test_supersedes_newer_and_equal() {
        let old = fmri("foo@1.0");
        let new = fmri("foo@2.0");
        assert!(new.supersedes(&old, true));
        assert!(!old.supersedes(&new, true));
        // Republishing the same version still displaces the old entry.
        assert!(old.supersedes(&fmri("foo@1.0"), true));
    }

    #[test]
    fn test_supersedes_absent_version_ranks_newest() {
        let unversioned = fmri("foo");
        let versioned = fmri("foo@99.9");
        assert!(unversioned.supersedes(&versioned, true));
        assert!(!versioned.supersedes(&unversioned, true));
        // Two unversioned identities displace each other.
        assert!(unversioned.supersedes(&fmri("foo"), true));
    }

    #[test]
    fn test_supersedes_name_and_publisher() {
        let a = fmri("pkg://solaris/foo@2.0");
        let b = fmri("pkg://userland/foo@1.0");
        assert!(!a.supersedes(&fmri("bar@1.0"), true));
        assert!(a.supersedes(&b, true));
        assert!(!a.supersedes(&b, false));
    }

    #[test]
    fn test_strict_successor_is_a_strict_partial_order() {
        // a strictly succeeds b iff a.supersedes(b) and not b.supersedes(a)
        let strict = |a: &Fmri, b: &Fmri| a.supersedes(b, true) && !b.supersedes(a, true);

        let v1 = fmri("foo@1.0");
        let v2 = fmri("foo@2.0");
        let v3 = fmri("foo@3.0");
        let unversioned = fmri("foo");

        // Irreflexive.
        for f in [&v1, &v2, &unversioned] {
            assert!(!strict(f, f), "{f} must not strictly succeed itself");
        }
        // Asymmetric.
        assert!(strict(&v2, &v1) && !strict(&v1, &v2));
        assert!(strict(&unversioned, &v2) && !strict(&v2, &unversioned));
        // Transitive.
        assert!(strict(&v3, &v2) && strict(&v2, &v1) && strict(&v3, &v1));
    }
}
