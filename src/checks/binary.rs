// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Layout rules for delivered binaries: 32/64-bit placement, runpath sanity,
//! and ASLR hardening, driven by [`Inspector`] facts plus the merged path
//! index.

use path_clean::PathClean;
use std::path::PathBuf;

use crate::inspect::{AslrState, BinaryFacts, Inspector, ObjectKind, WordWidth};
use crate::manifest::{ActionKind, DeliveryAction};
use crate::paths::PathIndex;

use super::Diagnostics;

pub(crate) const PLACEMENT: &str = "elf.placement";
pub(crate) const RUNPATH_INVALID: &str = "elf.runpath.invalid";
pub(crate) const RUNPATH_SYMLINKED: &str = "elf.runpath.symlinked";
pub(crate) const RUNPATH_WIDTH: &str = "elf.runpath.width-mismatch";
pub(crate) const ASLR_UNTAGGED: &str = "elf.aslr.untagged";
pub(crate) const ASLR_DISABLED: &str = "elf.aslr.disabled";
pub(crate) const UNREADABLE: &str = "elf.unreadable";
pub(crate) const PROTO_MISSING: &str = "content.proto.missing";

/// Directory names marking 32-bit-only content.
const PATH32: [&str; 5] = [
    "i86",
    "sparcv7",
    "32",
    "i86pc-solaris-64int", // perl path
    "sun4-solaris-64int",  // perl path
];

/// Directory names marking 64-bit-only content.
const PATH64: [&str; 8] = [
    "amd64",
    "sparcv9",
    "64",
    "fbconfig", // gfx-utils path
    "i86pc-solaris-64",
    "sun4-solaris-64",
    "i86pc-solaris-thread-multi-64",
    "sun4-solaris-thread-multi-64",
];

/// Path segments that code a 64-bit library directory inside a runpath.
const RUNPATH64_SEGMENTS: [&str; 7] = [
    "64",
    "amd64",
    "sparcv9",
    "i86pc-solaris-64",
    "sun4-solaris-64",
    "i86pc-solaris-thread-multi-64",
    "sun4-solaris-thread-multi-64",
];

/// Segment prefixes that code a 64-bit directory when followed by an OS
/// release number (perl/ruby/GCC install layouts).
const RUNPATH64_VERSIONED: [&str; 4] = [
    "amd64-solaris2.",
    "sparcv9-solaris2.",
    "sparcv9-sun-solaris2.",
    "x86_64-sun-solaris2.",
];

/// Applies the binary layout rules to file actions whose content exists in
/// the proto area and decodes as a compiled object.
pub(crate) struct BinaryChecker<'a> {
    inspector: &'a dyn Inspector,
    proto_dirs: &'a [PathBuf],
    path32: Vec<String>,
    path64: Vec<String>,
}

impl<'a> BinaryChecker<'a> {
    pub(crate) fn new(
        inspector: &'a dyn Inspector,
        proto_dirs: &'a [PathBuf],
        release: &str,
    ) -> Self {
        let mut path32: Vec<String> = PATH32.iter().map(ToString::to_string).collect();
        path32.push(format!("i386-solaris{release}")); // ruby path
        path32.push(format!("sparc-solaris{release}")); // ruby path

        let mut path64: Vec<String> = PATH64.iter().map(ToString::to_string).collect();
        path64.push(format!("amd64-solaris{release}")); // ruby path
        path64.push(format!("sparcv9-solaris{release}")); // ruby path
        path64.push(format!("sparcv9-sun-solaris{release}")); // ruby path
        path64.push(format!("amd64-solaris-{release}")); // ruby path
        path64.push(format!("sparcv9-solaris-{release}")); // ruby path
        path64.push(format!("x86_64-pc-solaris{release}")); // GCC path

        Self {
            inspector,
            proto_dirs,
            path32,
            path64,
        }
    }

    /// Run the content checks for one file action.
    pub(crate) fn check_file(
        &self,
        action: &DeliveryAction,
        index: &PathIndex<'_>,
        sink: &mut Diagnostics,
    ) {
        let Some(inspath) = action.path() else {
            return;
        };
        // The content lives under the proto area, addressed by hash when the
        // action carries one.
        let content = action.payload().unwrap_or(inspath);
        let Some(full) = self.locate(content) else {
            sink.info(
                PROTO_MISSING,
                Some(inspath),
                format!("{content} missing from proto area, skipping content checks"),
            );
            return;
        };

        if !self.inspector.is_object(&full) {
            return;
        }
        let facts = match self.inspector.inspect(&full) {
            Ok(facts) => facts,
            Err(e) => {
                sink.error(
                    UNREADABLE,
                    Some(inspath),
                    format!("failed to inspect '{}': {e}", full.display()),
                );
                return;
            }
        };

        self.check_placement(&facts, inspath, sink);
        check_runpath(&facts, inspath, index, sink);
        check_hardening(&facts, inspath, sink);
    }

    fn locate(&self, relpath: &str) -> Option<PathBuf> {
        self.proto_dirs
            .iter()
            .map(|dir| dir.join(relpath).clean())
            .find(|candidate| candidate.exists())
    }

    /// Make sure the file sits in a directory matching its word size.
    fn check_placement(&self, facts: &BinaryFacts, inspath: &str, sink: &mut Diagnostics) {
        let dir = dirname(inspath);

        let mut path32 = false;
        let mut path64 = false;
        // Walk the directory segments backward; the innermost 32/64 marker
        // decides and the scan stops.
        for part in dir.rsplit('/') {
            if self.path32.iter().any(|marker| marker == part) {
                path32 = true;
                break;
            }
            if self.path64.iter().any(|marker| marker == part) {
                path64 = true;
                break;
            }
        }

        // The Xorg module tree is a hybrid: everything but the dri
        // subdirectory is 64-bit.
        if dir.starts_with("usr/lib/xorg/modules") && dir != "usr/lib/xorg/modules/dri" {
            path64 = true;
        }

        // 64-bit executables in normal (non-32-bit-specific) locations are
        // fine.
        if facts.kind == ObjectKind::Executable
            && facts.width == WordWidth::Bits64
            && !path32
            && !path64
        {
            return;
        }

        if facts.width == WordWidth::Bits32 && path64 {
            sink.error(
                PLACEMENT,
                Some(inspath),
                format!("32-bit object '{inspath}' in 64-bit path '{dir}'"),
            );
        } else if facts.width == WordWidth::Bits64 && !path64 {
            sink.error(
                PLACEMENT,
                Some(inspath),
                format!("64-bit object '{inspath}' in 32-bit path"),
            );
        }
    }
}

/// Verify the runpath entries of one binary.
fn check_runpath(
    facts: &BinaryFacts,
    inspath: &str,
    index: &PathIndex<'_>,
    sink: &mut Diagnostics,
) {
    let mut bad: Vec<&str> = Vec::new();
    let mut scanned_any = false;
    let mut saw_64 = false;

    for entry in &facts.runpath {
        if entry.is_empty() {
            continue;
        }
        scanned_any = true;

        if !allowed_prefix(entry) {
            bad.push(entry);
        } else if !entry.starts_with("$ORIGIN/") {
            // $ORIGIN entries are the linker's business; everything else
            // must resolve against a packaged path. Strip the slashes since
            // index keys carry none.
            let key = entry.trim_matches('/');
            if !index.covers(key) && !crosses_symlink(key, entry, inspath, index, sink) {
                bad.push(entry);
            }
        }

        if runpath_is_64bit(entry) {
            match facts.width {
                WordWidth::Bits32 => sink.warning(
                    RUNPATH_WIDTH,
                    Some(inspath),
                    format!("64-bit runpath in 32-bit binary, '{inspath}' includes '{entry}'"),
                ),
                WordWidth::Bits64 => saw_64 = true,
            }
        }
    }

    if facts.width == WordWidth::Bits64 && scanned_any && !saw_64 {
        sink.warning(
            RUNPATH_WIDTH,
            Some(inspath),
            format!("no 64-bit runpath entry in 64-bit binary '{inspath}'"),
        );
    }

    // All incorrect entries aggregate into a single error.
    if !bad.is_empty() {
        sink.error(
            RUNPATH_INVALID,
            Some(inspath),
            format!("bad runpath, '{inspath}' includes '{}'", bad.join(":")),
        );
    }
}

/// Last-resort runpath salvage: an unresolved entry may still cross a
/// packaged symlink (e.g. usr/openwin/lib when usr/openwin -> X11 and
/// usr/X11/lib are packaged but usr/openwin/lib is not). This is a
/// heuristic, so it warns rather than resolving the entry.
fn crosses_symlink(
    key: &str,
    entry: &str,
    inspath: &str,
    index: &PathIndex<'_>,
    sink: &mut Diagnostics,
) -> bool {
    let mut parent = dirname(key);
    while !parent.is_empty() {
        let is_link = index
            .first_claim(parent)
            .is_some_and(|(_, action)| action.kind() == &ActionKind::Link);
        if is_link {
            sink.warning(
                RUNPATH_SYMLINKED,
                Some(inspath),
                format!(
                    "runpath '{entry}' in '{inspath}' not found in packaged paths \
                     but contains symlink at '{parent}'"
                ),
            );
            return true;
        }
        parent = dirname(parent);
    }
    false
}

/// Flag executables that are not (fully) opted into address-space layout
/// randomization. Shared objects and other kinds are exempt.
fn check_hardening(facts: &BinaryFacts, inspath: &str, sink: &mut Diagnostics) {
    if facts.kind != ObjectKind::Executable {
        return;
    }
    match facts.aslr {
        AslrState::Absent => sink.error(
            ASLR_UNTAGGED,
            Some(inspath),
            format!("'{inspath}' is not tagged for aslr"),
        ),
        AslrState::Disabled => sink.warning(
            ASLR_DISABLED,
            Some(inspath),
            format!("'{inspath}' does not have aslr enabled"),
        ),
        AslrState::Enabled => {}
    }
}

fn dirname(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

fn allowed_prefix(entry: &str) -> bool {
    entry == "/lib"
        || entry.starts_with("/lib/")
        || entry.starts_with("/usr/")
        || entry.starts_with("$ORIGIN/")
}

/// Whether a runpath entry names a 64-bit library directory: a 64-bit-coded
/// segment anywhere past the first, or one of the fixed 64-bit directories.
fn runpath_is_64bit(entry: &str) -> bool {
    let mut segments = entry.split('/');
    segments.next();
    for segment in segments {
        if RUNPATH64_SEGMENTS.contains(&segment) {
            return true;
        }
        let versioned = RUNPATH64_VERSIONED.iter().any(|prefix| {
            segment
                .strip_prefix(prefix)
                .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        });
        if versioned {
            return true;
        }
    }
    matches!(
        entry,
        "/usr/lib/fbconfig"
            | "/usr/lib/fbconfig/"
            | "/usr/lib/xorg/modules"
            | "/usr/lib/xorg/modules/"
            | "/usr/lib/xorg/modules/drivers"
            | "/usr/lib/xorg/modules/extensions"
            | "/usr/lib/xorg/modules/input"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{Diagnostic, Severity};
    use crate::inspect::InspectError;
    use crate::manifest::Manifest;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Inspector fed with canned facts, keyed by proto-area path.
    #[derive(Default)]
    struct FakeInspector {
        facts: HashMap<PathBuf, BinaryFacts>,
    }

    impl Inspector for FakeInspector {
        fn is_object(&self, path: &Path) -> bool {
            self.facts.contains_key(path)
        }

        fn inspect(&self, path: &Path) -> Result<BinaryFacts, InspectError> {
            self.facts
                .get(path)
                .cloned()
                .ok_or_else(|| InspectError::NotAnObject {
                    path: path.to_path_buf(),
                })
        }
    }

    fn facts(width: WordWidth, kind: ObjectKind, runpath: &[&str], aslr: AslrState) -> BinaryFacts {
        BinaryFacts {
            width,
            kind,
            runpath: runpath.iter().map(ToString::to_string).collect(),
            aslr,
        }
    }

    /// Deliver `inspath` with the given facts into a scratch proto area and
    /// run the checks against an index of the given delivered paths.
    fn run_check(inspath: &str, object: Option<BinaryFacts>, delivered: &[&str]) -> Vec<Diagnostic> {
        let proto = TempDir::new().unwrap();
        let full = proto.path().join(inspath);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(&full, b"content").unwrap();

        let mut inspector = FakeInspector::default();
        if let Some(object) = object {
            inspector.facts.insert(full.clean(), object);
        }

        let lines: Vec<String> = delivered.iter().map(|a| a.to_string()).collect();
        let text = format!(
            "set name=pkg.fmri value=base@1.0\n{}\n",
            lines.join("\n")
        );
        let base = Manifest::parse(&text).unwrap();
        let index = PathIndex::build([&base]);

        let action_manifest = Manifest::parse(&format!(
            "set name=pkg.fmri value=subject@1.0\nfile NOHASH path={inspath}\n"
        ))
        .unwrap();

        let proto_dirs = [proto.path().to_path_buf()];
        let checker = BinaryChecker::new(&inspector, &proto_dirs, "2.11");
        let mut sink = Diagnostics::new();
        checker.check_file(&action_manifest.actions()[1], &index, &mut sink);
        sink.into_items()
    }

    fn ids(items: &[Diagnostic]) -> Vec<&'static str> {
        items.iter().map(|d| d.id).collect()
    }

    #[test]
    fn test_missing_content_is_informational() {
        let proto = TempDir::new().unwrap();
        let inspector = FakeInspector::default();
        let proto_dirs = [proto.path().to_path_buf()];
        let checker = BinaryChecker::new(&inspector, &proto_dirs, "2.11");

        let manifest = Manifest::parse(
            "set name=pkg.fmri value=subject@1.0\nfile NOHASH path=usr/bin/ghost\n",
        )
        .unwrap();
        let empty = PathIndex::build(std::iter::empty());
        let mut sink = Diagnostics::new();
        checker.check_file(&manifest.actions()[1], &empty, &mut sink);

        let items = sink.into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].severity, Severity::Info);
        assert_eq!(items[0].id, PROTO_MISSING);
    }

    #[test]
    fn test_non_object_content_is_exempt() {
        let items = run_check("usr/bin/script", None, &[]);
        assert!(items.is_empty());
    }

    #[test]
    fn test_32bit_object_in_64bit_path() {
        let items = run_check(
            "usr/lib/amd64/libfoo.so.1",
            Some(facts(
                WordWidth::Bits32,
                ObjectKind::SharedObject,
                &[],
                AslrState::Absent,
            )),
            &[],
        );
        assert_eq!(ids(&items), [PLACEMENT]);
        assert!(items[0].message.contains("32-bit object"));
    }

    #[test]
    fn test_64bit_object_without_marker() {
        let items = run_check(
            "usr/lib/libfoo.so.1",
            Some(facts(
                WordWidth::Bits64,
                ObjectKind::SharedObject,
                &["/usr/lib/64"],
                AslrState::Absent,
            )),
            &["dir path=usr/lib/64"],
        );
        assert_eq!(ids(&items), [PLACEMENT]);
        assert!(items[0].message.contains("64-bit object"));
    }

    #[test]
    fn test_64bit_executable_without_marker_is_exempt() {
        let items = run_check(
            "usr/bin/foo",
            Some(facts(
                WordWidth::Bits64,
                ObjectKind::Executable,
                &["/usr/lib/64"],
                AslrState::Enabled,
            )),
            &["dir path=usr/lib/64"],
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_32bit_object_in_32bit_marker_path_is_fine() {
        let items = run_check(
            "usr/lib/i86/libfoo.so.1",
            Some(facts(
                WordWidth::Bits32,
                ObjectKind::SharedObject,
                &[],
                AslrState::Absent,
            )),
            &[],
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_innermost_marker_wins() {
        // usr/lib/64/32 reads as 32-bit: the innermost marker decides.
        let items = run_check(
            "usr/lib/64/32/libfoo.so.1",
            Some(facts(
                WordWidth::Bits32,
                ObjectKind::SharedObject,
                &[],
                AslrState::Absent,
            )),
            &[],
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_versioned_ruby_marker() {
        let items = run_check(
            "usr/ruby/lib/i386-solaris2.11/libr.so",
            Some(facts(
                WordWidth::Bits64,
                ObjectKind::SharedObject,
                &["/usr/lib/64"],
                AslrState::Absent,
            )),
            &["dir path=usr/lib/64"],
        );
        // A 64-bit object below a 32-bit ruby directory is misplaced.
        assert_eq!(ids(&items), [PLACEMENT]);
    }

    #[test]
    fn test_xorg_module_tree_is_64bit() {
        let items = run_check(
            "usr/lib/xorg/modules/drivers/vesa.so",
            Some(facts(
                WordWidth::Bits32,
                ObjectKind::SharedObject,
                &[],
                AslrState::Absent,
            )),
            &[],
        );
        assert_eq!(ids(&items), [PLACEMENT]);
    }

    #[test]
    fn test_xorg_dri_subdirectory_stays_32bit() {
        let items = run_check(
            "usr/lib/xorg/modules/dri/swrast.so",
            Some(facts(
                WordWidth::Bits32,
                ObjectKind::SharedObject,
                &[],
                AslrState::Absent,
            )),
            &[],
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_disallowed_runpath_entries_aggregate_into_one_error() {
        let items = run_check(
            "usr/lib/amd64/libfoo.so.1",
            Some(facts(
                WordWidth::Bits64,
                ObjectKind::SharedObject,
                &["/opt/csw/lib/64", "/export/home/lib/64", "/usr/lib/64"],
                AslrState::Absent,
            )),
            &["dir path=usr/lib/64"],
        );
        assert_eq!(ids(&items), [RUNPATH_INVALID]);
        assert!(items[0].message.contains("/opt/csw/lib/64:/export/home/lib/64"));
        assert!(!items[0].message.contains("/usr/lib/64:"));
    }

    #[test]
    fn test_origin_runpath_is_exempt_from_membership() {
        let items = run_check(
            "usr/lib/amd64/libfoo.so.1",
            Some(facts(
                WordWidth::Bits64,
                ObjectKind::SharedObject,
                &["$ORIGIN/../amd64"],
                AslrState::Absent,
            )),
            &[],
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_unpackaged_runpath_goes_bad() {
        let items = run_check(
            "usr/lib/amd64/libfoo.so.1",
            Some(facts(
                WordWidth::Bits64,
                ObjectKind::SharedObject,
                &["/usr/gnu/lib/amd64"],
                AslrState::Absent,
            )),
            &["dir path=usr/lib"],
        );
        assert_eq!(ids(&items), [RUNPATH_INVALID]);
    }

    #[test]
    fn test_runpath_resolving_via_child_delivery() {
        let items = run_check(
            "usr/lib/amd64/libfoo.so.1",
            Some(facts(
                WordWidth::Bits64,
                ObjectKind::SharedObject,
                &["/usr/gnu/lib/amd64"],
                AslrState::Absent,
            )),
            &["file NOHASH path=usr/gnu/lib/amd64/libbar.so.1"],
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_runpath_crossing_packaged_symlink_warns() {
        let items = run_check(
            "usr/lib/amd64/libfoo.so.1",
            Some(facts(
                WordWidth::Bits64,
                ObjectKind::SharedObject,
                &["/usr/openwin/lib/amd64"],
                AslrState::Absent,
            )),
            &["link path=usr/openwin target=X11"],
        );
        assert_eq!(ids(&items), [RUNPATH_SYMLINKED]);
        assert_eq!(items[0].severity, Severity::Warning);
        assert!(items[0].message.contains("usr/openwin"));
    }

    #[test]
    fn test_64bit_runpath_in_32bit_binary_warns_per_entry() {
        let items = run_check(
            "usr/lib/libfoo.so.1",
            Some(facts(
                WordWidth::Bits32,
                ObjectKind::SharedObject,
                &["/usr/lib/amd64", "/usr/lib/sparcv9"],
                AslrState::Absent,
            )),
            &[
                "dir path=usr/lib/amd64",
                "dir path=usr/lib/sparcv9",
            ],
        );
        let width_warnings: Vec<_> = items.iter().filter(|d| d.id == RUNPATH_WIDTH).collect();
        assert_eq!(width_warnings.len(), 2);
    }

    #[test]
    fn test_64bit_binary_without_64bit_runpath_warns_once() {
        let items = run_check(
            "usr/lib/amd64/libfoo.so.1",
            Some(facts(
                WordWidth::Bits64,
                ObjectKind::SharedObject,
                &["/usr/lib", "/lib"],
                AslrState::Absent,
            )),
            &["dir path=usr/lib", "dir path=lib"],
        );
        assert_eq!(ids(&items), [RUNPATH_WIDTH]);
        assert!(items[0].message.contains("no 64-bit runpath"));
    }

    #[test]
    fn test_64bit_binary_with_empty_runpath_does_not_warn() {
        let items = run_check(
            "usr/lib/amd64/libfoo.so.1",
            Some(facts(
                WordWidth::Bits64,
                ObjectKind::SharedObject,
                &[],
                AslrState::Absent,
            )),
            &[],
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_untagged_executable_is_an_error() {
        let items = run_check(
            "usr/bin/amd64/foo",
            Some(facts(
                WordWidth::Bits64,
                ObjectKind::Executable,
                &["/usr/lib/amd64"],
                AslrState::Absent,
            )),
            &["dir path=usr/lib/amd64"],
        );
        assert_eq!(ids(&items), [ASLR_UNTAGGED]);
        assert_eq!(items[0].severity, Severity::Error);
    }

    #[test]
    fn test_disabled_aslr_is_exactly_one_warning() {
        let items = run_check(
            "usr/bin/amd64/foo",
            Some(facts(
                WordWidth::Bits64,
                ObjectKind::Executable,
                &["/usr/lib/amd64"],
                AslrState::Disabled,
            )),
            &["dir path=usr/lib/amd64"],
        );
        assert_eq!(ids(&items), [ASLR_DISABLED]);
        assert_eq!(items[0].severity, Severity::Warning);
    }

    #[test]
    fn test_shared_objects_are_exempt_from_hardening() {
        let items = run_check(
            "usr/lib/amd64/libfoo.so.1",
            Some(facts(
                WordWidth::Bits64,
                ObjectKind::SharedObject,
                &["/usr/lib/amd64"],
                AslrState::Absent,
            )),
            &["dir path=usr/lib/amd64"],
        );
        assert!(items.is_empty());
    }

    #[test]
    fn test_runpath_64bit_token_detection() {
        assert!(runpath_is_64bit("/usr/lib/64"));
        assert!(runpath_is_64bit("/usr/lib/amd64/mysql"));
        assert!(runpath_is_64bit("$ORIGIN/../64"));
        assert!(runpath_is_64bit("/usr/ruby/lib/sparcv9-solaris2.11"));
        assert!(runpath_is_64bit("/usr/lib/fbconfig"));
        assert!(runpath_is_64bit("/usr/lib/xorg/modules/drivers"));
        assert!(!runpath_is_64bit("/usr/lib"));
        assert!(!runpath_is_64bit("/usr/lib/644"));
        // A bare leading segment does not count.
        assert!(!runpath_is_64bit("64"));
        assert!(!runpath_is_64bit("/usr/ruby/lib/sparcv9-solaris2.x"));
    }

    #[test]
    fn test_allowed_prefixes() {
        assert!(allowed_prefix("/lib"));
        assert!(allowed_prefix("/lib/secure"));
        assert!(allowed_prefix("/usr/lib/mysql"));
        assert!(allowed_prefix("$ORIGIN/../lib"));
        assert!(!allowed_prefix("/libexec"));
        assert!(!allowed_prefix("/opt/csw/lib"));
        assert!(!allowed_prefix("$ORIGIN"));
        assert!(!allowed_prefix("lib"));
    }
}
