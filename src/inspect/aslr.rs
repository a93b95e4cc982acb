// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! External probe for the ASLR dynamic tag, via `elfedit -r -e dyn:sunw_aslr`.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

use super::AslrState;

/// Default timeout for one probe subprocess.
pub(crate) const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Probe the ASLR tag of an executable.
///
/// A probe that cannot run, times out, or exits non-zero means the binary
/// carries no tag at all; that is a diagnosable state, never an error. On
/// success the tag is enabled when the printed value says `ENABLE`.
pub(crate) fn probe(elfedit: &Path, binary: &Path, timeout: Duration) -> AslrState {
    let mut child = match Command::new(elfedit)
        .arg("-r")
        .arg("-e")
        .arg("dyn:sunw_aslr")
        .arg(binary)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .stdin(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(_) => return AslrState::Absent,
    };

    match child.wait_timeout(timeout) {
        Ok(Some(status)) if status.success() => {
            let mut output = String::new();
            if let Some(mut stdout) = child.stdout.take() {
                let _ = stdout.read_to_string(&mut output);
            }
            if output.contains("ENABLE") {
                AslrState::Enabled
            } else {
                AslrState::Disabled
            }
        }
        // Non-zero exit: no tag was found.
        Ok(Some(_)) => AslrState::Absent,
        // Timeout: kill the probe and treat the tag as absent.
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            AslrState::Absent
        }
        Err(_) => AslrState::Absent,
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Write an executable shell script standing in for elfedit.
    fn fake_elfedit(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_probe_enabled() {
        let dir = TempDir::new().unwrap();
        let elfedit = fake_elfedit(&dir, "elfedit", "echo '  dyn:sunw_aslr  0x2  ENABLE'");
        let state = probe(&elfedit, Path::new("/bin/true"), DEFAULT_PROBE_TIMEOUT);
        assert_eq!(state, AslrState::Enabled);
    }

    #[test]
    fn test_probe_disabled() {
        let dir = TempDir::new().unwrap();
        let elfedit = fake_elfedit(&dir, "elfedit", "echo '  dyn:sunw_aslr  0x1  DISABLE'");
        let state = probe(&elfedit, Path::new("/bin/true"), DEFAULT_PROBE_TIMEOUT);
        assert_eq!(state, AslrState::Disabled);
    }

    #[test]
    fn test_probe_nonzero_exit_means_untagged() {
        let dir = TempDir::new().unwrap();
        let elfedit = fake_elfedit(&dir, "elfedit", "exit 1");
        let state = probe(&elfedit, Path::new("/bin/true"), DEFAULT_PROBE_TIMEOUT);
        assert_eq!(state, AslrState::Absent);
    }

    #[test]
    fn test_probe_missing_binary_means_untagged() {
        let state = probe(
            Path::new("/nonexistent/elfedit"),
            Path::new("/bin/true"),
            DEFAULT_PROBE_TIMEOUT,
        );
        assert_eq!(state, AslrState::Absent);
    }

    #[test]
    fn test_probe_timeout_means_untagged() {
        let dir = TempDir::new().unwrap();
        let elfedit = fake_elfedit(&dir, "elfedit", "sleep 5; echo ENABLE");
        let state = probe(&elfedit, Path::new("/bin/true"), Duration::from_millis(100));
        assert_eq!(state, AslrState::Absent);
    }
}
