// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! ELF-backed [`Inspector`]: decodes headers and the dynamic section with the
//! `goblin` crate and probes the ASLR tag through `elfedit`.

use goblin::elf::Elf as GoblinElf;
use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::aslr;
use super::{AslrState, BinaryFacts, InspectError, Inspector, ObjectKind, WordWidth};

type Result<T> = std::result::Result<T, InspectError>;

// ELF magic bytes: 0x7f followed by ASCII "ELF".
// Defined in the ELF specification: e_ident[EI_MAG0..EI_MAG3].
const ELF_MAGIC: [u8; 4] = [0x7f, 0x45, 0x4c, 0x46];

/// Production inspector backed by `goblin` and an external `elfedit` binary.
pub struct ElfInspector {
    elfedit: PathBuf,
    probe_timeout: Duration,
}

impl ElfInspector {
    /// Create an inspector probing ASLR tags through the given `elfedit`.
    #[must_use]
    pub fn new(elfedit: PathBuf) -> Self {
        Self {
            elfedit,
            probe_timeout: aslr::DEFAULT_PROBE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Reads the entire file at path into bytes if the file is an ELF file.
    fn read(path: &Path) -> Result<Vec<u8>> {
        let metadata = fs::metadata(path).map_err(|e| InspectError::OpenFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        // Must be at least the ELF header size.
        if metadata.len() < 64 {
            return Err(InspectError::FileTooSmall {
                path: path.to_path_buf(),
            });
        }

        let mut file = fs::File::open(path).map_err(|e| InspectError::OpenFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)
            .map_err(|e| InspectError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        if magic != ELF_MAGIC {
            return Err(InspectError::NotAnObject {
                path: path.to_path_buf(),
            });
        }

        // Reset to the beginning and read the whole file; goblin wants it all.
        file.seek(std::io::SeekFrom::Start(0))
            .map_err(|e| InspectError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| InspectError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(bytes)
    }

    /// Collect the colon-separated entries of one dynamic string-table value.
    fn split_search_path(value: &str) -> Vec<String> {
        value
            .split(':')
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Inspector for ElfInspector {
    fn is_object(&self, path: &Path) -> bool {
        let Ok(mut file) = fs::File::open(path) else {
            return false;
        };
        let mut magic = [0u8; 4];
        file.read_exact(&mut magic).is_ok() && magic == ELF_MAGIC
    }

    fn inspect(&self, path: &Path) -> Result<BinaryFacts> {
        let bytes = Self::read(path)?;
        let elf = GoblinElf::parse(&bytes).map_err(|e| InspectError::ParseFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut rpath = Vec::new();
        let mut runpath = Vec::new();
        if let Some(dynamic) = &elf.dynamic {
            for dyn_entry in &dynamic.dyns {
                let value = usize::try_from(dyn_entry.d_val)
                    .ok()
                    .and_then(|idx| elf.dynstrtab.get_at(idx));
                let Some(value) = value else {
                    continue;
                };
                match dyn_entry.d_tag {
                    goblin::elf::dynamic::DT_RPATH => {
                        rpath.extend(Self::split_search_path(value));
                    }
                    goblin::elf::dynamic::DT_RUNPATH => {
                        runpath.extend(Self::split_search_path(value));
                    }
                    _ => {}
                }
            }
        }
        // RUNPATH wins over RPATH when both are present.
        if runpath.is_empty() {
            runpath = rpath;
        }

        let kind = match elf.header.e_type {
            goblin::elf::header::ET_EXEC => ObjectKind::Executable,
            goblin::elf::header::ET_DYN => ObjectKind::SharedObject,
            _ => ObjectKind::Other,
        };
        let width = if elf.is_64 {
            WordWidth::Bits64
        } else {
            WordWidth::Bits32
        };
        // Only executables carry the tag; skip the subprocess otherwise.
        let aslr = if kind == ObjectKind::Executable {
            aslr::probe(&self.elfedit, path, self.probe_timeout)
        } else {
            AslrState::Absent
        };

        Ok(BinaryFacts {
            width,
            kind,
            runpath,
            aslr,
        })
    }
}
