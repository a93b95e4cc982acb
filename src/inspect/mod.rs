// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Binary introspection: what the layout checker needs to know about one
//! compiled object, behind a narrow capability trait.

mod aslr;
mod elf;

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use elf::ElfInspector;

/// Errors that can occur when decoding a compiled object.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("File is too small to be an object file: {path:?}")]
    FileTooSmall { path: PathBuf },
    #[error("File is not an object file: {path:?}")]
    NotAnObject { path: PathBuf },
    #[error("Failed to open file: {path:?}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read file: {path:?}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse object file: {path:?}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: goblin::error::Error,
    },
}

/// Word size of a compiled object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordWidth {
    Bits32,
    Bits64,
}

impl WordWidth {
    /// Numeric bit width, for messages.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }
}

/// Object type, as far as the layout rules care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Executable,
    SharedObject,
    Other,
}

/// State of the ASLR hardening tag in an executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AslrState {
    /// No tag present; a failed probe also lands here.
    Absent,
    /// Tagged, but randomization not enabled.
    Disabled,
    Enabled,
}

/// Everything the layout checker consumes about one object file.
///
/// Derived fresh per file; never cached across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryFacts {
    pub width: WordWidth,
    pub kind: ObjectKind,
    /// Raw runpath entries in search order; may contain `$ORIGIN`.
    pub runpath: Vec<String>,
    pub aslr: AslrState,
}

/// Capability interface for loading and decoding object files, so the layout
/// rules can be driven with synthetic facts in tests.
pub trait Inspector {
    /// Cheap check whether the file is a compiled object at all.
    fn is_object(&self, path: &Path) -> bool;

    /// Decode the file and probe its hardening state.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded. A failed
    /// hardening probe is not an error; it reports [`AslrState::Absent`].
    fn inspect(&self, path: &Path) -> Result<BinaryFacts, InspectError>;
}
