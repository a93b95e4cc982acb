// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Line-oriented manifest parser: `kind [payload] key=value ...` with quoted
//! values, trailing-backslash continuation, and `#` comment lines.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::fmri::{Fmri, FmriError};
use super::{ActionKind, AttrValue, DeliveryAction, Manifest};

type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur when reading or parsing a manifest.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read manifest: {path:?}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Manifest line {line}: unterminated quote")]
    UnterminatedQuote { line: usize },
    #[error("Manifest line {line}: unexpected bare token {token:?}")]
    UnexpectedToken { line: usize, token: String },
    #[error("Manifest line {line}: attribute {token:?} has an empty key")]
    EmptyKey { line: usize, token: String },
    #[error("Manifest has no pkg.fmri attribute")]
    MissingFmri,
    #[error(transparent)]
    Fmri(#[from] FmriError),
}

impl Manifest {
    /// Read and parse a manifest file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or any line is malformed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ParseError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&text)
    }

    /// Parse manifest text.
    ///
    /// # Errors
    /// Returns an error if any action line is malformed or the manifest
    /// carries no (or an invalid) `pkg.fmri` attribute.
    pub fn parse(text: &str) -> Result<Self> {
        let mut actions = Vec::new();
        let mut pending = String::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            if let Some(stripped) = raw.trim_end().strip_suffix('\\') {
                pending.push_str(stripped);
                pending.push(' ');
                continue;
            }
            pending.push_str(raw);
            let full = std::mem::take(&mut pending);
            let trimmed = full.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            actions.push(parse_action(trimmed, line)?);
        }
        // A trailing backslash on the last line continues into nothing.
        let trimmed = pending.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            actions.push(parse_action(trimmed, text.lines().count())?);
        }

        Self::assemble(actions)
    }

    fn assemble(actions: Vec<DeliveryAction>) -> Result<Self> {
        let mut fmri = None;
        let mut variants = BTreeMap::new();

        for action in &actions {
            if action.kind().name() != "set" {
                continue;
            }
            match action.attr("name") {
                Some("pkg.fmri") => {
                    if let Some(value) = action.attr("value") {
                        fmri = Some(Fmri::parse(value)?);
                    }
                }
                Some(name) if name.starts_with("variant.") => {
                    variants.insert(name.to_string(), action.attr_values("value").to_vec());
                }
                _ => {}
            }
        }

        let fmri = fmri.ok_or(ParseError::MissingFmri)?;
        Ok(Self::new(fmri, actions, variants))
    }
}

fn parse_action(line: &str, lineno: usize) -> Result<DeliveryAction> {
    let tokens = tokenize(line, lineno)?;
    // tokenize never returns an empty list for a non-blank line
    let kind = ActionKind::from_name(&tokens[0]);

    let mut payload = None;
    let mut attrs: BTreeMap<String, AttrValue> = BTreeMap::new();
    for (index, token) in tokens[1..].iter().enumerate() {
        match token.split_once('=') {
            Some(("", _)) => {
                return Err(ParseError::EmptyKey {
                    line: lineno,
                    token: token.clone(),
                });
            }
            Some((key, value)) => match attrs.entry(key.to_string()) {
                std::collections::btree_map::Entry::Vacant(entry) => {
                    entry.insert(AttrValue::One(value.to_string()));
                }
                std::collections::btree_map::Entry::Occupied(mut entry) => {
                    entry.get_mut().push(value.to_string());
                }
            },
            // A bare token is only valid directly after the action type,
            // where it is the content hash.
            None if index == 0 => {
                if token != "NOHASH" {
                    payload = Some(token.clone());
                }
            }
            None => {
                return Err(ParseError::UnexpectedToken {
                    line: lineno,
                    token: token.clone(),
                });
            }
        }
    }

    Ok(DeliveryAction::new(kind, payload, attrs))
}

/// Split an action line into whitespace-separated tokens, with double quotes
/// grouping spaces into one token.
fn tokenize(line: &str, lineno: usize) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut started = false;
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if in_quotes {
        return Err(ParseError::UnterminatedQuote { line: lineno });
    }
    if started {
        tokens.push(current);
    }
    Ok(tokens)
}
