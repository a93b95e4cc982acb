// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.
mod args;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use args::Args;
use repolint::checks::{CheckConfig, ContentChecker, Diagnostics};
use repolint::inspect::ElfInspector;
use repolint::manifest::Manifest;
use repolint::report::{summarize_report, validate_report, Report};

fn main() -> Result<()> {
    let args = Args::parse();

    let candidates = load_candidate_manifests(&args.manifests)?;
    let references = match &args.reference {
        Some(dir) => load_reference_manifests(dir)?,
        None => Vec::new(),
    };

    let config = CheckConfig {
        ignore_publisher: !args.match_publisher,
        proto_dirs: args.proto_dirs.clone(),
        allowed_publishers: args.allowed_publishers.clone(),
        arch: args.arch.clone(),
        release: args.release.clone(),
    };
    let inspector = ElfInspector::new(args.elfedit.clone());

    let checker = ContentChecker::new(&candidates, &references, &inspector, &config);
    let mut sink = Diagnostics::with_suppressed(args.suppress.iter().cloned());
    checker.check(&mut sink);

    let diagnostics = sink.into_items();
    let report = Report::new(&candidates, &diagnostics);
    if let Some(dest) = &args.report {
        write_report_to_file(&report, dest)?;
    }
    summarize_report(&report);
    validate_report(&report)
}

/// Load the manifests being presented for publication.
///
/// # Errors
/// Returns an error if any manifest cannot be read or parsed.
fn load_candidate_manifests(paths: &[PathBuf]) -> Result<Vec<Manifest>> {
    eprintln!("Loading candidate manifests: count={}", paths.len());
    paths
        .iter()
        .map(|path| {
            Manifest::from_file(path)
                .with_context(|| format!("Failed to load manifest: {}", path.display()))
        })
        .collect()
}

/// Load every `*.p5m` manifest below the reference directory.
///
/// # Errors
/// Returns an error if the directory cannot be walked or any manifest fails
/// to parse.
fn load_reference_manifests(dir: &Path) -> Result<Vec<Manifest>> {
    eprintln!("Loading reference manifests: dir={}", dir.display());
    let mut manifests = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry
            .with_context(|| format!("Failed to walk reference directory: {}", dir.display()))?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "p5m")
        {
            let manifest = Manifest::from_file(entry.path()).with_context(|| {
                format!("Failed to load reference manifest: {}", entry.path().display())
            })?;
            manifests.push(manifest);
        }
    }
    eprintln!("Reference manifests loaded: count={}", manifests.len());
    Ok(manifests)
}

/// Write the report to a file.
///
/// # Errors
/// Returns an error if the report cannot be serialized to JSON or if the
/// file cannot be created.
fn write_report_to_file(report: &Report<'_>, dest: &Path) -> Result<()> {
    eprintln!("Writing report to file: file={}", dest.display());
    let file = File::create(dest)
        .with_context(|| format!("Failed to create JSON output file: {}", dest.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("Failed to serialize report to JSON: {}", dest.display()))?;
    Ok(())
}
