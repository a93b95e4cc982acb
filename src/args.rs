// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repolint")]
#[command(version)]
#[command(about = "Checks package manifests for link, placement, runpath and hardening problems before publication")]
pub(crate) struct Args {
    /// Candidate manifest files about to be published.
    #[arg(required = true)]
    pub manifests: Vec<PathBuf>,

    /// Directory tree of already-published reference manifests (*.p5m).
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Proto area directory holding the delivered file contents.
    /// May be repeated; directories are searched in order.
    #[arg(long = "proto-dir", required = true)]
    pub proto_dirs: Vec<PathBuf>,

    /// Write the full report as JSON to this file.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Honor publishers when deciding whether a candidate package
    /// supersedes a reference package.
    #[arg(long)]
    pub match_publisher: bool,

    /// elfedit binary used to probe the ASLR tag of executables.
    #[arg(long, default_value = "/usr/bin/elfedit")]
    pub elfedit: PathBuf,

    /// Suppress diagnostics with this identifier. May be repeated.
    #[arg(long = "suppress")]
    pub suppress: Vec<String>,

    /// Publisher allowed in candidate FMRIs. May be repeated; with none
    /// given, the publisher check is skipped.
    #[arg(long = "allowed-publisher")]
    pub allowed_publishers: Vec<String>,

    /// Architecture every variant.arch value must equal; without it, the
    /// architecture check is skipped.
    #[arg(long)]
    pub arch: Option<String>,

    /// OS release used in versioned architecture directory names.
    #[arg(long, default_value = "2.11")]
    pub release: String,
}
