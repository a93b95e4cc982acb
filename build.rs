// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Build script to generate test fixtures for the `repolint` crate.
//!
//! Always generates the plain non-ELF fixtures; compiled ELF fixtures need
//! gcc (and patchelf for the runpath variant). When tools are missing those
//! fixtures are skipped with a warning and the tests skip gracefully.

use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Check if a command is available in PATH.
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let fixtures_dir = Path::new(&manifest_dir).join("fixtures");
    fs::create_dir_all(&fixtures_dir).expect("Failed to create fixtures directory");

    generate_simple_fixtures(&fixtures_dir);

    if command_exists("gcc") {
        generate_elf_fixtures(&fixtures_dir, command_exists("patchelf"));
    } else {
        println!("cargo:warning=gcc not found, skipping ELF fixture generation");
    }

    println!("cargo:rerun-if-changed=fixtures/");
}

/// Generate fixtures that don't require external tools.
fn generate_simple_fixtures(fixtures_dir: &Path) {
    // File too small to be an ELF object (< 64 bytes).
    let too_small = fixtures_dir.join("too-small");
    if !too_small.exists() {
        fs::write(&too_small, "tiny").expect("Failed to write too-small");
    }

    // File that's large enough but has the wrong magic bytes.
    let not_an_object = fixtures_dir.join("not-an-object");
    if !not_an_object.exists() {
        let content = "This is not an object file. It is a plain text file, padded \
                       well past the sixty-four byte minimum size of an ELF header \
                       so only the magic check can reject it.";
        fs::write(&not_an_object, content).expect("Failed to write not-an-object");
    }
}

/// Compile a minimal binary and derive the runpath variant from it.
fn generate_elf_fixtures(fixtures_dir: &Path, have_patchelf: bool) {
    let hello = fixtures_dir.join("hello.elf");
    if !hello.exists() {
        let temp_dir = env::temp_dir().join("repolint_build");
        let _ = fs::remove_dir_all(&temp_dir);
        fs::create_dir_all(&temp_dir).expect("Failed to create temp directory");

        let source_path = temp_dir.join("hello.c");
        let source_code = r#"#include <stdio.h>
int main() {
    printf("hello\n");
    return 0;
}
"#;
        fs::write(&source_path, source_code).expect("Failed to write test source");

        let status = Command::new("gcc")
            .args([
                "-o",
                hello.to_str().unwrap(),
                source_path.to_str().unwrap(),
            ])
            .status();
        let _ = fs::remove_dir_all(&temp_dir);

        if status.map(|s| !s.success()).unwrap_or(true) {
            println!("cargo:warning=Failed to compile hello.elf, skipping ELF fixtures");
            let _ = fs::remove_file(&hello);
            return;
        }
    }

    if !have_patchelf {
        println!("cargo:warning=patchelf not found, skipping runpath fixture");
        return;
    }

    let runpath = fixtures_dir.join("hello-runpath.elf");
    if runpath.exists() {
        return;
    }
    if fs::copy(&hello, &runpath).is_err() {
        println!("cargo:warning=Failed to copy binary for hello-runpath.elf");
        return;
    }
    let status = Command::new("patchelf")
        .args([
            "--set-rpath",
            "/usr/lib:/opt/lib",
            runpath.to_str().unwrap(),
        ])
        .status();
    if status.map(|s| !s.success()).unwrap_or(true) {
        println!("cargo:warning=Failed to set runpath for hello-runpath.elf, removing file");
        let _ = fs::remove_file(&runpath);
    }
}
