//! Structural tests for layer boundaries.
//!
//! Domain code stays pure and application services never reach into
//! infrastructure, commands, or output.

use std::path::{Path, PathBuf};

fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Lines that are neither comments nor blank.
fn code_lines(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("//"))
        .map(String::from)
        .collect()
}

fn violations(dir: &str, forbidden: &[&str]) -> Vec<String> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(dir);
    let mut found = Vec::new();
    for file in collect_rs_files(&root) {
        for line in code_lines(&file) {
            if forbidden.iter().any(|f| line.contains(f)) {
                found.push(format!("{}: {line}", file.display()));
            }
        }
    }
    found
}

#[test]
fn test_domain_has_no_io_or_outer_layers() {
    let found = violations(
        "domain",
        &[
            "crate::application",
            "crate::infra",
            "crate::commands",
            "crate::output",
            "tokio::",
            "std::fs",
            "reqwest",
        ],
    );
    assert!(found.is_empty(), "domain boundary violations:\n{}", found.join("\n"));
}

#[test]
fn test_services_use_only_domain_and_ports() {
    let found = violations(
        "application/services",
        &["crate::infra", "crate::commands", "crate::output", "crate::app"],
    );
    assert!(found.is_empty(), "service boundary violations:\n{}", found.join("\n"));
}
