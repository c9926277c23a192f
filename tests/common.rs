//! Shared helpers for the CLI integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub use assert_cmd::Command;

pub fn gotar_cmd() -> Command {
    Command::cargo_bin("gotar").expect("Failed to find gotar binary for testing")
}

pub fn hash_cmd() -> Command {
    Command::cargo_bin("dockertar-sha256-helper")
        .expect("Failed to find dockertar-sha256-helper binary for testing")
}

/// `root/{a.txt:"hi", sub/b.txt:"bye"}` below `base`.
pub fn sample_tree(base: &Path) -> PathBuf {
    let root = base.join("root");
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("a.txt"), "hi").unwrap();
    fs::write(root.join("sub/b.txt"), "bye").unwrap();
    root
}

/// Relative paths of everything below `root`, with file contents, sorted.
pub fn snapshot(root: &Path) -> Vec<(String, Option<Vec<u8>>, u32)> {
    let mut out = Vec::new();
    collect(root, root, &mut out);
    out.sort();
    out
}

fn collect(base: &Path, dir: &Path, out: &mut Vec<(String, Option<Vec<u8>>, u32)>) {
    for dirent in fs::read_dir(dir).unwrap() {
        let path = dirent.unwrap().path();
        let rel = path
            .strip_prefix(base)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/");
        let meta = fs::metadata(&path).unwrap();
        if meta.is_dir() {
            out.push((rel, None, mode(&meta)));
            collect(base, &path, out);
        } else {
            out.push((rel, Some(fs::read(&path).unwrap()), mode(&meta)));
        }
    }
}

#[cfg(unix)]
fn mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode(_meta: &fs::Metadata) -> u32 {
    0
}
