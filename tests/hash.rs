//! End-to-end tests of the `dockertar-sha256-helper` binary.

mod common;

use std::fs;
use std::io::Write;

use common::hash_cmd;
use flate2::Compression;
use flate2::write::GzEncoder;
use predicates::prelude::*;
use sha2::{Digest, Sha256};
use tempfile::tempdir;

fn expected_digest(data: &[u8]) -> String {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    format!("{:x}\n", Sha256::digest(encoder.finish().unwrap()))
}

#[test]
fn test_prints_digest_of_compressed_bytes() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("layer.tar");
    fs::write(&input, b"some layer bytes").unwrap();

    hash_cmd()
        .arg(&input)
        .assert()
        .success()
        .stdout(expected_digest(b"some layer bytes"));
}

#[test]
fn test_identical_inputs_identical_digests() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    fs::write(&first, "same").unwrap();
    fs::write(&second, "same").unwrap();

    let a = hash_cmd().arg(&first).output().unwrap().stdout;
    let b = hash_cmd().arg(&second).output().unwrap().stdout;
    assert_eq!(a, b);
    assert_eq!(a.len(), 65);
}

#[test]
fn test_empty_input_is_not_an_error() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("empty");
    fs::write(&input, "").unwrap();

    hash_cmd()
        .arg(&input)
        .assert()
        .success()
        .stdout(expected_digest(b""));
}

#[test]
fn test_missing_input_prints_nothing() {
    let dir = tempdir().unwrap();

    hash_cmd()
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn test_requires_exactly_one_argument() {
    hash_cmd().assert().failure();
    hash_cmd().args(["a", "b"]).assert().failure();
}
