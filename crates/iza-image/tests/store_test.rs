//! Integration tests for the on-disk image catalog.
//!
//! These build real tar archives in temp directories and drive the
//! register/resolve/list contract without touching the network.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use iza_image::reference::ImageReference;
use iza_image::store::{ImageManifest, ImageStore};

fn build_tar_gz(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder.append_data(&mut header, path, *data).unwrap();
    }
    let tar = builder.into_inner().unwrap();

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

fn write_archive(dir: &Path, name: &str, entries: &[(&str, &[u8], u32)]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, build_tar_gz(entries)).unwrap();
    path
}

#[test]
fn register_then_resolve_returns_rootfs_path() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::open(dir.path().join("images"), dir.path().join("cache"));
    let reference = ImageReference::parse("alpine:3.18").unwrap();
    let archive = write_archive(dir.path(), "a.tar.gz", &[("bin/sh", b"#!/bin/fake", 0o755)]);

    let rootfs = store.register_archive(&reference, &archive, None).unwrap();

    assert!(rootfs.ends_with("alpine:3.18/rootfs"));
    assert_eq!(store.resolve(&reference).unwrap(), rootfs);
    assert!(rootfs.join("bin/sh").exists());
    let mode = std::fs::metadata(rootfs.join("bin/sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn resolve_is_stable_across_calls() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::open(dir.path().join("images"), dir.path().join("cache"));
    let reference = ImageReference::parse("alpine:3.18").unwrap();
    let archive = write_archive(dir.path(), "a.tar.gz", &[("etc/os", b"alpine", 0o644)]);
    store.register_archive(&reference, &archive, None).unwrap();

    let first = store.resolve(&reference).unwrap();
    let second = store.resolve(&reference).unwrap();
    assert_eq!(first, second);
}

#[test]
fn repeated_registration_replaces_the_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::open(dir.path().join("images"), dir.path().join("cache"));
    let reference = ImageReference::parse("alpine:3.18").unwrap();

    let old = write_archive(dir.path(), "old.tar.gz", &[("old-file", b"old", 0o644)]);
    store.register_archive(&reference, &old, None).unwrap();

    let new = write_archive(dir.path(), "new.tar.gz", &[("new-file", b"new", 0o644)]);
    let rootfs = store.register_archive(&reference, &new, None).unwrap();

    assert!(rootfs.join("new-file").exists());
    assert!(!rootfs.join("old-file").exists());
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn failed_extraction_removes_the_partial_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::open(dir.path().join("images"), dir.path().join("cache"));
    let reference = ImageReference::parse("alpine:3.18").unwrap();

    let corrupt = dir.path().join("corrupt.tar.gz");
    std::fs::write(&corrupt, [0x1f, 0x8b, 0xde, 0xad, 0xbe, 0xef]).unwrap();

    assert!(store.register_archive(&reference, &corrupt, None).is_err());
    assert!(store.resolve(&reference).is_none());
    assert!(!store.images_dir().join("alpine:3.18").exists());
}

#[test]
fn failed_replacement_does_not_leave_the_old_record_visible() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::open(dir.path().join("images"), dir.path().join("cache"));
    let reference = ImageReference::parse("alpine:3.18").unwrap();

    let good = write_archive(dir.path(), "good.tar.gz", &[("f", b"ok", 0o644)]);
    store.register_archive(&reference, &good, None).unwrap();

    let corrupt = dir.path().join("corrupt.tar.gz");
    std::fs::write(&corrupt, [0x1f, 0x8b, 0x00]).unwrap();
    assert!(store.register_archive(&reference, &corrupt, None).is_err());

    // the contract: after a failed pull the image is absent, not stale
    assert!(store.resolve(&reference).is_none());
}

#[test]
fn list_reports_repository_tag_and_nonzero_size() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::open(dir.path().join("images"), dir.path().join("cache"));

    let alpine = write_archive(dir.path(), "a.tar.gz", &[("bin/sh", b"0123456789", 0o755)]);
    store
        .register_archive(&ImageReference::parse("alpine:3.18").unwrap(), &alpine, None)
        .unwrap();
    let ubuntu = write_archive(dir.path(), "u.tar.gz", &[("bin/bash", b"x", 0o755)]);
    store
        .register_archive(&ImageReference::parse("ubuntu:22.04").unwrap(), &ubuntu, None)
        .unwrap();

    let records = store.list().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].repository, "alpine");
    assert_eq!(records[0].tag, "3.18");
    assert_eq!(records[0].size_bytes, 10);
    assert_eq!(records[1].repository, "ubuntu");
    assert_eq!(records[1].tag, "22.04");
}

#[test]
fn list_ignores_directories_without_a_rootfs() {
    let dir = tempfile::tempdir().unwrap();
    let images_dir = dir.path().join("images");
    std::fs::create_dir_all(images_dir.join("not-an-image")).unwrap();
    std::fs::write(images_dir.join("stray-file"), b"x").unwrap();

    let store = ImageStore::open(&images_dir, dir.path().join("cache"));
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn registration_writes_an_advisory_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::open(dir.path().join("images"), dir.path().join("cache"));
    let reference = ImageReference::parse("alpine:3.18").unwrap();
    let archive = write_archive(dir.path(), "a.tar.gz", &[("f", b"12345", 0o644)]);

    store
        .register_archive(&reference, &archive, Some("https://example.invalid/a.tar.gz"))
        .unwrap();

    let manifest_path = store.images_dir().join("alpine:3.18/manifest.json");
    let manifest: ImageManifest =
        serde_json::from_str(&std::fs::read_to_string(manifest_path).unwrap()).unwrap();
    assert_eq!(manifest.reference, "alpine:3.18");
    assert_eq!(
        manifest.source_url.as_deref(),
        Some("https://example.invalid/a.tar.gz")
    );
    assert_eq!(manifest.size_bytes, 5);
}
