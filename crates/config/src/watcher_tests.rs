// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;
use std::sync::atomic::AtomicU32;

const POLL: Duration = Duration::from_millis(20);

fn counting_watcher(path: &Path) -> (FileWatcher, Arc<AtomicU32>) {
    let fires = Arc::new(AtomicU32::new(0));
    let counter = fires.clone();
    let watcher = FileWatcher::new(
        path,
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        },
        POLL,
    );
    (watcher, fires)
}

fn settle() {
    std::thread::sleep(Duration::from_millis(120));
}

#[test]
fn fires_once_per_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.toml");
    fs::write(&path, "a").unwrap();

    let (mut watcher, fires) = counting_watcher(&path);
    watcher.start();

    settle();
    assert_eq!(fires.load(Ordering::SeqCst), 0);

    fs::write(&path, "b").unwrap();
    settle();
    assert_eq!(fires.load(Ordering::SeqCst), 1);

    watcher.stop();
}

#[test]
fn missing_file_never_fires() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let (mut watcher, fires) = counting_watcher(&path);
    watcher.start();
    settle();
    watcher.stop();

    assert_eq!(fires.load(Ordering::SeqCst), 0);
}

#[test]
fn file_created_after_start_fires_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("late.toml");

    let (mut watcher, fires) = counting_watcher(&path);
    watcher.start();
    settle();

    fs::write(&path, "now it exists").unwrap();
    settle();
    assert_eq!(fires.load(Ordering::SeqCst), 1);

    watcher.stop();
}

#[test]
fn deletion_is_silent_and_reappearance_fires_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flicker.toml");
    fs::write(&path, "v1").unwrap();

    let (mut watcher, fires) = counting_watcher(&path);
    watcher.start();
    settle();

    fs::remove_file(&path).unwrap();
    settle();
    assert_eq!(fires.load(Ordering::SeqCst), 0);

    fs::write(&path, "v2").unwrap();
    settle();
    assert_eq!(fires.load(Ordering::SeqCst), 1);

    watcher.stop();
}

#[test]
fn stop_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.toml");
    fs::write(&path, "a").unwrap();

    let (mut watcher, _) = counting_watcher(&path);
    watcher.start();
    assert!(watcher.is_running());
    watcher.stop();
    assert!(!watcher.is_running());
    watcher.stop();
}

#[test]
fn no_fires_after_stop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.toml");
    fs::write(&path, "a").unwrap();

    let (mut watcher, fires) = counting_watcher(&path);
    watcher.start();
    settle();
    watcher.stop();

    fs::write(&path, "b").unwrap();
    settle();
    assert_eq!(fires.load(Ordering::SeqCst), 0);
}

#[test]
fn double_start_spawns_no_second_thread() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.toml");
    fs::write(&path, "a").unwrap();

    let (mut watcher, fires) = counting_watcher(&path);
    watcher.start();
    watcher.start();

    fs::write(&path, "b").unwrap();
    settle();
    assert_eq!(fires.load(Ordering::SeqCst), 1);

    watcher.stop();
}
