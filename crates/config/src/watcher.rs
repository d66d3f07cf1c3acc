// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polling file watcher
//!
//! Watches one path's modification time and invokes a callback when it
//! changes. A missing file is a sentinel, not an error: the callback only
//! fires on transitions to an observed mtime, so deletion is silent and a
//! reappearing file fires exactly once.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};

pub struct FileWatcher {
    path: PathBuf,
    callback: Arc<dyn Fn() + Send + Sync>,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FileWatcher {
    pub fn new(
        path: impl Into<PathBuf>,
        callback: impl Fn() + Send + Sync + 'static,
        poll_interval: Duration,
    ) -> Self {
        Self {
            path: path.into(),
            callback: Arc::new(callback),
            poll_interval,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Spawn the polling thread. The current file state (or its absence)
    /// becomes the baseline; only subsequent changes fire the callback.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!(path = %self.path.display(), "file watcher already running");
            return;
        }

        let path = self.path.clone();
        let callback = self.callback.clone();
        let poll_interval = self.poll_interval;
        let running = self.running.clone();
        let mut last = mod_time(&path);

        self.handle = Some(std::thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                std::thread::sleep(poll_interval);
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                let current = mod_time(&path);
                if current != last && current.is_some() {
                    tracing::debug!(path = %path.display(), "file change detected");
                    last = current;
                    callback();
                }
            }
        }));

        tracing::info!(path = %self.path.display(), "watching for changes");
    }

    /// Stop the polling thread and join it. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            tracing::info!(path = %self.path.display(), "stopped watching");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The file's mtime, or `None` when the file is absent or unreadable.
/// IO errors are tolerated; polling continues.
fn mod_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
