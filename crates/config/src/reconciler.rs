// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config reconciler
//!
//! Keeps the live scheduler convergent with the declared task set. File
//! changes are debounced: the watcher stamps each change, and a tick
//! thread applies the document only after a quiet period. A re-parse that
//! fails or yields nothing keeps the current set (rollback on error).

use crate::factory;
use crate::parser::{self, ParseError, TaskSpec};
use crate::watcher::FileWatcher;
use pacer_core::scheduler::Scheduler;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;

/// How often the debounce thread checks whether the quiet period elapsed.
const DEBOUNCE_TICK: Duration = Duration::from_millis(200);

/// Default mtime poll period for the config file.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("config declares no tasks: {}", .0.display())]
    EmptyConfig(PathBuf),
}

/// State shared with the watcher callback and the debounce thread.
struct Pending {
    update: AtomicBool,
    last_change: Mutex<Instant>,
    current: Mutex<HashMap<String, TaskSpec>>,
}

pub struct Reconciler {
    scheduler: Arc<Scheduler>,
    path: PathBuf,
    debounce_window: Duration,
    poll_interval: Duration,
    pending: Arc<Pending>,
    running: Arc<AtomicBool>,
    watcher: Option<FileWatcher>,
    handle: Option<JoinHandle<()>>,
}

impl Reconciler {
    pub fn new(scheduler: Arc<Scheduler>, path: impl Into<PathBuf>, debounce_window: Duration) -> Self {
        Self {
            scheduler,
            path: path.into(),
            debounce_window,
            poll_interval: DEFAULT_POLL_INTERVAL,
            pending: Arc::new(Pending {
                update: AtomicBool::new(false),
                last_change: Mutex::new(Instant::now()),
                current: Mutex::new(HashMap::new()),
            }),
            running: Arc::new(AtomicBool::new(false)),
            watcher: None,
            handle: None,
        }
    }

    /// Override how often the config file's mtime is polled.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Load the config, reconcile once, and start the watcher and the
    /// debounce thread. An unreadable, unparseable or empty initial
    /// config is an error and nothing is started.
    pub fn start(&mut self) -> Result<(), ReconcileError> {
        let specs = parser::parse_file(&self.path)?;
        if specs.is_empty() {
            return Err(ReconcileError::EmptyConfig(self.path.clone()));
        }

        sync_tasks(&self.scheduler, &self.pending, specs);

        let pending = self.pending.clone();
        let mut watcher = FileWatcher::new(
            &self.path,
            move || {
                tracing::info!("config changed; waiting for the edit burst to settle");
                *pending.last_change.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
                pending.update.store(true, Ordering::SeqCst);
            },
            self.poll_interval,
        );
        watcher.start();
        self.watcher = Some(watcher);

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let pending = self.pending.clone();
        let scheduler = self.scheduler.clone();
        let path = self.path.clone();
        let window = self.debounce_window;
        self.handle = Some(std::thread::spawn(move || {
            debounce_loop(&running, &pending, &scheduler, &path, window);
        }));

        tracing::info!(
            path = %self.path.display(),
            tasks = self.task_count(),
            "reconciler started"
        );
        Ok(())
    }

    /// Stop the watcher and the debounce thread. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            tracing::info!("reconciler stopped");
        }
    }

    /// Size of the declared set as of the last successful reconcile.
    pub fn task_count(&self) -> usize {
        self.pending
            .current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl Drop for Reconciler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn debounce_loop(
    running: &AtomicBool,
    pending: &Pending,
    scheduler: &Scheduler,
    path: &Path,
    window: Duration,
) {
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(DEBOUNCE_TICK);
        if !pending.update.load(Ordering::SeqCst) {
            continue;
        }

        let elapsed = pending
            .last_change
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .elapsed();
        if elapsed < window {
            continue;
        }

        pending.update.store(false, Ordering::SeqCst);
        apply_config(pending, scheduler, path);
    }
}

/// Re-parse the document and reconcile. Rolls back (keeps the current
/// set) when the document is unreadable, unparseable or empty.
fn apply_config(pending: &Pending, scheduler: &Scheduler, path: &Path) {
    match parser::parse_file(path) {
        Ok(specs) if specs.is_empty() => {
            tracing::warn!(
                path = %path.display(),
                "updated config has no valid tasks; keeping the current set"
            );
        }
        Ok(specs) => sync_tasks(scheduler, pending, specs),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to re-parse config; keeping the current set"
            );
        }
    }
}

/// Diff the declared set against the current one and converge the
/// scheduler: create what is new, update what changed, stop what is
/// gone. The current-set lock is released before any scheduler call.
fn sync_tasks(scheduler: &Scheduler, pending: &Pending, specs: Vec<TaskSpec>) {
    let new_set: HashMap<String, TaskSpec> = specs
        .into_iter()
        .map(|spec| (spec.config.name.clone(), spec))
        .collect();
    let old_set = pending
        .current
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone();

    let mut added = 0;
    let mut updated = 0;
    let mut removed = 0;

    for (name, spec) in &new_set {
        match old_set.get(name) {
            None => {
                if scheduler.create_task(name, || Some(factory::build_task(spec))) {
                    added += 1;
                } else {
                    tracing::error!(task = %name, "failed to create task");
                }
            }
            Some(old) if old != spec => {
                if scheduler.update_task(name, spec.config.clone()) {
                    updated += 1;
                } else {
                    tracing::error!(task = %name, "failed to update task");
                }
            }
            Some(_) => {}
        }
    }

    for name in old_set.keys() {
        if !new_set.contains_key(name) {
            if scheduler.stop_task(name) {
                removed += 1;
            } else {
                tracing::error!(task = %name, "failed to stop task");
            }
        }
    }

    *pending
        .current
        .lock()
        .unwrap_or_else(|e| e.into_inner()) = new_set;

    tracing::info!(
        added,
        updated,
        removed,
        total = scheduler.task_count(),
        "task set reconciled"
    );
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
