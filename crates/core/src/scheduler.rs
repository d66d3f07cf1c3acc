// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Threaded task scheduler
//!
//! One timer thread watches a min-heap of `(next_run, task)` entries and
//! hands due tasks to a FIFO ready queue; a fixed pool of workers drains
//! that queue, runs each task, and reschedules it. Tasks are shared
//! handles: the registry, the timer heap, the ready queue and the running
//! worker each hold an `Arc`, and a stopped task is simply dropped the
//! next time a queue pops it (lazy deletion).
//!
//! Lock discipline: the registry mutex is only ever taken before a queue
//! mutex, the two queue mutexes are never held together, and no lock is
//! held across `Task::run()`.

use crate::task::Task;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

/// A task waiting for its deadline in the timer heap.
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    pub next_run: Instant,
    pub task: Arc<Task>,
}

impl PartialEq for ScheduleEntry {
    fn eq(&self, other: &Self) -> bool {
        self.next_run == other.next_run && Arc::ptr_eq(&self.task, &other.task)
    }
}

impl Eq for ScheduleEntry {}

impl PartialOrd for ScheduleEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduleEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-heap: earliest deadline first
        Reverse(self.next_run).cmp(&Reverse(other.next_run))
    }
}

/// Min-heap of schedule entries, keyed by deadline.
#[derive(Default)]
struct TimerQueue {
    heap: BinaryHeap<ScheduleEntry>,
}

impl TimerQueue {
    fn push(&mut self, entry: ScheduleEntry) {
        self.heap.push(entry);
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|entry| entry.next_run)
    }

    /// Pop the earliest entry if its deadline has passed.
    fn pop_due(&mut self, now: Instant) -> Option<ScheduleEntry> {
        if self.heap.peek()?.next_run <= now {
            self.heap.pop()
        } else {
            None
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// State shared between the public handle and the scheduler threads.
struct Shared {
    running: AtomicBool,
    registry: Mutex<HashMap<String, Arc<Task>>>,
    timer: Mutex<TimerQueue>,
    timer_cv: Condvar,
    ready: Mutex<VecDeque<Arc<Task>>>,
    ready_cv: Condvar,
}

impl Shared {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Queue a task for its next tick and wake the timer thread so it can
    /// re-evaluate its sleep against the new deadline.
    fn schedule(&self, task: Arc<Task>) {
        let next_run = Instant::now() + task.interval();
        {
            let mut timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
            timer.push(ScheduleEntry { next_run, task });
        }
        self.timer_cv.notify_one();
    }
}

/// Registry plus timer thread plus worker pool.
///
/// Dropping the scheduler shuts it down; `shutdown()` may also be called
/// explicitly and is idempotent.
pub struct Scheduler {
    shared: Arc<Shared>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    /// Start a scheduler with one timer thread and `num_workers` workers.
    /// The scheduler accepts tasks immediately.
    pub fn new(num_workers: usize) -> Self {
        let shared = Arc::new(Shared {
            running: AtomicBool::new(true),
            registry: Mutex::new(HashMap::new()),
            timer: Mutex::new(TimerQueue::default()),
            timer_cv: Condvar::new(),
            ready: Mutex::new(VecDeque::new()),
            ready_cv: Condvar::new(),
        });

        let mut threads = Vec::with_capacity(num_workers + 1);
        {
            let shared = shared.clone();
            threads.push(std::thread::spawn(move || timer_loop(&shared)));
        }
        for _ in 0..num_workers {
            let shared = shared.clone();
            threads.push(std::thread::spawn(move || worker_loop(&shared)));
        }

        Self {
            shared,
            threads: Mutex::new(threads),
        }
    }

    /// Register a task under `name` and schedule its first tick.
    ///
    /// Returns false without side effects if the name is taken, the
    /// factory yields nothing (or panics), or the scheduler has shut
    /// down.
    pub fn create_task<F>(&self, name: &str, factory: F) -> bool
    where
        F: FnOnce() -> Option<Arc<Task>>,
    {
        if !self.shared.is_running() {
            return false;
        }

        let task = {
            let mut registry = self
                .shared
                .registry
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if registry.contains_key(name) {
                return false;
            }
            let task = match catch_unwind(AssertUnwindSafe(factory)) {
                Ok(Some(task)) => task,
                Ok(None) => return false,
                Err(_) => {
                    tracing::error!(task = name, "task factory panicked");
                    return false;
                }
            };
            registry.insert(name.to_string(), task.clone());
            task
        };

        self.shared.schedule(task);
        true
    }

    /// Stop a task: clear its active flag and drop the registry's
    /// ownership. Any in-flight execution finishes; the queues drop the
    /// handle when they next pop it.
    pub fn stop_task(&self, name: &str) -> bool {
        let mut registry = self
            .shared
            .registry
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        match registry.remove(name) {
            Some(task) => {
                task.deactivate();
                true
            }
            None => false,
        }
    }

    /// Install a new configuration on a task. The interval change takes
    /// effect at the next reschedule.
    pub fn update_task(&self, name: &str, config: crate::task::TaskConfig) -> bool {
        let registry = self
            .shared
            .registry
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        match registry.get(name) {
            Some(task) => {
                task.update_config(config);
                true
            }
            None => false,
        }
    }

    /// Look up a task by name.
    pub fn get_task(&self, name: &str) -> Option<Arc<Task>> {
        self.shared
            .registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Number of registered tasks.
    pub fn task_count(&self) -> usize {
        self.shared
            .registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Stop both queues and join every thread. Idempotent. Workers drain
    /// the ready queue before exiting; drained tasks run one final time
    /// but are not rescheduled.
    pub fn shutdown(&self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.shared.timer_cv.notify_all();
        self.shared.ready_cv.notify_all();

        let threads = {
            let mut guard = self.threads.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };
        for handle in threads {
            let _ = handle.join();
        }
        tracing::debug!("scheduler shut down");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Move due tasks from the timer heap to the ready queue, sleeping until
/// the earliest deadline in between.
fn timer_loop(shared: &Shared) {
    let mut timer = shared.timer.lock().unwrap_or_else(|e| e.into_inner());
    while shared.is_running() {
        let Some(deadline) = timer.next_deadline() else {
            timer = shared
                .timer_cv
                .wait(timer)
                .unwrap_or_else(|e| e.into_inner());
            continue;
        };

        let now = Instant::now();
        if let Some(entry) = timer.pop_due(now) {
            drop(timer);
            if entry.task.is_active() {
                {
                    let mut ready = shared.ready.lock().unwrap_or_else(|e| e.into_inner());
                    ready.push_back(entry.task);
                }
                shared.ready_cv.notify_one();
            } else {
                tracing::debug!(task = entry.task.name(), "dropping stopped task from timer");
            }
            timer = shared.timer.lock().unwrap_or_else(|e| e.into_inner());
        } else {
            // Woken early by a new entry or shutdown; the loop re-evaluates.
            let (guard, _timed_out) = shared
                .timer_cv
                .wait_timeout(timer, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            timer = guard;
        }
    }
}

/// Pop ready tasks, run them behind a panic barrier, and reschedule the
/// survivors. After shutdown the queue is drained without rescheduling.
fn worker_loop(shared: &Shared) {
    loop {
        let task = {
            let mut ready = shared.ready.lock().unwrap_or_else(|e| e.into_inner());
            loop {
                if let Some(task) = ready.pop_front() {
                    break task;
                }
                if !shared.is_running() {
                    return;
                }
                ready = shared
                    .ready_cv
                    .wait(ready)
                    .unwrap_or_else(|e| e.into_inner());
            }
        };

        if !task.is_active() {
            tracing::debug!(task = task.name(), "dropping stopped task from ready queue");
            continue;
        }

        if catch_unwind(AssertUnwindSafe(|| task.run())).is_err() {
            tracing::error!(task = task.name(), "task panicked; tick skipped");
        }

        if shared.is_running() && task.is_active() {
            shared.schedule(task);
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
