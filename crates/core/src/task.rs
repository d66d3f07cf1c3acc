// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task entity and the per-tick run driver
//!
//! A [`Task`] pairs a [`Routine`] (the business logic: plan, signal, act)
//! with the scheduling identity and the two channel state machines. The
//! scheduler owns when `run()` is called; `run()` owns what one tick
//! means: snapshot the config, ask the routine for its intent, and step
//! both channels, applying whatever side effects they emit.

use crate::channel::{ChannelConfig, ChannelState};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A routine's declared intent for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub want_signal: bool,
    pub want_action: bool,
}

/// The business logic of a task.
///
/// `plan` declares intent; `signal` and `act` apply the side effects the
/// channel state machines decide on. All three run on a worker thread and
/// must not block for long. Executions of one task are strictly
/// serialized, so implementations are free to keep plain mutable state.
pub trait Routine: Send {
    fn plan(&mut self) -> Plan;
    fn signal(&mut self, on: bool);
    fn act(&mut self, on: bool);
}

/// Full configuration of a task, replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Name the task is declared under. The live registry key is fixed at
    /// creation; a config update never renames a running task.
    pub name: String,
    /// Period between executions, in milliseconds. Strictly positive,
    /// enforced at the config boundary.
    pub interval_ms: u64,
    pub signal: ChannelConfig,
    pub action: ChannelConfig,
}

impl TaskConfig {
    pub fn new(name: impl Into<String>, interval_ms: u64) -> Self {
        Self {
            name: name.into(),
            interval_ms,
            signal: ChannelConfig::default(),
            action: ChannelConfig::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// State owned by the tick driver: the routine plus both channels.
///
/// Guarded by a mutex only because the task is shared behind an `Arc`;
/// the at-most-one-in-flight invariant means the lock is never contended.
struct RunState {
    routine: Box<dyn Routine>,
    signal: ChannelState,
    action: ChannelState,
}

/// A schedulable task.
pub struct Task {
    name: String,
    active: AtomicBool,
    config: Mutex<TaskConfig>,
    state: Mutex<RunState>,
}

impl Task {
    pub fn new(config: TaskConfig, routine: Box<dyn Routine>) -> Self {
        Self {
            name: config.name.clone(),
            active: AtomicBool::new(true),
            config: Mutex::new(config),
            state: Mutex::new(RunState {
                routine,
                signal: ChannelState::new(),
                action: ChannelState::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Mark the task stopped. Monotonic: once cleared it is never set
    /// again; the queues drop the handle when they next see it.
    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Install a new configuration. Visible to the next `run()`; the
    /// in-flight execution keeps its snapshot.
    pub fn update_config(&self, config: TaskConfig) {
        let mut guard = self.config.lock().unwrap_or_else(|e| e.into_inner());
        *guard = config;
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> TaskConfig {
        self.config.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Current execution period, read at reschedule time.
    pub fn interval(&self) -> Duration {
        self.config
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .interval()
    }

    /// Execute one tick.
    ///
    /// The config is snapshotted once under its mutex; every decision in
    /// this tick uses that snapshot. A config installed mid-tick applies
    /// from the next tick on.
    pub fn run(&self) {
        if !self.is_active() {
            return;
        }

        let cfg = self.config();

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let RunState {
            routine,
            signal,
            action,
        } = &mut *state;

        let plan = routine.plan();

        if let Some(on) = signal.step(&cfg.signal, plan.want_signal) {
            routine.signal(on);
        }
        if let Some(on) = action.step(&cfg.action, plan.want_action) {
            routine.act(on);
        }
    }

    /// Snapshot of the signal channel state, for inspection in tests.
    pub fn signal_state(&self) -> ChannelState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).signal
    }

    /// Snapshot of the action channel state, for inspection in tests.
    pub fn action_state(&self) -> ChannelState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).action
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
