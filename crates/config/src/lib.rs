// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pacer-config: Declarative task-set configuration for pacer
//!
//! A TOML document declares the task set; this crate parses and validates
//! it, watches the file for edits, and reconciles the live scheduler
//! against the declaration — absorbing rapid edit bursts behind a
//! debounce window and rolling back to the current set when an edit does
//! not parse.

pub mod factory;
pub mod parser;
pub mod reconciler;
pub mod watcher;

pub use parser::{ParseError, TaskKind, TaskSpec};
pub use reconciler::{ReconcileError, Reconciler};
pub use watcher::FileWatcher;
