// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task factory: spec to live task

use crate::parser::{TaskKind, TaskSpec};
use pacer_core::routines::{
    ActuatorCommand, ActuatorRoutine, SensorReading, SensorRoutine, DEFAULT_THRESHOLD,
};
use pacer_core::task::Task;
use std::sync::Arc;

/// Build a task from a validated spec.
///
/// The parser has already rejected unknown kinds, so construction cannot
/// fail. Sensors get a fresh reading handle and the default threshold;
/// actuators get a fresh command handle.
pub fn build_task(spec: &TaskSpec) -> Arc<Task> {
    let routine: Box<dyn pacer_core::task::Routine> = match spec.kind {
        TaskKind::Sensor => Box::new(SensorRoutine::new(
            SensorReading::default(),
            DEFAULT_THRESHOLD,
        )),
        TaskKind::Actuator => Box::new(ActuatorRoutine::new(ActuatorCommand::default())),
    };
    Arc::new(Task::new(spec.config.clone(), routine))
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
