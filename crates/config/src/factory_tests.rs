// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::parser::parse_tasks;

#[test]
fn builds_a_sensor_task_from_a_spec() {
    let specs = parse_tasks(
        "[[task]]\nname = \"probe\"\nkind = \"SensorTask\"\ninterval_ms = 50\n",
    )
    .unwrap();
    let task = build_task(&specs[0]);

    assert_eq!(task.name(), "probe");
    assert!(task.is_active());
    assert_eq!(task.config(), specs[0].config);
}

#[test]
fn builds_an_actuator_task_from_a_spec() {
    let specs = parse_tasks(
        "[[task]]\nname = \"valve\"\nkind = \"ActuatorTask\"\n",
    )
    .unwrap();
    let task = build_task(&specs[0]);

    assert_eq!(task.name(), "valve");
    // An idle actuator plans nothing; a tick leaves both channels quiet.
    task.run();
    assert!(!task.signal_state().is_engaged());
    assert!(!task.action_state().is_engaged());
}
