// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in routines
//!
//! Two reference implementations of [`Routine`]: a threshold sensor and a
//! commanded actuator. Both expose a cheap shared handle so the process
//! that owns the data (a driver loop, a test) can feed the routine without
//! reaching into the task.

use crate::task::{Plan, Routine};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Default sensor threshold used when the config does not carry one.
pub const DEFAULT_THRESHOLD: f64 = 50.0;

/// Shared handle to a sensor reading.
///
/// Stores the `f64` as raw bits in an atomic so writers never contend
/// with the tick.
#[derive(Clone, Debug, Default)]
pub struct SensorReading(Arc<AtomicU64>);

impl SensorReading {
    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Plans both channels whenever the reading exceeds the threshold.
pub struct SensorRoutine {
    reading: SensorReading,
    threshold: f64,
}

impl SensorRoutine {
    pub fn new(reading: SensorReading, threshold: f64) -> Self {
        Self { reading, threshold }
    }
}

impl Routine for SensorRoutine {
    fn plan(&mut self) -> Plan {
        let over = self.reading.get() > self.threshold;
        Plan {
            want_signal: over,
            want_action: over,
        }
    }

    fn signal(&mut self, on: bool) {
        if on {
            tracing::info!(
                reading = self.reading.get(),
                threshold = self.threshold,
                "sensor signal engaged"
            );
        } else {
            tracing::info!(reading = self.reading.get(), "sensor signal released");
        }
    }

    fn act(&mut self, on: bool) {
        if on {
            tracing::debug!("sensor processing started");
        } else {
            tracing::debug!("sensor processing stopped");
        }
    }
}

/// Shared handle to an actuator's commanded state.
#[derive(Clone, Debug, Default)]
pub struct ActuatorCommand(Arc<AtomicBool>);

impl ActuatorCommand {
    pub fn engage(&self, on: bool) {
        self.0.store(on, Ordering::Relaxed);
    }

    pub fn is_engaged(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Plans both channels while the actuator is commanded on; counts every
/// drive pulse it delivers.
pub struct ActuatorRoutine {
    command: ActuatorCommand,
    pulses: u64,
}

impl ActuatorRoutine {
    pub fn new(command: ActuatorCommand) -> Self {
        Self { command, pulses: 0 }
    }
}

impl Routine for ActuatorRoutine {
    fn plan(&mut self) -> Plan {
        let engaged = self.command.is_engaged();
        Plan {
            want_signal: engaged,
            want_action: engaged,
        }
    }

    fn signal(&mut self, on: bool) {
        if on {
            tracing::info!("actuator ready");
        } else {
            tracing::info!("actuator idle");
        }
    }

    fn act(&mut self, on: bool) {
        if on {
            self.pulses += 1;
            tracing::info!(pulses = self.pulses, "actuator drive pulse");
        } else {
            tracing::info!(total = self.pulses, "actuator drive stopped");
        }
    }
}

#[cfg(test)]
#[path = "routines_tests.rs"]
mod tests;
