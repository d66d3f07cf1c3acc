// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn cfg(tolerance: u32, repeat: u32, allow: bool) -> ChannelConfig {
    ChannelConfig {
        tolerance,
        repeat,
        allow,
    }
}

/// Drive `want` into a fresh channel for `ticks` ticks and count the
/// engage effects produced.
fn count_engages(config: &ChannelConfig, ticks: u32) -> u32 {
    let mut state = ChannelState::new();
    let mut engages = 0;
    for _ in 0..ticks {
        if state.step(config, true) == Some(true) {
            engages += 1;
        }
    }
    engages
}

#[test]
fn stays_quiet_below_tolerance() {
    let config = cfg(10, 0, true);
    let mut state = ChannelState::new();

    for _ in 0..9 {
        assert_eq!(state.step(&config, true), None);
    }
    assert!(!state.is_engaged());
    assert_eq!(state.counter(), 9);
}

#[test]
fn engages_exactly_at_tolerance() {
    let config = cfg(10, 0, true);
    let mut state = ChannelState::new();

    for _ in 0..9 {
        assert_eq!(state.step(&config, true), None);
    }
    assert_eq!(state.step(&config, true), Some(true));
    assert!(state.is_engaged());

    // Latched single-shot: no further effects while wanting continues.
    for _ in 0..20 {
        assert_eq!(state.step(&config, true), None);
    }
}

#[test]
fn single_glitch_resets_the_count() {
    let config = cfg(10, 0, true);
    let mut state = ChannelState::new();

    for _ in 0..5 {
        state.step(&config, true);
    }
    assert_eq!(state.step(&config, false), None);
    assert_eq!(state.counter(), 0);

    // Five more wants still don't reach the tolerance.
    for _ in 0..5 {
        assert_eq!(state.step(&config, true), None);
    }
    assert!(!state.is_engaged());
}

#[test]
fn releases_on_falling_edge() {
    let config = cfg(3, 0, true);
    let mut state = ChannelState::new();

    for _ in 0..3 {
        state.step(&config, true);
    }
    assert!(state.is_engaged());

    assert_eq!(state.step(&config, false), Some(false));
    assert!(!state.is_engaged());
    assert_eq!(state.counter(), 0);
}

#[test]
fn closed_gate_releases_even_while_wanting() {
    let mut open = cfg(10, 0, true);
    let mut state = ChannelState::new();

    for _ in 0..10 {
        state.step(&open, true);
    }
    assert!(state.is_engaged());

    // Gate slams shut; the want is still true.
    open.allow = false;
    assert_eq!(state.step(&open, true), Some(false));
    assert!(!state.is_engaged());
    assert_eq!(state.counter(), 0);
}

#[test]
fn closed_gate_blocks_activation() {
    let config = cfg(3, 0, false);
    let mut state = ChannelState::new();

    for _ in 0..20 {
        assert_eq!(state.step(&config, true), None);
    }
    assert!(!state.is_engaged());
}

#[test]
fn reopened_gate_engages_once_tolerance_is_met_again() {
    let mut config = cfg(3, 0, true);
    let mut state = ChannelState::new();

    for _ in 0..3 {
        state.step(&config, true);
    }
    config.allow = false;
    assert_eq!(state.step(&config, true), Some(false));

    config.allow = true;
    // Counter restarted at the release; three more wants re-engage.
    assert_eq!(state.step(&config, true), None);
    assert_eq!(state.step(&config, true), None);
    assert_eq!(state.step(&config, true), Some(true));
}

#[test]
fn heart_beat_refires_on_exact_period() {
    // tolerance=5, repeat=3: engage on tick 5, re-fire on 8, 11, 14.
    let config = cfg(5, 3, true);
    assert_eq!(count_engages(&config, 14), 4);
    assert_eq!(count_engages(&config, 13), 3);
}

#[test]
fn heart_beat_snap_back_keeps_period_exact() {
    let config = cfg(5, 3, true);
    let mut state = ChannelState::new();

    for _ in 0..8 {
        state.step(&config, true);
    }
    // Just fired a heart-beat; counter snapped back to the tolerance.
    assert_eq!(state.counter(), 5);
    assert!(state.is_engaged());
}

#[test]
fn zero_repeat_never_heart_beats() {
    let config = cfg(5, 0, true);
    assert_eq!(count_engages(&config, 500), 1);
}

#[test]
fn zero_tolerance_engages_on_first_want() {
    let config = cfg(0, 0, true);
    let mut state = ChannelState::new();

    assert_eq!(state.step(&config, true), Some(true));
    assert!(state.is_engaged());
}

#[test]
fn release_takes_precedence_over_heart_beat() {
    // An engaged channel whose heart-beat is due on the very tick the
    // gate closes must release, not re-fire.
    let mut config = cfg(2, 1, true);
    let mut state = ChannelState::new();

    for _ in 0..2 {
        state.step(&config, true);
    }
    assert!(state.is_engaged());

    config.allow = false;
    assert_eq!(state.step(&config, true), Some(false));
    assert_eq!(state.counter(), 0);
    assert!(!state.is_engaged());
}

#[parameterized(
    noise_filter = { 10, 0, 9, 0 },
    activation = { 10, 0, 10, 1 },
    fast_channel = { 1, 0, 3, 1 },
    beat_every_tick = { 2, 1, 6, 5 },
    long_beat = { 3, 4, 15, 4 },
)]
fn engage_counts(tolerance: u32, repeat: u32, ticks: u32, expected: u32) {
    let config = cfg(tolerance, repeat, true);
    assert_eq!(count_engages(&config, ticks), expected);
}
