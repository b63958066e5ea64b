// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Alarm actuation
//!
//! Maps the latest concentration to one of four bands and drives the green,
//! yellow and red indicators accordingly:
//!
//! | concentration          | state    | indicators               |
//! |------------------------|----------|--------------------------|
//! | < warning              | Safe     | green                    |
//! | warning ≤ x < danger   | Warning  | yellow                   |
//! | danger ≤ x < critical  | Danger   | red, steady              |
//! | ≥ critical             | Critical | red, blinking            |
//!
//! The Critical blink runs as its own task, stopped through an atomic flag.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::JoinHandle;

use crate::config::{AlarmConfig, IndicatorPins};
use crate::hardware::DigitalOutput;

/// Alarm band of a concentration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    Safe,
    Warning,
    Danger,
    Critical,
}

impl AlarmState {
    pub fn from_concentration(ppm: f64, thresholds: &AlarmConfig) -> Self {
        if ppm >= thresholds.critical_ppm {
            AlarmState::Critical
        } else if ppm >= thresholds.danger_ppm {
            AlarmState::Danger
        } else if ppm >= thresholds.warning_ppm {
            AlarmState::Warning
        } else {
            AlarmState::Safe
        }
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AlarmState::Safe => "SAFE",
            AlarmState::Warning => "WARNING",
            AlarmState::Danger => "DANGER",
            AlarmState::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

/// Drives the indicators from the concentration
pub struct AlarmActuator {
    outputs: Arc<dyn DigitalOutput>,
    thresholds: AlarmConfig,
    pins: IndicatorPins,
    blink_period: Duration,
    /// Cleared to ask the blink task to stop
    blinking: Arc<AtomicBool>,
    blink_handle: Option<JoinHandle<()>>,
    state: Option<AlarmState>,
}

impl AlarmActuator {
    pub fn new(outputs: Arc<dyn DigitalOutput>, config: &AlarmConfig) -> Self {
        Self {
            outputs,
            thresholds: config.clone(),
            pins: config.pins,
            blink_period: config.blink_period(),
            blinking: Arc::new(AtomicBool::new(false)),
            blink_handle: None,
            state: None,
        }
    }

    /// Last applied state, `None` before the first sample or after [`all_off`](Self::all_off)
    pub fn state(&self) -> Option<AlarmState> {
        self.state
    }

    pub fn is_blinking(&self) -> bool {
        self.blink_handle.is_some()
    }

    /// Drive the indicators for `ppm` and return the resulting state
    pub async fn apply(&mut self, ppm: f64) -> AlarmState {
        let state = AlarmState::from_concentration(ppm, &self.thresholds);
        if self.state != Some(state) {
            match self.state {
                Some(previous) => info!("Alarm {} -> {} ({:.1} ppm)", previous, state, ppm),
                None => info!("Alarm {} ({:.1} ppm)", state, ppm),
            }
        }

        if state == AlarmState::Critical {
            self.outputs.set(self.pins.green, false).await;
            self.outputs.set(self.pins.yellow, false).await;
            self.start_blinking();
        } else {
            self.stop_blinking().await;
            self.outputs
                .set(self.pins.green, state == AlarmState::Safe)
                .await;
            self.outputs
                .set(self.pins.yellow, state == AlarmState::Warning)
                .await;
            self.outputs
                .set(self.pins.red, state == AlarmState::Danger)
                .await;
        }

        self.state = Some(state);
        state
    }

    /// Start the red blink task. No-op while it is already running.
    pub fn start_blinking(&mut self) {
        if self.blink_handle.is_some() {
            return;
        }
        debug!("Starting red blink ({:?} on / off)", self.blink_period);
        self.blinking.store(true, Ordering::SeqCst);

        let outputs = self.outputs.clone();
        let flag = self.blinking.clone();
        let red = self.pins.red;
        let period = self.blink_period;
        self.blink_handle = Some(tokio::spawn(async move {
            while flag.load(Ordering::SeqCst) {
                outputs.set(red, true).await;
                tokio::time::sleep(period).await;
                outputs.set(red, false).await;
                if !flag.load(Ordering::SeqCst) {
                    break;
                }
                tokio::time::sleep(period).await;
            }
            outputs.set(red, false).await;
        }));
    }

    /// Stop the blink task, wait for it and leave red off
    pub async fn stop_blinking(&mut self) {
        let Some(handle) = self.blink_handle.take() else {
            return;
        };
        self.blinking.store(false, Ordering::SeqCst);
        if let Err(e) = handle.await {
            warn!("Blink task ended abnormally: {}", e);
        }
        self.outputs.set(self.pins.red, false).await;
        debug!("Red blink stopped");
    }

    /// Stop blinking and turn every indicator off
    pub async fn all_off(&mut self) {
        self.stop_blinking().await;
        for pin in self.pins.all() {
            self.outputs.set(pin, false).await;
        }
        self.state = None;
    }

    /// Light every indicator in turn so an operator can check the wiring.
    ///
    /// Red, then red and yellow together, then green alone, then yellow
    /// alone, each held for `step`. Every indicator ends off.
    pub async fn lamp_test(&mut self, step: Duration) {
        info!("Indicator test: red, yellow, green, yellow");
        self.all_off().await;

        self.outputs.set(self.pins.red, true).await;
        tokio::time::sleep(step).await;
        self.outputs.set(self.pins.yellow, true).await;
        tokio::time::sleep(step).await;

        self.all_off().await;
        self.outputs.set(self.pins.green, true).await;
        tokio::time::sleep(step).await;

        self.all_off().await;
        self.outputs.set(self.pins.yellow, true).await;
        tokio::time::sleep(step).await;

        self.all_off().await;
        info!("Indicator test complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::drivers::MockOutputs;

    fn actuator() -> (AlarmActuator, Arc<MockOutputs>, IndicatorPins) {
        let outputs = Arc::new(MockOutputs::new());
        let config = AlarmConfig::default();
        (
            AlarmActuator::new(outputs.clone(), &config),
            outputs,
            config.pins,
        )
    }

    #[test]
    fn test_bands() {
        let config = AlarmConfig::default();
        let states: Vec<_> = [10.0, 75.0, 150.0, 500.0]
            .into_iter()
            .map(|ppm| AlarmState::from_concentration(ppm, &config))
            .collect();
        assert_eq!(
            states,
            vec![
                AlarmState::Safe,
                AlarmState::Warning,
                AlarmState::Danger,
                AlarmState::Critical
            ]
        );

        // Lower bounds are inclusive
        assert_eq!(AlarmState::from_concentration(50.0, &config), AlarmState::Warning);
        assert_eq!(AlarmState::from_concentration(100.0, &config), AlarmState::Danger);
        assert_eq!(AlarmState::from_concentration(200.0, &config), AlarmState::Critical);
        assert_eq!(AlarmState::from_concentration(49.99, &config), AlarmState::Safe);
    }

    #[tokio::test(start_paused = true)]
    async fn test_steady_states_drive_one_indicator() {
        let (mut actuator, outputs, pins) = actuator();

        assert_eq!(actuator.apply(10.0).await, AlarmState::Safe);
        assert!(outputs.state(pins.green));
        assert!(!outputs.state(pins.yellow));
        assert!(!outputs.state(pins.red));

        assert_eq!(actuator.apply(75.0).await, AlarmState::Warning);
        assert!(!outputs.state(pins.green));
        assert!(outputs.state(pins.yellow));

        assert_eq!(actuator.apply(150.0).await, AlarmState::Danger);
        assert!(!outputs.state(pins.yellow));
        assert!(outputs.state(pins.red));
        assert!(!actuator.is_blinking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_critical_blinks_then_safe_leaves_red_off() {
        let (mut actuator, outputs, pins) = actuator();

        assert_eq!(actuator.apply(500.0).await, AlarmState::Critical);
        assert!(actuator.is_blinking());
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(outputs.times_set_high(pins.red) >= 2);

        assert_eq!(actuator.apply(10.0).await, AlarmState::Safe);
        assert!(!actuator.is_blinking());
        assert!(!outputs.state(pins.red));
        assert!(outputs.state(pins.green));

        // Nothing touches red once the blink task has been joined
        let writes = outputs.history().len();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(outputs.history().len(), writes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blink_start_is_idempotent() {
        let (mut actuator, outputs, pins) = actuator();

        actuator.apply(500.0).await;
        actuator.apply(800.0).await;
        actuator.start_blinking();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // A single task has driven red high once
        assert_eq!(outputs.times_set_high(pins.red), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_critical_to_danger_keeps_red_steady() {
        let (mut actuator, outputs, pins) = actuator();

        actuator.apply(500.0).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        actuator.apply(150.0).await;
        assert!(outputs.state(pins.red));
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(outputs.state(pins.red));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lamp_test_ends_dark() {
        let (mut actuator, outputs, pins) = actuator();
        actuator.lamp_test(Duration::from_secs(1)).await;

        for pin in pins.all() {
            assert!(!outputs.state(pin));
        }
        assert_eq!(outputs.times_set_high(pins.red), 1);
        assert_eq!(outputs.times_set_high(pins.yellow), 2);
        assert_eq!(outputs.times_set_high(pins.green), 1);
    }
}
