// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the airsafe project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Cooperative shutdown
//!
//! [`ShutdownSignal`] is a one-way flag shared by every activity. Activities
//! poll it between hardware operations or race their sleeps against it.
//! [`ShutdownCoordinator`] owns the cleanup sequence and runs it once.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::hardware::{HardwareError, Platform};
use crate::monitor::alarm::AlarmActuator;

/// Process-wide one-way termination flag
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Set the flag. Later calls have no effect.
    pub fn trigger(&self) {
        if !self.sender.send_replace(true) {
            info!("Shutdown requested");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolve once the flag is set
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }

    /// Sleep for `duration` unless shutdown is requested first.
    ///
    /// Returns `true` when the sleep was cut short by shutdown.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => self.is_triggered(),
            _ = self.wait() => true,
        }
    }
}

/// Sequences the release of every activity and hardware handle
pub struct ShutdownCoordinator {
    signal: ShutdownSignal,
    /// How long to wait for the reporter to finish its current cycle
    grace: Duration,
    reporter: Option<JoinHandle<()>>,
    interrupt: Option<JoinHandle<()>>,
    completed: bool,
}

impl ShutdownCoordinator {
    pub fn new(signal: ShutdownSignal, grace: Duration) -> Self {
        Self {
            signal,
            grace,
            reporter: None,
            interrupt: None,
            completed: false,
        }
    }

    pub fn signal(&self) -> &ShutdownSignal {
        &self.signal
    }

    /// Subscribe to Ctrl+C. Only the first call installs a handler.
    pub fn install_interrupt_handler(&mut self) {
        if self.interrupt.is_some() {
            debug!("Interrupt handler already installed");
            return;
        }

        let signal = self.signal.clone();
        self.interrupt = Some(tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => {
                        info!("Interrupt received, stopping monitor");
                        signal.trigger();
                    }
                    Err(e) => error!("Failed to listen for interrupt signal: {}", e),
                },
                _ = signal.wait() => {}
            }
        }));
    }

    /// Hand over the reporter task so shutdown can wait for it
    pub fn register_reporter(&mut self, handle: JoinHandle<()>) {
        self.reporter = Some(handle);
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Run the cleanup sequence.
    ///
    /// Sets the flag, gives the reporter `grace` to stop, turns every
    /// indicator off (joining the blink task) and releases the hardware.
    /// Only the first call does any of this; later calls return `Ok(())`.
    pub async fn shutdown(
        &mut self,
        actuator: &mut AlarmActuator,
        platform: &Platform,
    ) -> Result<(), HardwareError> {
        self.signal.trigger();
        if self.completed {
            debug!("Shutdown already completed");
            return Ok(());
        }
        self.completed = true;

        if let Some(mut handle) = self.reporter.take() {
            match tokio::time::timeout(self.grace, &mut handle).await {
                Ok(Ok(())) => debug!("Reporter stopped"),
                Ok(Err(e)) => warn!("Reporter task ended abnormally: {}", e),
                Err(_) => warn!(
                    "Reporter did not stop within {:?}, leaving it behind",
                    self.grace
                ),
            }
        }

        actuator.all_off().await;

        if let Some(handle) = self.interrupt.take() {
            if let Err(e) = handle.await {
                warn!("Interrupt handler ended abnormally: {}", e);
            }
        }

        let released = platform.release().await;
        match &released {
            Ok(()) => info!("Hardware released"),
            Err(e) => error!("Failed to release hardware: {}", e),
        }
        released
    }
}
