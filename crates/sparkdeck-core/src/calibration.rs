//! Quick-shifter sensor calibration
//!
//! Drives the device-held two-step capture sequence: the operator presses
//! the shift lever for the first capture and releases it for the second,
//! while a short-period sensor poll feeds the live readout. The step
//! counter lives on the device; the session only mirrors it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::device::{CalibrationStatus, DeviceApi, DeviceError};
use crate::poll::PollHandle;
use crate::surfaces::QuickShifterSurface;

/// Sensor readout poll period while calibrating
pub const SENSOR_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// A finished calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationResult {
    pub pressed_value: u32,
    pub released_value: u32,
    pub threshold: u32,
    pub inverted: bool,
}

/// What a capture advanced the sequence to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Press captured; the device now waits for the release capture
    AwaitRelease,
    /// Release captured; calibration is complete
    Complete(CalibrationResult),
}

/// One calibration attempt, including its bounded sensor poll
pub struct CalibrationSession {
    device: Arc<dyn DeviceApi>,
    sensor_poll: Option<PollHandle>,
}

impl CalibrationSession {
    pub fn new(device: Arc<dyn DeviceApi>) -> Self {
        Self {
            device,
            sensor_poll: None,
        }
    }

    /// Whether the sensor poll is still scheduled
    pub fn is_polling(&self) -> bool {
        self.sensor_poll
            .as_ref()
            .map(|p| p.is_running())
            .unwrap_or(false)
    }

    /// Begin calibration on the device and start the sensor poll.
    ///
    /// The returned receiver carries the latest sensor readout. The poll
    /// stops itself when the device reports calibration over, and is also
    /// stopped by [`CalibrationSession::cancel`] or a completing capture.
    pub async fn start(
        &mut self,
    ) -> Result<watch::Receiver<Option<CalibrationStatus>>, DeviceError> {
        self.device.calibration_start().await?;

        let (tx, rx) = watch::channel(None);
        let device = Arc::clone(&self.device);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SENSOR_POLL_INTERVAL);
            loop {
                ticker.tick().await;
                match device.calibration_status().await {
                    Ok(status) => {
                        let finished = !status.calibrating;
                        let _ = tx.send(Some(status));
                        if finished {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("calibration status poll failed: {e}"),
                }
            }
        });
        self.stop_poll();
        self.sensor_poll = Some(PollHandle::new(handle));
        Ok(rx)
    }

    /// Capture the current sensor value for the device's current step.
    pub async fn capture(&mut self) -> Result<CaptureOutcome, DeviceError> {
        let capture = self.device.calibration_capture().await?;
        match (
            capture.pressed_value,
            capture.released_value,
            capture.threshold,
            capture.inverted,
        ) {
            (Some(pressed_value), Some(released_value), Some(threshold), Some(inverted)) => {
                self.stop_poll();
                Ok(CaptureOutcome::Complete(CalibrationResult {
                    pressed_value,
                    released_value,
                    threshold,
                    inverted,
                }))
            }
            _ => Ok(CaptureOutcome::AwaitRelease),
        }
    }

    /// Abandon the calibration. Idempotent: the poll stops even if the
    /// device call fails, and cancelling twice is a no-op.
    pub async fn cancel(&mut self) -> Result<(), DeviceError> {
        self.stop_poll();
        self.device.calibration_cancel().await
    }

    /// Feed a finished calibration into the quick-shifter form.
    pub fn apply(result: &CalibrationResult, surface: &mut QuickShifterSurface) {
        surface.apply_calibration(result.threshold, result.inverted);
    }

    fn stop_poll(&mut self) {
        if let Some(mut poll) = self.sensor_poll.take() {
            poll.stop();
        }
    }
}

impl Drop for CalibrationSession {
    fn drop(&mut self) {
        self.stop_poll();
    }
}
