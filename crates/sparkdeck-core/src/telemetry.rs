//! Telemetry Poller
//!
//! Fixed-interval device status loop, independent of editing state. Each
//! tick fetches the telemetry snapshot, re-renders the active map's curve
//! with the live operating point, then (chained on the same cadence) polls
//! the emergency channel and runs it through the one-shot alert latch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::console::Console;
use crate::device::{DeviceApi, DeviceError, EmergencyStatus, TelemetrySnapshot};
use crate::notify::{Notification, Notify};
use crate::plot::DrawCommand;
use crate::poll::PollHandle;

/// Device status poll period
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Three-state feature status shown per safety/performance feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeatureState {
    Off,
    Ready,
    Active,
}

impl FeatureState {
    /// Derive the display state from a feature's two flags
    pub fn derive(enabled: bool, active: bool) -> Self {
        match (enabled, active) {
            (false, _) => FeatureState::Off,
            (true, true) => FeatureState::Active,
            (true, false) => FeatureState::Ready,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeatureState::Off => "OFF",
            FeatureState::Ready => "READY",
            FeatureState::Active => "ACTIVE",
        }
    }
}

/// Feature states for the four cut features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureStates {
    pub quick_shifter: FeatureState,
    pub launch_control: FeatureState,
    pub anti_wheelie: FeatureState,
    pub traction_control: FeatureState,
}

impl FeatureStates {
    pub fn derive(status: &TelemetrySnapshot) -> Self {
        Self {
            quick_shifter: FeatureState::derive(status.qs_enabled, status.qs_active),
            launch_control: FeatureState::derive(status.lc_enabled, status.lc_active),
            anti_wheelie: FeatureState::derive(status.aw_enabled, status.aw_active),
            traction_control: FeatureState::derive(status.tc_enabled, status.tc_active),
        }
    }
}

/// Battery voltage display banding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VoltageBand {
    /// Below 11.0 V
    Low,
    /// Below 11.5 V
    Marginal,
    Nominal,
}

impl VoltageBand {
    pub fn classify(volts: f64) -> Self {
        if volts < 11.0 {
            VoltageBand::Low
        } else if volts < 11.5 {
            VoltageBand::Marginal
        } else {
            VoltageBand::Nominal
        }
    }
}

/// Emergency shutdown causes, one bit each in the device's reason mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShutdownReason {
    CoilOverheat,
    LowVoltage,
    SensorFailure,
    PersistentMisfires,
    UserInitiated,
}

impl ShutdownReason {
    const ALL: [(u8, ShutdownReason); 5] = [
        (0x01, ShutdownReason::CoilOverheat),
        (0x02, ShutdownReason::LowVoltage),
        (0x04, ShutdownReason::SensorFailure),
        (0x08, ShutdownReason::PersistentMisfires),
        (0x10, ShutdownReason::UserInitiated),
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ShutdownReason::CoilOverheat => "Coil Overheat",
            ShutdownReason::LowVoltage => "Low Voltage",
            ShutdownReason::SensorFailure => "Sensor Failure",
            ShutdownReason::PersistentMisfires => "Persistent Misfires",
            ShutdownReason::UserInitiated => "User Initiated",
        }
    }

    /// Decode the firmware's bitmask into the set reasons
    pub fn decode(mask: u8) -> Vec<ShutdownReason> {
        Self::ALL
            .iter()
            .filter(|(bit, _)| mask & bit != 0)
            .map(|(_, reason)| *reason)
            .collect()
    }
}

/// Severity-ordered safety indicator, worst condition wins
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SafetyIndicator {
    Shutdown(Vec<ShutdownReason>),
    SafeMode,
    CoilProtection,
    HighMisfires(u32),
    SensorGlitches(u32),
    Clear,
}

impl SafetyIndicator {
    /// Warning thresholds for the diagnostic counters
    const MISFIRE_WARN: u32 = 50;
    const GLITCH_WARN: u32 = 10;

    pub fn derive(emergency: &EmergencyStatus) -> Self {
        if emergency.emergency_shutdown {
            SafetyIndicator::Shutdown(ShutdownReason::decode(emergency.shutdown_reason))
        } else if emergency.emergency_safe_mode {
            SafetyIndicator::SafeMode
        } else if emergency.coil_protection {
            SafetyIndicator::CoilProtection
        } else if emergency.consecutive_misfires > Self::MISFIRE_WARN {
            SafetyIndicator::HighMisfires(emergency.consecutive_misfires)
        } else if emergency.rpm_glitches > Self::GLITCH_WARN {
            SafetyIndicator::SensorGlitches(emergency.rpm_glitches)
        } else {
            SafetyIndicator::Clear
        }
    }
}

/// One-shot emergency alert latch.
///
/// An emergency notification is surfaced at most once per episode: the
/// first poll that observes the shutdown flag yields the alert, subsequent
/// polls are suppressed, and the latch re-arms only after a poll observes
/// the flag clear.
#[derive(Debug, Default)]
pub struct EmergencyLatch {
    alerted: bool,
}

impl EmergencyLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one emergency snapshot. Returns the decoded shutdown reasons on
    /// the alert-worthy edge, `None` otherwise.
    pub fn observe(&mut self, emergency: &EmergencyStatus) -> Option<Vec<ShutdownReason>> {
        if emergency.emergency_shutdown {
            if self.alerted {
                None
            } else {
                self.alerted = true;
                Some(ShutdownReason::decode(emergency.shutdown_reason))
            }
        } else {
            self.alerted = false;
            None
        }
    }
}

/// Everything one poll tick produced
#[derive(Debug, Clone)]
pub struct TelemetryUpdate {
    pub snapshot: TelemetrySnapshot,
    pub features: FeatureStates,
    pub safety: SafetyIndicator,
    pub voltage: VoltageBand,
    /// Ignition curve frame with the live point overlaid when the rendered
    /// map is the device-armed one
    pub frame: Vec<DrawCommand>,
    pub received_at: DateTime<Utc>,
}

/// The telemetry polling loop
pub struct TelemetryMonitor {
    device: Arc<dyn DeviceApi>,
    notifier: Arc<dyn Notify>,
    latch: EmergencyLatch,
}

impl TelemetryMonitor {
    pub fn new(device: Arc<dyn DeviceApi>, notifier: Arc<dyn Notify>) -> Self {
        Self {
            device,
            notifier,
            latch: EmergencyLatch::new(),
        }
    }

    /// Run one poll tick. Reads console state only to decide the live
    /// overlay; editor state is never disturbed.
    pub async fn tick(&mut self, console: &Mutex<Console>) -> Result<TelemetryUpdate, DeviceError> {
        let snapshot = self.device.status().await?;
        let frame = console.lock().await.overlay_live(&snapshot);
        let features = FeatureStates::derive(&snapshot);

        let emergency = self.device.emergency_status().await?;
        let safety = SafetyIndicator::derive(&emergency);
        let voltage = VoltageBand::classify(emergency.battery_voltage);
        if let Some(reasons) = self.latch.observe(&emergency) {
            let labels: Vec<&str> = reasons.iter().map(|r| r.label()).collect();
            self.notifier.notify(Notification::error(format!(
                "EMERGENCY: {}",
                labels.join(", ")
            )));
        }

        Ok(TelemetryUpdate {
            snapshot,
            features,
            safety,
            voltage,
            frame,
            received_at: Utc::now(),
        })
    }

    /// Start the fixed-interval loop. Each successful tick replaces the
    /// watch value wholesale; failures are logged and the loop carries on
    /// with its cached state intact.
    pub fn spawn(
        mut self,
        console: Arc<Mutex<Console>>,
        period: Duration,
    ) -> (PollHandle, watch::Receiver<Option<TelemetryUpdate>>) {
        let (tx, rx) = watch::channel(None);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                match self.tick(&console).await {
                    Ok(update) => {
                        let _ = tx.send(Some(update));
                    }
                    Err(e) => tracing::warn!("telemetry poll failed: {e}"),
                }
            }
        });
        (PollHandle::new(handle), rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_state_table() {
        assert_eq!(FeatureState::derive(false, false), FeatureState::Off);
        assert_eq!(FeatureState::derive(false, true), FeatureState::Off);
        assert_eq!(FeatureState::derive(true, false), FeatureState::Ready);
        assert_eq!(FeatureState::derive(true, true), FeatureState::Active);
        assert_eq!(FeatureState::Active.label(), "ACTIVE");
    }

    #[test]
    fn test_voltage_bands() {
        assert_eq!(VoltageBand::classify(10.9), VoltageBand::Low);
        assert_eq!(VoltageBand::classify(11.2), VoltageBand::Marginal);
        assert_eq!(VoltageBand::classify(12.6), VoltageBand::Nominal);
    }

    #[test]
    fn test_shutdown_reason_decode() {
        assert_eq!(
            ShutdownReason::decode(0x01 | 0x08),
            vec![
                ShutdownReason::CoilOverheat,
                ShutdownReason::PersistentMisfires
            ]
        );
        assert!(ShutdownReason::decode(0).is_empty());
    }

    #[test]
    fn test_safety_indicator_severity_order() {
        let mut e = EmergencyStatus {
            emergency_shutdown: true,
            emergency_safe_mode: true,
            coil_protection: true,
            shutdown_reason: 0x02,
            consecutive_misfires: 100,
            rpm_glitches: 100,
            ..Default::default()
        };
        assert!(matches!(
            SafetyIndicator::derive(&e),
            SafetyIndicator::Shutdown(_)
        ));
        e.emergency_shutdown = false;
        assert_eq!(SafetyIndicator::derive(&e), SafetyIndicator::SafeMode);
        e.emergency_safe_mode = false;
        assert_eq!(SafetyIndicator::derive(&e), SafetyIndicator::CoilProtection);
        e.coil_protection = false;
        assert_eq!(
            SafetyIndicator::derive(&e),
            SafetyIndicator::HighMisfires(100)
        );
        e.consecutive_misfires = 0;
        assert_eq!(
            SafetyIndicator::derive(&e),
            SafetyIndicator::SensorGlitches(100)
        );
        e.rpm_glitches = 0;
        assert_eq!(SafetyIndicator::derive(&e), SafetyIndicator::Clear);
    }

    #[test]
    fn test_emergency_latch_one_shot() {
        let mut latch = EmergencyLatch::new();
        let shutdown = EmergencyStatus {
            emergency_shutdown: true,
            shutdown_reason: 0x01,
            ..Default::default()
        };
        let clear = EmergencyStatus::default();

        assert!(latch.observe(&shutdown).is_some());
        assert!(latch.observe(&shutdown).is_none());
        assert!(latch.observe(&shutdown).is_none());
        // Re-arms only after a clear observation
        assert!(latch.observe(&clear).is_none());
        assert!(latch.observe(&shutdown).is_some());
        assert!(latch.observe(&shutdown).is_none());
    }
}
