//! Demo Mode - Simulated device for testing
//!
//! An in-memory [`DeviceApi`] implementation that behaves like the real
//! controller: a seeded map list with one active map, field-level JSON merge
//! on partial updates, and telemetry from a simulated engine idling with
//! occasional throttle blips. Lets the whole console run without hardware.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;

use async_trait::async_trait;

use crate::device::{
    CalibrationCapture, CalibrationStatus, DeviceApi, DeviceError, EmergencyStatus, MapDetail,
    MapSummary, TelemetrySnapshot,
};

const IDLE_RPM: f64 = 1600.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum BlipState {
    Idle,
    RampUp,
    Hold { until_ms: u64 },
    RampDown,
}

struct DemoMap {
    id: u32,
    detail: MapDetail,
}

struct DemoCalibration {
    step: u8,
    pressed_value: Option<u32>,
}

struct DemoState {
    maps: Vec<DemoMap>,
    active: usize,
    next_id: u32,
    rng: StdRng,

    started: Instant,
    last_update_ms: u64,
    blip: BlipState,
    next_blip_at_ms: u64,
    current_rpm: f64,
    blip_target_rpm: f64,
    total_ignitions: u64,

    emergency: EmergencyStatus,
    calibration: Option<DemoCalibration>,
}

/// Simulated ignition controller
pub struct DemoDevice {
    state: Mutex<DemoState>,
}

fn template_map(name: &str) -> MapDetail {
    // The serde defaults are the factory template
    serde_json::from_value(serde_json::json!({
        "name": name,
        "dwellTimeUS": 3000,
        "revLimiterRPM": 12000,
        "revLimiterEnabled": true,
        "ignitionRPM": [0, 1000, 3000, 6000, 9000, 12000, 15000, 18000],
        "ignitionAdvance": [5.0, 10.0, 20.0, 30.0, 35.0, 32.0, 28.0, 25.0],
        "ignitionPointCount": 8,
        "qsEnabled": true,
        "qsSensorThreshold": 2048,
        "qsMinRPM": 3000,
        "qsMaxRPM": 15000,
        "qsRPM": [3000, 6000, 9000, 12000],
        "qsKillTime": [75.0, 65.0, 58.0, 52.0],
        "qsPointCount": 4,
        "isACMode": true,
        "acTriggerThreshold": 2048,
        "dcPulsesPerRev": 1
    }))
    .expect("demo template is well-formed")
}

/// Linear interpolation of advance over the map's ignition curve, clamped
/// to the curve's ends
fn advance_at(detail: &MapDetail, rpm: f64) -> f64 {
    let points = detail.ignition_points();
    match points.first() {
        None => 0.0,
        Some(first) if rpm <= first.rpm as f64 => first.value,
        Some(_) => {
            for pair in points.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                if rpm <= b.rpm as f64 {
                    let span = (b.rpm - a.rpm) as f64;
                    if span <= 0.0 {
                        return a.value;
                    }
                    let t = (rpm - a.rpm as f64) / span;
                    return a.value + (b.value - a.value) * t;
                }
            }
            points.last().map(|p| p.value).unwrap_or(0.0)
        }
    }
}

impl DemoDevice {
    /// Create a demo device with two maps, the first active
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Deterministic variant for tests
    pub fn with_seed(seed: u64) -> Self {
        let mut street = template_map("Street");
        street.lc_enabled = false;
        let mut track = template_map("Track");
        track.lc_enabled = true;
        track.aw_enabled = true;
        track.tc_enabled = true;

        let mut rng = StdRng::seed_from_u64(seed);
        let first_blip = rng.gen_range(4000..9000);

        Self {
            state: Mutex::new(DemoState {
                maps: vec![
                    DemoMap {
                        id: 1,
                        detail: street,
                    },
                    DemoMap {
                        id: 2,
                        detail: track,
                    },
                ],
                active: 0,
                next_id: 3,
                rng,
                started: Instant::now(),
                last_update_ms: 0,
                blip: BlipState::Idle,
                next_blip_at_ms: first_blip,
                current_rpm: IDLE_RPM,
                blip_target_rpm: 0.0,
                total_ignitions: 0,
                emergency: EmergencyStatus {
                    battery_voltage: 12.6,
                    min_voltage: 11.8,
                    ..Default::default()
                },
                calibration: None,
            }),
        }
    }

    /// Script the emergency channel (testing hook)
    pub async fn set_emergency(&self, shutdown: bool, reason_mask: u8) {
        let mut state = self.state.lock().await;
        state.emergency.emergency_shutdown = shutdown;
        state.emergency.shutdown_reason = if shutdown { reason_mask } else { 0 };
    }
}

impl Default for DemoDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoState {
    fn summary(&self, index: usize, map: &DemoMap) -> MapSummary {
        let d = &map.detail;
        let points = d.ignition_points();
        MapSummary {
            id: map.id,
            name: d.name.clone(),
            is_active: index == self.active,
            min_rpm: points.first().map(|p| p.rpm).unwrap_or(0),
            max_rpm: points.last().map(|p| p.rpm).unwrap_or(0),
            rev_limiter_enabled: d.rev_limiter_enabled,
            rev_limiter_rpm: d.rev_limiter_rpm,
            ignition_point_count: points.len(),
            dwell_time_us: d.dwell_time_us,
            lc_enabled: d.lc_enabled,
            qs_enabled: d.qs_enabled,
            aw_enabled: d.aw_enabled,
            tc_enabled: d.tc_enabled,
        }
    }

    /// Advance the engine simulation to now and return the smoothed RPM
    fn step_engine(&mut self) -> f64 {
        let now_ms = self.started.elapsed().as_millis() as u64;
        let delta_ms = now_ms.saturating_sub(self.last_update_ms);
        self.last_update_ms = now_ms;

        match self.blip {
            BlipState::Idle => {
                if now_ms >= self.next_blip_at_ms {
                    self.blip_target_rpm = self.rng.gen_range(4000.0..9500.0);
                    self.blip = BlipState::RampUp;
                }
            }
            BlipState::RampUp => {
                if self.current_rpm >= self.blip_target_rpm - 100.0 {
                    self.blip = BlipState::Hold {
                        until_ms: now_ms + self.rng.gen_range(500..1500),
                    };
                }
            }
            BlipState::Hold { until_ms } => {
                if now_ms >= until_ms {
                    self.blip = BlipState::RampDown;
                }
            }
            BlipState::RampDown => {
                if self.current_rpm <= IDLE_RPM + 100.0 {
                    self.blip = BlipState::Idle;
                    self.next_blip_at_ms = now_ms + self.rng.gen_range(4000..9000);
                }
            }
        }

        let target = match self.blip {
            BlipState::Idle => IDLE_RPM,
            BlipState::RampUp | BlipState::Hold { .. } => self.blip_target_rpm,
            BlipState::RampDown => IDLE_RPM,
        };

        let rate = if target > self.current_rpm { 8000.0 } else { 3000.0 };
        let max_change = rate * (delta_ms as f64 / 1000.0);
        let diff = target - self.current_rpm;
        self.current_rpm += diff.clamp(-max_change, max_change);

        let t = now_ms as f64 / 1000.0;
        let wobble = if self.blip == BlipState::Idle {
            20.0 * (t * 2.5).sin() + 10.0 * (t * 7.3).sin()
        } else {
            0.0
        };

        self.total_ignitions += (self.current_rpm / 60.0 * (delta_ms as f64 / 1000.0)) as u64;
        (self.current_rpm + wobble).max(0.0)
    }
}

#[async_trait]
impl DeviceApi for DemoDevice {
    async fn list_maps(&self) -> Result<Vec<MapSummary>, DeviceError> {
        let state = self.state.lock().await;
        Ok(state
            .maps
            .iter()
            .enumerate()
            .map(|(i, m)| state.summary(i, m))
            .collect())
    }

    async fn map_detail(&self, index: usize) -> Result<MapDetail, DeviceError> {
        let state = self.state.lock().await;
        state
            .maps
            .get(index)
            .map(|m| m.detail.clone())
            .ok_or(DeviceError::Status(404))
    }

    async fn update_map(
        &self,
        index: usize,
        patch: serde_json::Value,
    ) -> Result<(), DeviceError> {
        let mut state = self.state.lock().await;
        let map = state.maps.get_mut(index).ok_or(DeviceError::Status(404))?;

        // Field-level merge, exactly what the firmware does with a PUT body
        let mut merged =
            serde_json::to_value(&map.detail).map_err(|e| DeviceError::Decode(e.to_string()))?;
        if let (Some(target), Some(fields)) = (merged.as_object_mut(), patch.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        map.detail =
            serde_json::from_value(merged).map_err(|e| DeviceError::Decode(e.to_string()))?;
        Ok(())
    }

    async fn select_map(&self, index: usize) -> Result<(), DeviceError> {
        let mut state = self.state.lock().await;
        if index >= state.maps.len() {
            return Err(DeviceError::Status(404));
        }
        state.active = index;
        Ok(())
    }

    async fn create_map(&self, name: &str) -> Result<u32, DeviceError> {
        let mut state = self.state.lock().await;
        let id = state.next_id;
        state.next_id += 1;
        state.maps.push(DemoMap {
            id,
            detail: template_map(name),
        });
        Ok(id)
    }

    async fn delete_map(&self, map_id: u32) -> Result<(), DeviceError> {
        let mut state = self.state.lock().await;
        let index = state
            .maps
            .iter()
            .position(|m| m.id == map_id)
            .ok_or_else(|| DeviceError::Rejected("unknown map id".to_string()))?;
        if index == state.active {
            return Err(DeviceError::Rejected(
                "cannot delete the active map".to_string(),
            ));
        }
        state.maps.remove(index);
        if index < state.active {
            state.active -= 1;
        }
        Ok(())
    }

    async fn duplicate_map(&self, source_map_id: u32) -> Result<u32, DeviceError> {
        let mut state = self.state.lock().await;
        let source = state
            .maps
            .iter()
            .position(|m| m.id == source_map_id)
            .ok_or_else(|| DeviceError::Rejected("unknown map id".to_string()))?;
        let mut detail = state.maps[source].detail.clone();
        detail.name = format!("{} (copy)", detail.name);
        let id = state.next_id;
        state.next_id += 1;
        state.maps.push(DemoMap { id, detail });
        Ok(id)
    }

    async fn status(&self) -> Result<TelemetrySnapshot, DeviceError> {
        let mut state = self.state.lock().await;
        let rpm = state.step_engine();
        let active = state.active;
        let detail = state.maps[active].detail.clone();
        let advance = advance_at(&detail, rpm);

        let front_wheel_speed = rpm * 0.011;
        let slip = if detail.tc_enabled {
            state.rng.gen_range(0.0..0.04)
        } else {
            0.0
        };
        let qs_sensor_value = state.rng.gen_range(900..1100);
        let calibrating = state.calibration.as_ref();

        Ok(TelemetrySnapshot {
            rpm: rpm as u32,
            advance,
            dwell_time_us: detail.dwell_time_us,
            map_name: detail.name.clone(),
            front_wheel_speed,
            rear_wheel_speed: front_wheel_speed * (1.0 + slip),
            current_pitch: (state.last_update_ms as f64 / 3000.0).sin() * 2.0,
            slip_ratio: slip,
            is_ac_mode: detail.is_ac_mode,
            trigger_sensor_value: 2048,
            qs_sensor_value,
            clutch_pulled: Some(false),
            qs_enabled: detail.qs_enabled,
            qs_active: false,
            lc_enabled: detail.lc_enabled,
            lc_active: false,
            aw_enabled: detail.aw_enabled,
            aw_active: false,
            tc_enabled: detail.tc_enabled,
            tc_active: false,
            rev_limiter_active: detail.rev_limiter_enabled
                && rpm as u32 >= detail.rev_limiter_rpm,
            rev_limiter_rpm: detail.rev_limiter_rpm,
            total_ignitions: state.total_ignitions,
            qs_calibrating: calibrating.is_some(),
            qs_calibrate_step: calibrating.map(|c| c.step).unwrap_or(0),
            author: Some("SparkDeck Demo".to_string()),
            version: Some("0.1.0".to_string()),
            copyright: None,
        })
    }

    async fn emergency_status(&self) -> Result<EmergencyStatus, DeviceError> {
        Ok(self.state.lock().await.emergency.clone())
    }

    async fn emergency_reset(&self) -> Result<(), DeviceError> {
        let mut state = self.state.lock().await;
        state.emergency.emergency_shutdown = false;
        state.emergency.shutdown_reason = 0;
        Ok(())
    }

    async fn calibration_start(&self) -> Result<(), DeviceError> {
        let mut state = self.state.lock().await;
        state.calibration = Some(DemoCalibration {
            step: 1,
            pressed_value: None,
        });
        Ok(())
    }

    async fn calibration_capture(&self) -> Result<CalibrationCapture, DeviceError> {
        let mut state = self.state.lock().await;
        let sensor: u32 = state.rng.gen_range(900..1100);
        let calibration = state
            .calibration
            .as_mut()
            .ok_or_else(|| DeviceError::Rejected("not calibrating".to_string()))?;

        match calibration.step {
            1 => {
                calibration.pressed_value = Some(sensor + 2000);
                calibration.step = 2;
                Ok(CalibrationCapture {
                    success: true,
                    step: 2,
                    ..Default::default()
                })
            }
            _ => {
                let pressed_value = calibration.pressed_value.unwrap_or(3000);
                let released_value = sensor;
                state.calibration = None;
                Ok(CalibrationCapture {
                    success: true,
                    step: 2,
                    pressed_value: Some(pressed_value),
                    released_value: Some(released_value),
                    threshold: Some((pressed_value + released_value) / 2),
                    inverted: Some(pressed_value < released_value),
                })
            }
        }
    }

    async fn calibration_cancel(&self) -> Result<(), DeviceError> {
        self.state.lock().await.calibration = None;
        Ok(())
    }

    async fn calibration_status(&self) -> Result<CalibrationStatus, DeviceError> {
        let mut state = self.state.lock().await;
        let sensor = state.rng.gen_range(900..1100);
        Ok(match &state.calibration {
            Some(c) => CalibrationStatus {
                calibrating: true,
                step: c.step,
                sensor_value: sensor,
            },
            None => CalibrationStatus {
                calibrating: false,
                step: 0,
                sensor_value: sensor,
            },
        })
    }

    async fn restart(&self) -> Result<(), DeviceError> {
        Ok(())
    }
}
