//! Wire types for the device HTTP API
//!
//! Field names mirror the firmware's JSON exactly (camelCase, with a few
//! all-caps acronym suffixes), so every struct pins its renames rather than
//! trusting a blanket rename rule for the irregular ones.

use serde::{Deserialize, Serialize};

use crate::curve::CurvePoint;

fn default_cut_pattern() -> u8 {
    2
}

fn default_lc_target_rpm() -> u32 {
    6000
}

fn default_lc_retard() -> i32 {
    10
}

fn default_aw_pitch() -> f64 {
    15.0
}

fn default_awtc_retard() -> i32 {
    5
}

fn default_wheel_holes() -> u32 {
    4
}

fn default_slip_threshold() -> f64 {
    0.15
}

fn default_front_tire_width() -> u32 {
    70
}

fn default_front_tire_aspect() -> u32 {
    80
}

fn default_rear_tire_width() -> u32 {
    80
}

fn default_rear_tire_aspect() -> u32 {
    90
}

fn default_wheel_diameter() -> u32 {
    17
}

/// One row of the device's map list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSummary {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, rename = "minRPM")]
    pub min_rpm: u32,
    #[serde(default, rename = "maxRPM")]
    pub max_rpm: u32,
    #[serde(default)]
    pub rev_limiter_enabled: bool,
    #[serde(default, rename = "revLimiter")]
    pub rev_limiter_rpm: u32,
    #[serde(default)]
    pub ignition_point_count: usize,
    #[serde(default, rename = "dwellTimeUS")]
    pub dwell_time_us: u32,
    #[serde(default)]
    pub lc_enabled: bool,
    #[serde(default)]
    pub qs_enabled: bool,
    #[serde(default)]
    pub aw_enabled: bool,
    #[serde(default)]
    pub tc_enabled: bool,
}

/// Envelope of `GET /api/maps`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapListResponse {
    pub maps: Vec<MapSummary>,
}

/// Full field set of one map, fetched by positional index.
///
/// Positions shift on create/delete, so an index must be re-resolved after
/// any list refresh before it is used here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDetail {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub engine_type: u8,
    #[serde(default)]
    pub pickup_sensor_offset: i32,
    #[serde(default, rename = "dwellTimeUS")]
    pub dwell_time_us: u32,
    #[serde(default, rename = "revLimiterRPM")]
    pub rev_limiter_rpm: u32,
    #[serde(default)]
    pub rev_limiter_enabled: bool,
    #[serde(default = "default_cut_pattern")]
    pub rev_limiter_cut_pattern: u8,

    #[serde(default)]
    pub ignition_point_count: usize,
    #[serde(default, rename = "ignitionRPM")]
    pub ignition_rpm: Vec<u32>,
    #[serde(default)]
    pub ignition_advance: Vec<f64>,

    #[serde(default)]
    pub qs_enabled: bool,
    #[serde(default)]
    pub qs_sensor_threshold: u32,
    #[serde(default)]
    pub qs_sensor_invert: bool,
    #[serde(default, rename = "qsMinRPM")]
    pub qs_min_rpm: u32,
    #[serde(default, rename = "qsMaxRPM")]
    pub qs_max_rpm: u32,
    #[serde(default)]
    pub qs_point_count: usize,
    #[serde(default, rename = "qsRPM")]
    pub qs_rpm: Vec<u32>,
    #[serde(default)]
    pub qs_kill_time: Vec<f64>,

    #[serde(default, rename = "isACMode")]
    pub is_ac_mode: bool,
    #[serde(default)]
    pub ac_trigger_threshold: u32,
    #[serde(default)]
    pub ac_invert_signal: bool,
    #[serde(default)]
    pub dc_pulses_per_rev: u32,
    #[serde(default)]
    pub dc_pullup_enabled: bool,

    #[serde(default)]
    pub lc_enabled: bool,
    #[serde(default = "default_lc_target_rpm", rename = "lcTargetRPM")]
    pub lc_target_rpm: u32,
    #[serde(default = "default_lc_retard")]
    pub lc_retard_degrees: i32,
    #[serde(default = "default_cut_pattern")]
    pub lc_cut_pattern: u8,

    #[serde(default)]
    pub aw_enabled: bool,
    #[serde(default = "default_aw_pitch")]
    pub aw_pitch_threshold: f64,
    #[serde(default = "default_cut_pattern")]
    pub aw_cut_pattern: u8,
    #[serde(default = "default_awtc_retard")]
    pub aw_retard_degrees: i32,

    #[serde(default)]
    pub tc_enabled: bool,
    #[serde(default = "default_wheel_holes")]
    pub tc_front_wheel_holes: u32,
    #[serde(default = "default_wheel_holes")]
    pub tc_rear_wheel_holes: u32,
    #[serde(default = "default_slip_threshold")]
    pub tc_slip_threshold: f64,
    #[serde(default = "default_cut_pattern")]
    pub tc_cut_pattern: u8,
    #[serde(default = "default_awtc_retard")]
    pub tc_retard_degrees: i32,

    #[serde(default = "default_front_tire_width")]
    pub tc_front_tire_width: u32,
    #[serde(default = "default_front_tire_aspect")]
    pub tc_front_tire_aspect: u32,
    #[serde(default = "default_wheel_diameter")]
    pub tc_front_wheel_diameter: u32,
    #[serde(default = "default_rear_tire_width")]
    pub tc_rear_tire_width: u32,
    #[serde(default = "default_rear_tire_aspect")]
    pub tc_rear_tire_aspect: u32,
    #[serde(default = "default_wheel_diameter")]
    pub tc_rear_wheel_diameter: u32,
}

impl MapDetail {
    fn points(count: usize, rpm: &[u32], values: &[f64]) -> Vec<CurvePoint> {
        // A zero/absent count means the arrays carry their own length
        let count = if count == 0 { rpm.len() } else { count };
        rpm.iter()
            .zip(values.iter())
            .take(count)
            .map(|(&rpm, &value)| CurvePoint { rpm, value })
            .collect()
    }

    /// Ignition curve as model points, truncated to the declared count
    pub fn ignition_points(&self) -> Vec<CurvePoint> {
        Self::points(
            self.ignition_point_count,
            &self.ignition_rpm,
            &self.ignition_advance,
        )
    }

    /// Quick-shifter kill-time curve as model points
    pub fn qs_points(&self) -> Vec<CurvePoint> {
        Self::points(self.qs_point_count, &self.qs_rpm, &self.qs_kill_time)
    }
}

/// Snapshot of `GET /api/status`. Replaced wholesale each poll tick; never
/// merged field-by-field with an older snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    #[serde(default)]
    pub rpm: u32,
    #[serde(default)]
    pub advance: f64,
    #[serde(default, rename = "dwellTimeUS")]
    pub dwell_time_us: u32,
    #[serde(default)]
    pub map_name: String,

    #[serde(default)]
    pub front_wheel_speed: f64,
    #[serde(default)]
    pub rear_wheel_speed: f64,
    #[serde(default)]
    pub current_pitch: f64,
    #[serde(default)]
    pub slip_ratio: f64,

    #[serde(default, rename = "isACMode")]
    pub is_ac_mode: bool,
    #[serde(default)]
    pub trigger_sensor_value: i32,
    #[serde(default)]
    pub qs_sensor_value: u32,
    #[serde(default)]
    pub clutch_pulled: Option<bool>,

    #[serde(default)]
    pub qs_enabled: bool,
    #[serde(default)]
    pub qs_active: bool,
    #[serde(default)]
    pub lc_enabled: bool,
    #[serde(default)]
    pub lc_active: bool,
    #[serde(default)]
    pub aw_enabled: bool,
    #[serde(default)]
    pub aw_active: bool,
    #[serde(default)]
    pub tc_enabled: bool,
    #[serde(default)]
    pub tc_active: bool,

    #[serde(default)]
    pub rev_limiter_active: bool,
    #[serde(default, rename = "revLimiterRPM")]
    pub rev_limiter_rpm: u32,
    #[serde(default)]
    pub total_ignitions: u64,

    #[serde(default)]
    pub qs_calibrating: bool,
    #[serde(default)]
    pub qs_calibrate_step: u8,

    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
}

/// Safety-state snapshot from `POST /api/emergency?action=status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyStatus {
    #[serde(default)]
    pub emergency_shutdown: bool,
    #[serde(default)]
    pub emergency_safe_mode: bool,
    #[serde(default)]
    pub coil_protection: bool,
    #[serde(default)]
    pub shutdown_reason: u8,
    #[serde(default)]
    pub consecutive_misfires: u32,
    #[serde(default)]
    pub rpm_glitches: u32,
    #[serde(default)]
    pub low_voltage_counter: u32,
    #[serde(default)]
    pub battery_voltage: f64,
    #[serde(default)]
    pub min_voltage: f64,
}

/// Sensor readout from `GET /api/calibrateQS/status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationStatus {
    #[serde(default)]
    pub calibrating: bool,
    #[serde(default)]
    pub step: u8,
    #[serde(default)]
    pub sensor_value: u32,
}

/// Reply to `POST /api/calibrateQS/capture`. The press capture advances the
/// device-held step counter; the release capture carries the results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationCapture {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub step: u8,
    #[serde(default)]
    pub pressed_value: Option<u32>,
    #[serde(default)]
    pub released_value: Option<u32>,
    #[serde(default)]
    pub threshold: Option<u32>,
    #[serde(default)]
    pub inverted: Option<bool>,
}

/// Reply envelope shared by the map CRUD endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrudResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub map_id: Option<u32>,
    #[serde(default)]
    pub new_map_id: Option<u32>,
    #[serde(default)]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Partial-update payloads. Each save supplies only the fields its surface
// owns; the device merges them into the stored map record.
// ---------------------------------------------------------------------------

/// Ignition tab save payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnitionPatch {
    pub name: String,
    pub engine_type: u8,
    pub pickup_sensor_offset: i32,
    #[serde(rename = "dwellTimeUS")]
    pub dwell_time_us: u32,
    #[serde(rename = "revLimiterRPM")]
    pub rev_limiter_rpm: u32,
    pub rev_limiter_enabled: bool,
    pub rev_limiter_cut_pattern: u8,
    pub ignition_point_count: usize,
    #[serde(rename = "ignitionRPM")]
    pub ignition_rpm: Vec<u32>,
    pub ignition_advance: Vec<f64>,
}

/// Quick-shifter sub-panel save payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickShifterPatch {
    pub name: String,
    pub qs_enabled: bool,
    pub qs_sensor_threshold: u32,
    pub qs_sensor_invert: bool,
    #[serde(rename = "qsMinRPM")]
    pub qs_min_rpm: u32,
    #[serde(rename = "qsMaxRPM")]
    pub qs_max_rpm: u32,
    pub qs_point_count: usize,
    #[serde(rename = "qsRPM")]
    pub qs_rpm: Vec<u32>,
    pub qs_kill_time: Vec<f64>,
}

/// Settings tab save payload (map name and trigger input mode)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub name: String,
    #[serde(rename = "isACMode")]
    pub is_ac_mode: bool,
    pub ac_trigger_threshold: u32,
    pub ac_invert_signal: bool,
    pub dc_pulses_per_rev: u32,
    pub dc_pullup_enabled: bool,
}

/// Launch-control panel save payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchControlPatch {
    pub lc_enabled: bool,
    #[serde(rename = "lcTargetRPM")]
    pub lc_target_rpm: u32,
    pub lc_retard_degrees: i32,
    pub lc_cut_pattern: u8,
}

/// Anti-wheelie / traction-control panel save payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwTcPatch {
    pub aw_enabled: bool,
    pub aw_pitch_threshold: f64,
    pub aw_cut_pattern: u8,
    pub aw_retard_degrees: i32,
    pub tc_enabled: bool,
    pub tc_front_wheel_holes: u32,
    pub tc_rear_wheel_holes: u32,
    pub tc_slip_threshold: f64,
    pub tc_cut_pattern: u8,
    pub tc_retard_degrees: i32,
    pub tc_front_tire_width: u32,
    pub tc_front_tire_aspect: u32,
    pub tc_front_wheel_diameter: u32,
    pub tc_rear_tire_width: u32,
    pub tc_rear_tire_aspect: u32,
    pub tc_rear_wheel_diameter: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_detail_curve_extraction() {
        let detail: MapDetail = serde_json::from_value(serde_json::json!({
            "name": "Street",
            "ignitionPointCount": 2,
            "ignitionRPM": [0, 1000, 3000],
            "ignitionAdvance": [5.0, 10.0, 20.0],
            "qsRPM": [3000, 9000],
            "qsKillTime": [70.0, 55.0]
        }))
        .unwrap();

        // Declared count truncates
        let ign = detail.ignition_points();
        assert_eq!(ign.len(), 2);
        assert_eq!(ign[1].rpm, 1000);

        // Absent count falls back to array length
        let qs = detail.qs_points();
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].value, 70.0);
    }

    #[test]
    fn test_map_detail_feature_defaults() {
        let detail: MapDetail = serde_json::from_value(serde_json::json!({
            "name": "Bare"
        }))
        .unwrap();
        assert_eq!(detail.lc_target_rpm, 6000);
        assert_eq!(detail.lc_retard_degrees, 10);
        assert_eq!(detail.aw_pitch_threshold, 15.0);
        assert_eq!(detail.tc_slip_threshold, 0.15);
        assert_eq!(detail.rev_limiter_cut_pattern, 2);
        assert_eq!(detail.tc_front_tire_width, 70);
        assert_eq!(detail.tc_rear_tire_aspect, 90);
    }

    #[test]
    fn test_patch_wire_names() {
        let patch = IgnitionPatch {
            name: "Track".into(),
            engine_type: 0,
            pickup_sensor_offset: 0,
            dwell_time_us: 3000,
            rev_limiter_rpm: 12000,
            rev_limiter_enabled: true,
            rev_limiter_cut_pattern: 2,
            ignition_point_count: 2,
            ignition_rpm: vec![0, 1000],
            ignition_advance: vec![5.0, 10.0],
        };
        let v = serde_json::to_value(&patch).unwrap();
        assert!(v.get("dwellTimeUS").is_some());
        assert!(v.get("revLimiterRPM").is_some());
        assert!(v.get("ignitionRPM").is_some());
        assert!(v.get("ignitionPointCount").is_some());

        let settings = SettingsPatch {
            name: "Track".into(),
            is_ac_mode: true,
            ac_trigger_threshold: 2048,
            ac_invert_signal: false,
            dc_pulses_per_rev: 1,
            dc_pullup_enabled: false,
        };
        let v = serde_json::to_value(&settings).unwrap();
        assert!(v.get("isACMode").is_some());
    }

    #[test]
    fn test_telemetry_snapshot_tolerates_missing_fields() {
        let s: TelemetrySnapshot = serde_json::from_value(serde_json::json!({
            "rpm": 4200,
            "advance": 24.0,
            "mapName": "Street"
        }))
        .unwrap();
        assert_eq!(s.rpm, 4200);
        assert_eq!(s.clutch_pulled, None);
        assert!(!s.qs_enabled);
    }
}
