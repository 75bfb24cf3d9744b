//! Editing surfaces
//!
//! The four panels that edit a map: ignition/settings, quick-shifter,
//! launch control, and anti-wheelie/traction. Each surface holds a detached
//! working copy of the fields it owns, hydration from a map detail is the
//! only path device data takes into a surface, and a save round-trip is the
//! only path back out.
//!
//! Numeric inputs are kept as raw text ([`NumField`]) because the operator
//! edits free-form; parsing happens at save time with a declared default
//! substituted for anything unparseable.

use crate::curve::{Curve, CurveError, CurveKind};
use crate::device::{
    AwTcPatch, IgnitionPatch, LaunchControlPatch, MapDetail, QuickShifterPatch, SettingsPatch,
};
use crate::tire::TireSpec;

// Save-time fallback defaults, as the firmware documents them
const DEFAULT_ENGINE_TYPE: u8 = 0;
const DEFAULT_PICKUP_OFFSET: i32 = 0;
const DEFAULT_DWELL_US: u32 = 3000;
const DEFAULT_REV_LIMITER_RPM: u32 = 12_000;
const DEFAULT_CUT_PATTERN: u8 = 2;
const DEFAULT_QS_THRESHOLD: u32 = 2048;
const DEFAULT_QS_MIN_RPM: u32 = 3000;
const DEFAULT_QS_MAX_RPM: u32 = 15_000;
const DEFAULT_AC_THRESHOLD: u32 = 2048;
const DEFAULT_DC_PULSES: u32 = 1;
const DEFAULT_LC_TARGET_RPM: u32 = 6000;
const DEFAULT_LC_RETARD: i32 = 10;
const DEFAULT_AW_PITCH: f64 = 15.0;
const DEFAULT_AWTC_RETARD: i32 = 5;
const DEFAULT_WHEEL_HOLES: u32 = 4;
const DEFAULT_SLIP_THRESHOLD: f64 = 0.15;

/// A free-text numeric form field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumField {
    raw: String,
}

impl NumField {
    pub fn from_value(value: impl ToString) -> Self {
        Self {
            raw: value.to_string(),
        }
    }

    /// Overwrite the field text (operator keystrokes or hydration)
    pub fn set(&mut self, value: impl ToString) {
        self.raw = value.to_string();
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn u32_or(&self, default: u32) -> u32 {
        self.raw.trim().parse().unwrap_or(default)
    }

    pub fn i32_or(&self, default: i32) -> i32 {
        self.raw.trim().parse().unwrap_or(default)
    }

    pub fn u8_or(&self, default: u8) -> u8 {
        self.raw.trim().parse().unwrap_or(default)
    }

    pub fn f64_or(&self, default: f64) -> f64 {
        self.raw.trim().parse().unwrap_or(default)
    }
}

/// Common surface behavior the synchronizer fans out over
pub trait EditingSurface {
    /// Short name used in log lines
    fn label(&self) -> &'static str;

    /// Point the surface's map selector at a positional index
    fn bind(&mut self, index: usize);

    /// The index the surface's selector currently shows
    fn bound_index(&self) -> Option<usize>;

    /// Replace the surface's working state from one map detail snapshot
    fn hydrate(&mut self, detail: &MapDetail, is_active: bool);
}

/// Ignition tab: timing curve, spark settings, and the settings sub-panel
/// (map name, trigger input mode)
#[derive(Debug, Clone)]
pub struct IgnitionSurface {
    bound: Option<usize>,
    pub is_active: bool,

    pub engine_type: NumField,
    pub pickup_sensor_offset: NumField,
    pub dwell_time_us: NumField,
    pub rev_limiter_rpm: NumField,
    pub rev_limiter_enabled: bool,
    pub rev_limiter_cut_pattern: NumField,
    pub curve: Curve,

    pub map_name: String,
    pub ac_mode: bool,
    pub ac_trigger_threshold: NumField,
    pub ac_invert_signal: bool,
    pub dc_pulses_per_rev: NumField,
    pub dc_pullup_enabled: bool,
}

impl Default for IgnitionSurface {
    fn default() -> Self {
        Self {
            bound: None,
            is_active: false,
            engine_type: NumField::default(),
            pickup_sensor_offset: NumField::default(),
            dwell_time_us: NumField::default(),
            rev_limiter_rpm: NumField::default(),
            rev_limiter_enabled: false,
            rev_limiter_cut_pattern: NumField::default(),
            curve: Curve::new(CurveKind::Ignition),
            map_name: String::new(),
            ac_mode: false,
            ac_trigger_threshold: NumField::default(),
            ac_invert_signal: false,
            dc_pulses_per_rev: NumField::default(),
            dc_pullup_enabled: false,
        }
    }
}

impl IgnitionSurface {
    /// Overwrite one curve row from table text. Unparseable text falls back
    /// to zero; ordering is only checked at save.
    pub fn edit_point(&mut self, index: usize, rpm: &str, advance: &str) -> Result<(), CurveError> {
        let rpm = rpm.trim().parse().unwrap_or(0);
        let advance = advance.trim().parse().unwrap_or(0.0);
        self.curve.set_point(index, rpm, advance)
    }

    /// Reset the working curve to the factory 8-point template
    pub fn reset_to_default(&mut self) {
        self.curve = Curve::default_ignition();
    }

    /// Build the ignition save payload. Fails without touching the device
    /// when the curve violates strict ascending order.
    pub fn ignition_patch(&self, map_name: &str) -> Result<IgnitionPatch, CurveError> {
        self.curve.validate_ascending()?;
        let series = self.curve.serialize();
        Ok(IgnitionPatch {
            name: map_name.to_string(),
            engine_type: self.engine_type.u8_or(DEFAULT_ENGINE_TYPE),
            pickup_sensor_offset: self.pickup_sensor_offset.i32_or(DEFAULT_PICKUP_OFFSET),
            dwell_time_us: self.dwell_time_us.u32_or(DEFAULT_DWELL_US),
            rev_limiter_rpm: self.rev_limiter_rpm.u32_or(DEFAULT_REV_LIMITER_RPM),
            rev_limiter_enabled: self.rev_limiter_enabled,
            rev_limiter_cut_pattern: self.rev_limiter_cut_pattern.u8_or(DEFAULT_CUT_PATTERN),
            ignition_point_count: series.count,
            ignition_rpm: series.rpm,
            ignition_advance: series.values,
        })
    }

    /// Build the settings save payload (name and trigger input mode)
    pub fn settings_patch(&self) -> SettingsPatch {
        SettingsPatch {
            name: self.map_name.clone(),
            is_ac_mode: self.ac_mode,
            ac_trigger_threshold: self.ac_trigger_threshold.u32_or(DEFAULT_AC_THRESHOLD),
            ac_invert_signal: self.ac_invert_signal,
            dc_pulses_per_rev: self.dc_pulses_per_rev.u32_or(DEFAULT_DC_PULSES),
            dc_pullup_enabled: self.dc_pullup_enabled,
        }
    }
}

impl EditingSurface for IgnitionSurface {
    fn label(&self) -> &'static str {
        "ignition"
    }

    fn bind(&mut self, index: usize) {
        self.bound = Some(index);
    }

    fn bound_index(&self) -> Option<usize> {
        self.bound
    }

    fn hydrate(&mut self, detail: &MapDetail, is_active: bool) {
        self.is_active = is_active;
        self.engine_type.set(detail.engine_type);
        self.pickup_sensor_offset.set(detail.pickup_sensor_offset);
        self.dwell_time_us.set(detail.dwell_time_us);
        self.rev_limiter_rpm.set(detail.rev_limiter_rpm);
        self.rev_limiter_enabled = detail.rev_limiter_enabled;
        self.rev_limiter_cut_pattern
            .set(detail.rev_limiter_cut_pattern);
        self.curve.load(detail.ignition_points());

        self.map_name = detail.name.clone();
        self.ac_mode = detail.is_ac_mode;
        self.ac_trigger_threshold.set(detail.ac_trigger_threshold);
        self.ac_invert_signal = detail.ac_invert_signal;
        self.dc_pulses_per_rev.set(detail.dc_pulses_per_rev);
        self.dc_pullup_enabled = detail.dc_pullup_enabled;
    }
}

/// Quick-shifter sub-panel: sensor setup and the kill-time curve
#[derive(Debug, Clone)]
pub struct QuickShifterSurface {
    bound: Option<usize>,
    pub is_active: bool,

    pub enabled: bool,
    pub sensor_threshold: NumField,
    pub sensor_invert: bool,
    pub min_rpm: NumField,
    pub max_rpm: NumField,
    pub curve: Curve,
}

impl Default for QuickShifterSurface {
    fn default() -> Self {
        Self {
            bound: None,
            is_active: false,
            enabled: false,
            sensor_threshold: NumField::default(),
            sensor_invert: false,
            min_rpm: NumField::default(),
            max_rpm: NumField::default(),
            curve: Curve::new(CurveKind::QuickShifter),
        }
    }
}

impl QuickShifterSurface {
    /// Overwrite one kill-time row from table text
    pub fn edit_point(
        &mut self,
        index: usize,
        rpm: &str,
        kill_time: &str,
    ) -> Result<(), CurveError> {
        let rpm = rpm.trim().parse().unwrap_or(0);
        let kill_time = kill_time.trim().parse().unwrap_or(0.0);
        self.curve.set_point(index, rpm, kill_time)
    }

    /// Apply a finished sensor calibration to the form
    pub fn apply_calibration(&mut self, threshold: u32, inverted: bool) {
        self.sensor_threshold.set(threshold);
        self.sensor_invert = inverted;
    }

    /// Build the quick-shifter save payload
    pub fn qs_patch(&self, map_name: &str) -> Result<QuickShifterPatch, CurveError> {
        self.curve.validate_ascending()?;
        let series = self.curve.serialize();
        Ok(QuickShifterPatch {
            name: map_name.to_string(),
            qs_enabled: self.enabled,
            qs_sensor_threshold: self.sensor_threshold.u32_or(DEFAULT_QS_THRESHOLD),
            qs_sensor_invert: self.sensor_invert,
            qs_min_rpm: self.min_rpm.u32_or(DEFAULT_QS_MIN_RPM),
            qs_max_rpm: self.max_rpm.u32_or(DEFAULT_QS_MAX_RPM),
            qs_point_count: series.count,
            qs_rpm: series.rpm,
            qs_kill_time: series.values,
        })
    }
}

impl EditingSurface for QuickShifterSurface {
    fn label(&self) -> &'static str {
        "quick-shifter"
    }

    fn bind(&mut self, index: usize) {
        self.bound = Some(index);
    }

    fn bound_index(&self) -> Option<usize> {
        self.bound
    }

    fn hydrate(&mut self, detail: &MapDetail, is_active: bool) {
        self.is_active = is_active;
        self.enabled = detail.qs_enabled;
        self.sensor_threshold.set(detail.qs_sensor_threshold);
        self.sensor_invert = detail.qs_sensor_invert;
        self.min_rpm.set(detail.qs_min_rpm);
        self.max_rpm.set(detail.qs_max_rpm);
        self.curve.load(detail.qs_points());
    }
}

/// Launch-control panel
#[derive(Debug, Clone, Default)]
pub struct LaunchControlSurface {
    bound: Option<usize>,
    pub is_active: bool,

    pub enabled: bool,
    pub target_rpm: NumField,
    pub retard_degrees: NumField,
    pub cut_pattern: NumField,
}

impl LaunchControlSurface {
    /// Build the launch-control save payload
    pub fn lc_patch(&self) -> LaunchControlPatch {
        LaunchControlPatch {
            lc_enabled: self.enabled,
            lc_target_rpm: self.target_rpm.u32_or(DEFAULT_LC_TARGET_RPM),
            lc_retard_degrees: self.retard_degrees.i32_or(DEFAULT_LC_RETARD),
            lc_cut_pattern: self.cut_pattern.u8_or(DEFAULT_CUT_PATTERN),
        }
    }
}

impl EditingSurface for LaunchControlSurface {
    fn label(&self) -> &'static str {
        "launch-control"
    }

    fn bind(&mut self, index: usize) {
        self.bound = Some(index);
    }

    fn bound_index(&self) -> Option<usize> {
        self.bound
    }

    fn hydrate(&mut self, detail: &MapDetail, is_active: bool) {
        self.is_active = is_active;
        self.enabled = detail.lc_enabled;
        self.target_rpm.set(detail.lc_target_rpm);
        self.retard_degrees.set(detail.lc_retard_degrees);
        self.cut_pattern.set(detail.lc_cut_pattern);
    }
}

/// One axle's tire form fields
#[derive(Debug, Clone, Default)]
pub struct TireForm {
    pub width: NumField,
    pub aspect: NumField,
    pub rim_diameter: NumField,
}

impl TireForm {
    fn spec(&self, default_width: u32, default_aspect: u32) -> TireSpec {
        TireSpec::new(
            self.width.u32_or(default_width),
            self.aspect.u32_or(default_aspect),
            self.rim_diameter.u32_or(17),
        )
    }
}

/// Anti-wheelie / traction-control panel, including the tire geometry the
/// device uses to derive wheel speeds
#[derive(Debug, Clone, Default)]
pub struct AwTcSurface {
    bound: Option<usize>,
    pub is_active: bool,

    pub aw_enabled: bool,
    pub aw_pitch_threshold: NumField,
    pub aw_cut_pattern: NumField,
    pub aw_retard_degrees: NumField,

    pub tc_enabled: bool,
    pub tc_front_wheel_holes: NumField,
    pub tc_rear_wheel_holes: NumField,
    pub tc_slip_threshold: NumField,
    pub tc_cut_pattern: NumField,
    pub tc_retard_degrees: NumField,

    pub front_tire: TireForm,
    pub rear_tire: TireForm,
}

impl AwTcSurface {
    /// Front wheel geometry as currently entered
    pub fn front_tire_spec(&self) -> TireSpec {
        self.front_tire.spec(70, 80)
    }

    /// Rear wheel geometry as currently entered
    pub fn rear_tire_spec(&self) -> TireSpec {
        self.rear_tire.spec(80, 90)
    }

    /// Build the AW/TC save payload
    pub fn awtc_patch(&self) -> AwTcPatch {
        let front = self.front_tire_spec();
        let rear = self.rear_tire_spec();
        AwTcPatch {
            aw_enabled: self.aw_enabled,
            aw_pitch_threshold: self.aw_pitch_threshold.f64_or(DEFAULT_AW_PITCH),
            aw_cut_pattern: self.aw_cut_pattern.u8_or(DEFAULT_CUT_PATTERN),
            aw_retard_degrees: self.aw_retard_degrees.i32_or(DEFAULT_AWTC_RETARD),
            tc_enabled: self.tc_enabled,
            tc_front_wheel_holes: self.tc_front_wheel_holes.u32_or(DEFAULT_WHEEL_HOLES),
            tc_rear_wheel_holes: self.tc_rear_wheel_holes.u32_or(DEFAULT_WHEEL_HOLES),
            tc_slip_threshold: self.tc_slip_threshold.f64_or(DEFAULT_SLIP_THRESHOLD),
            tc_cut_pattern: self.tc_cut_pattern.u8_or(DEFAULT_CUT_PATTERN),
            tc_retard_degrees: self.tc_retard_degrees.i32_or(DEFAULT_AWTC_RETARD),
            tc_front_tire_width: front.width_mm,
            tc_front_tire_aspect: front.aspect_pct,
            tc_front_wheel_diameter: front.rim_in,
            tc_rear_tire_width: rear.width_mm,
            tc_rear_tire_aspect: rear.aspect_pct,
            tc_rear_wheel_diameter: rear.rim_in,
        }
    }
}

impl EditingSurface for AwTcSurface {
    fn label(&self) -> &'static str {
        "aw-tc"
    }

    fn bind(&mut self, index: usize) {
        self.bound = Some(index);
    }

    fn bound_index(&self) -> Option<usize> {
        self.bound
    }

    fn hydrate(&mut self, detail: &MapDetail, is_active: bool) {
        self.is_active = is_active;
        self.aw_enabled = detail.aw_enabled;
        self.aw_pitch_threshold.set(detail.aw_pitch_threshold);
        self.aw_cut_pattern.set(detail.aw_cut_pattern);
        self.aw_retard_degrees.set(detail.aw_retard_degrees);

        self.tc_enabled = detail.tc_enabled;
        self.tc_front_wheel_holes.set(detail.tc_front_wheel_holes);
        self.tc_rear_wheel_holes.set(detail.tc_rear_wheel_holes);
        self.tc_slip_threshold.set(detail.tc_slip_threshold);
        self.tc_cut_pattern.set(detail.tc_cut_pattern);
        self.tc_retard_degrees.set(detail.tc_retard_degrees);

        self.front_tire.width.set(detail.tc_front_tire_width);
        self.front_tire.aspect.set(detail.tc_front_tire_aspect);
        self.front_tire
            .rim_diameter
            .set(detail.tc_front_wheel_diameter);
        self.rear_tire.width.set(detail.tc_rear_tire_width);
        self.rear_tire.aspect.set(detail.tc_rear_tire_aspect);
        self.rear_tire
            .rim_diameter
            .set(detail.tc_rear_wheel_diameter);
    }
}

/// The four editing surfaces the synchronizer keeps consistent
#[derive(Debug, Clone, Default)]
pub struct SurfaceSet {
    pub ignition: IgnitionSurface,
    pub quick_shifter: QuickShifterSurface,
    pub launch_control: LaunchControlSurface,
    pub awtc: AwTcSurface,
}

impl SurfaceSet {
    /// All surfaces, for uniform fan-out
    pub fn each_mut(&mut self) -> [&mut dyn EditingSurface; 4] {
        [
            &mut self.ignition,
            &mut self.quick_shifter,
            &mut self.launch_control,
            &mut self.awtc,
        ]
    }

    /// All surfaces, read-only
    pub fn each(&self) -> [&dyn EditingSurface; 4] {
        [
            &self.ignition,
            &self.quick_shifter,
            &self.launch_control,
            &self.awtc,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_num_field_fallbacks() {
        let mut field = NumField::default();
        assert_eq!(field.u32_or(3000), 3000);
        field.set("4200");
        assert_eq!(field.u32_or(3000), 4200);
        field.set("garbage");
        assert_eq!(field.u32_or(3000), 3000);
        field.set("0");
        // Zero is a value, not a parse failure
        assert_eq!(field.u32_or(3000), 0);
        field.set("-7");
        assert_eq!(field.i32_or(5), -7);
        field.set("0.15");
        assert_eq!(field.f64_or(1.0), 0.15);
    }

    #[test]
    fn test_hydrate_fills_ignition_surface() {
        let detail: MapDetail = serde_json::from_value(serde_json::json!({
            "name": "Street",
            "dwellTimeUS": 3200,
            "revLimiterRPM": 11500,
            "revLimiterEnabled": true,
            "ignitionRPM": [0, 3000, 9000],
            "ignitionAdvance": [5.0, 20.0, 35.0],
            "isACMode": true,
            "acTriggerThreshold": 1800
        }))
        .unwrap();

        let mut surface = IgnitionSurface::default();
        surface.bind(2);
        surface.hydrate(&detail, true);

        assert_eq!(surface.bound_index(), Some(2));
        assert!(surface.is_active);
        assert_eq!(surface.dwell_time_us.raw(), "3200");
        assert_eq!(surface.curve.len(), 3);
        assert_eq!(surface.map_name, "Street");
        assert!(surface.ac_mode);
    }

    #[test]
    fn test_ignition_patch_blocks_unordered_curve() {
        let mut surface = IgnitionSurface::default();
        surface.reset_to_default();
        surface.edit_point(1, "0", "12").unwrap(); // ties row 0
        assert!(matches!(
            surface.ignition_patch("Street"),
            Err(CurveError::UnorderedCurve { .. })
        ));
    }

    #[test]
    fn test_ignition_patch_uses_declared_defaults() {
        let mut surface = IgnitionSurface::default();
        surface.reset_to_default();
        surface.dwell_time_us.set("not a number");
        surface.rev_limiter_rpm.set("");
        let patch = surface.ignition_patch("Street").unwrap();
        assert_eq!(patch.dwell_time_us, 3000);
        assert_eq!(patch.rev_limiter_rpm, 12_000);
        assert_eq!(patch.ignition_point_count, 8);
        assert_eq!(patch.name, "Street");
    }

    #[test]
    fn test_awtc_patch_carries_tire_geometry() {
        let mut surface = AwTcSurface::default();
        surface.front_tire.width.set(90);
        surface.front_tire.aspect.set(90);
        surface.front_tire.rim_diameter.set(17);
        let patch = surface.awtc_patch();
        assert_eq!(patch.tc_front_tire_width, 90);
        // Untouched rear fields fall back to the stock fitment
        assert_eq!(patch.tc_rear_tire_width, 80);
        assert_eq!(patch.tc_rear_tire_aspect, 90);
        assert_eq!(patch.tc_slip_threshold, 0.15);
    }

    #[test]
    fn test_surface_set_fan_out() {
        let mut set = SurfaceSet::default();
        for surface in set.each_mut() {
            surface.bind(3);
        }
        assert!(set.each().iter().all(|s| s.bound_index() == Some(3)));
    }
}
