//! Device API boundary
//!
//! The console talks to the ignition controller through the [`DeviceApi`]
//! trait so every higher layer can run against the real HTTP device, the
//! in-memory demo device, or a test double.

mod error;
mod http;
mod types;

pub use error::DeviceError;
pub use http::HttpDevice;
pub use types::{
    AwTcPatch, CalibrationCapture, CalibrationStatus, CrudResponse, EmergencyStatus, IgnitionPatch,
    LaunchControlPatch, MapDetail, MapListResponse, MapSummary, QuickShifterPatch, SettingsPatch,
    TelemetrySnapshot,
};

use async_trait::async_trait;

/// Everything the console needs from the remote engine-control unit.
///
/// Maps are addressed two ways, matching the firmware: by *positional index*
/// for read/update/select (positions shift on create/delete) and by *stable
/// id* for create/delete/duplicate.
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// Fetch the full map list with `isActive` flags.
    async fn list_maps(&self) -> Result<Vec<MapSummary>, DeviceError>;

    /// Fetch one map's full field set by its current positional index.
    async fn map_detail(&self, index: usize) -> Result<MapDetail, DeviceError>;

    /// Partial update of one map. The payload carries only the fields owned
    /// by the saving surface; the device performs the merge. The reply never
    /// carries the updated record, so callers must re-fetch.
    async fn update_map(&self, index: usize, patch: serde_json::Value)
        -> Result<(), DeviceError>;

    /// Arm a map for execution on the device.
    async fn select_map(&self, index: usize) -> Result<(), DeviceError>;

    /// Create a map from the factory template. Returns its stable id.
    async fn create_map(&self, name: &str) -> Result<u32, DeviceError>;

    /// Delete a map by stable id.
    async fn delete_map(&self, map_id: u32) -> Result<(), DeviceError>;

    /// Duplicate a map by stable id. Returns the new map's id.
    async fn duplicate_map(&self, source_map_id: u32) -> Result<u32, DeviceError>;

    /// Fetch the live telemetry snapshot.
    async fn status(&self) -> Result<TelemetrySnapshot, DeviceError>;

    /// Fetch the safety-state snapshot.
    async fn emergency_status(&self) -> Result<EmergencyStatus, DeviceError>;

    /// Clear the emergency shutdown latch and re-enable ignition.
    async fn emergency_reset(&self) -> Result<(), DeviceError>;

    /// Begin the two-step quick-shifter sensor calibration.
    async fn calibration_start(&self) -> Result<(), DeviceError>;

    /// Capture the current sensor value for the device-held step.
    async fn calibration_capture(&self) -> Result<CalibrationCapture, DeviceError>;

    /// Abandon a calibration in progress.
    async fn calibration_cancel(&self) -> Result<(), DeviceError>;

    /// Read the calibration step and live sensor value.
    async fn calibration_status(&self) -> Result<CalibrationStatus, DeviceError>;

    /// Reboot the device. The connection drops; callers expect that.
    async fn restart(&self) -> Result<(), DeviceError>;
}
