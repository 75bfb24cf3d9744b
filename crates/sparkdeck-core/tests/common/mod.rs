//! Shared test double for the device API
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use sparkdeck_core::device::{
    CalibrationCapture, CalibrationStatus, DeviceApi, DeviceError, EmergencyStatus, MapDetail,
    MapSummary, TelemetrySnapshot,
};

pub fn summary(id: u32, name: &str, active: bool) -> MapSummary {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "isActive": active,
    }))
    .unwrap()
}

/// Scriptable in-memory device. Each `map_detail` call stamps a fresh
/// sentinel into the returned detail so tests can prove how many fetches a
/// code path performed and which fetch a surface was hydrated from.
pub struct MockDevice {
    pub maps: Mutex<Vec<MapSummary>>,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub fail_list: AtomicBool,
    pub fail_detail: AtomicBool,
    pub fail_update: AtomicBool,
    pub last_patch: Mutex<Option<(usize, serde_json::Value)>>,
}

impl MockDevice {
    pub fn new(maps: Vec<MapSummary>) -> Self {
        Self {
            maps: Mutex::new(maps),
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            fail_list: AtomicBool::new(false),
            fail_detail: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            last_patch: Mutex::new(None),
        }
    }

    /// Detail payload for sentinel generation `n`: every surface-visible
    /// field varies with `n`.
    pub fn sentinel_detail(name: &str, n: usize) -> MapDetail {
        serde_json::from_value(serde_json::json!({
            "name": format!("{name}-s{n}"),
            "dwellTimeUS": 3000 + n,
            "ignitionRPM": [0, 1000, 3000],
            "ignitionAdvance": [5.0, 10.0, 20.0],
            "qsSensorThreshold": 2000 + n,
            "qsRPM": [3000, 9000],
            "qsKillTime": [70.0, 55.0],
            "lcTargetRPM": 6000 + n,
            "awPitchThreshold": 15.0 + n as f64,
        }))
        .unwrap()
    }
}

#[async_trait]
impl DeviceApi for MockDevice {
    async fn list_maps(&self) -> Result<Vec<MapSummary>, DeviceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(DeviceError::Status(500));
        }
        Ok(self.maps.lock().unwrap().clone())
    }

    async fn map_detail(&self, index: usize) -> Result<MapDetail, DeviceError> {
        let n = self.detail_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_detail.load(Ordering::SeqCst) {
            return Err(DeviceError::Status(500));
        }
        let maps = self.maps.lock().unwrap();
        let map = maps.get(index).ok_or(DeviceError::Status(404))?;
        Ok(Self::sentinel_detail(&map.name, n))
    }

    async fn update_map(
        &self,
        index: usize,
        patch: serde_json::Value,
    ) -> Result<(), DeviceError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(DeviceError::Status(500));
        }
        *self.last_patch.lock().unwrap() = Some((index, patch));
        Ok(())
    }

    async fn select_map(&self, index: usize) -> Result<(), DeviceError> {
        let mut maps = self.maps.lock().unwrap();
        if index >= maps.len() {
            return Err(DeviceError::Status(404));
        }
        for (i, map) in maps.iter_mut().enumerate() {
            map.is_active = i == index;
        }
        Ok(())
    }

    async fn create_map(&self, name: &str) -> Result<u32, DeviceError> {
        let mut maps = self.maps.lock().unwrap();
        let id = maps.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        maps.push(summary(id, name, false));
        Ok(id)
    }

    async fn delete_map(&self, map_id: u32) -> Result<(), DeviceError> {
        let mut maps = self.maps.lock().unwrap();
        let index = maps
            .iter()
            .position(|m| m.id == map_id)
            .ok_or_else(|| DeviceError::Rejected("unknown map id".to_string()))?;
        maps.remove(index);
        Ok(())
    }

    async fn duplicate_map(&self, source_map_id: u32) -> Result<u32, DeviceError> {
        let mut maps = self.maps.lock().unwrap();
        let source = maps
            .iter()
            .find(|m| m.id == source_map_id)
            .cloned()
            .ok_or_else(|| DeviceError::Rejected("unknown map id".to_string()))?;
        let id = maps.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        maps.push(summary(id, &format!("{} (copy)", source.name), false));
        Ok(id)
    }

    async fn status(&self) -> Result<TelemetrySnapshot, DeviceError> {
        Ok(TelemetrySnapshot::default())
    }

    async fn emergency_status(&self) -> Result<EmergencyStatus, DeviceError> {
        Ok(EmergencyStatus::default())
    }

    async fn emergency_reset(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    async fn calibration_start(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    async fn calibration_capture(&self) -> Result<CalibrationCapture, DeviceError> {
        Ok(CalibrationCapture::default())
    }

    async fn calibration_cancel(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    async fn calibration_status(&self) -> Result<CalibrationStatus, DeviceError> {
        Ok(CalibrationStatus::default())
    }

    async fn restart(&self) -> Result<(), DeviceError> {
        Ok(())
    }
}
