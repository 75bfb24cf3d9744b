//! Map Store Proxy
//!
//! Client-side cache of the device's map list. Refreshes replace the list
//! wholesale; there is no incremental patching, so a cached list can be
//! stale but never a partial merge. On a failed refresh the previous list
//! stays available.

use crate::device::{DeviceApi, DeviceError, MapSummary};

/// Cached map list, the single source of truth for map metadata
#[derive(Debug, Default)]
pub struct MapStore {
    maps: Vec<MapSummary>,
}

impl MapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached list with a fresh fetch.
    ///
    /// On failure the cached list is untouched (stale-but-available beats
    /// empty) and the error is returned to the caller.
    pub async fn refresh(&mut self, device: &dyn DeviceApi) -> Result<(), DeviceError> {
        let maps = device.list_maps().await?;
        self.maps = maps;
        Ok(())
    }

    pub fn maps(&self) -> &[MapSummary] {
        &self.maps
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Map metadata at a positional index
    pub fn get(&self, index: usize) -> Option<&MapSummary> {
        self.maps.get(index)
    }

    /// Index of the device-armed map, if the cached list has one
    pub fn find_active_index(&self) -> Option<usize> {
        self.maps.iter().position(|m| m.is_active)
    }

    /// Whether the map at `index` is the device-armed map
    pub fn is_active(&self, index: usize) -> bool {
        self.get(index).map(|m| m.is_active).unwrap_or(false)
    }

    /// Positional index of a stable map id.
    ///
    /// Positions shift on create/delete, so callers re-resolve through this
    /// after every refresh instead of caching a detached index.
    pub fn index_of(&self, map_id: u32) -> Option<usize> {
        self.maps.iter().position(|m| m.id == map_id)
    }

    /// Name of the map at a positional index
    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.get(index).map(|m| m.name.as_str())
    }

    #[cfg(test)]
    pub(crate) fn set_maps_for_test(&mut self, maps: Vec<MapSummary>) {
        self.maps = maps;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: u32, name: &str, active: bool) -> MapSummary {
        MapSummary {
            id,
            name: name.to_string(),
            is_active: active,
            min_rpm: 0,
            max_rpm: 18000,
            rev_limiter_enabled: false,
            rev_limiter_rpm: 0,
            ignition_point_count: 8,
            dwell_time_us: 3000,
            lc_enabled: false,
            qs_enabled: false,
            aw_enabled: false,
            tc_enabled: false,
        }
    }

    #[test]
    fn test_active_lookup() {
        let mut store = MapStore::new();
        store.set_maps_for_test(vec![
            summary(7, "Street", false),
            summary(9, "Track", true),
        ]);
        assert_eq!(store.find_active_index(), Some(1));
        assert!(store.is_active(1));
        assert!(!store.is_active(0));
        assert!(!store.is_active(5));
    }

    #[test]
    fn test_index_of_stable_id() {
        let mut store = MapStore::new();
        store.set_maps_for_test(vec![summary(7, "Street", true), summary(9, "Track", false)]);
        assert_eq!(store.index_of(9), Some(1));
        assert_eq!(store.index_of(42), None);
        assert_eq!(store.name_of(0), Some("Street"));
    }
}
