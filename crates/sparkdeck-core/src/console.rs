//! Console state and the selector synchronizer
//!
//! [`Console`] owns the only process-wide mutable state: the cached map
//! list, the selected index, and the four editing surfaces. Every write to
//! that state goes through this type, there are no ambient globals, and
//! [`Console::sync_all`] is the single choke point for cross-surface
//! consistency.

use std::sync::Arc;

use thiserror::Error;

use crate::curve::CurveError;
use crate::device::{DeviceApi, DeviceError, TelemetrySnapshot};
use crate::notify::{Notification, Notify};
use crate::plot::{self, CurvePlot, DrawCommand, LiveSample, PlotArea};
use crate::store::MapStore;
use crate::surfaces::{EditingSurface, SurfaceSet};

/// What a successful save meant on the device side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The saved map is the active map; changes took effect immediately
    HotReload,
    /// Persisted only; takes effect when the map is activated
    ColdSave,
}

/// Console-level errors
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error(transparent)]
    Curve(#[from] CurveError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("no map selected")]
    NoSelection,

    #[error("no map at index {0}")]
    UnknownIndex(usize),

    #[error("no map with id {0}")]
    UnknownId(u32),

    #[error("cannot delete the active map")]
    ActiveMapDelete,
}

/// The operator console: device handle, notification sink, map cache,
/// selection, and the four editing surfaces
pub struct Console {
    device: Arc<dyn DeviceApi>,
    notifier: Arc<dyn Notify>,
    store: MapStore,
    selected: Option<usize>,
    pub surfaces: SurfaceSet,
    pub plot_area: PlotArea,
}

impl Console {
    pub fn new(device: Arc<dyn DeviceApi>, notifier: Arc<dyn Notify>) -> Self {
        Self {
            device,
            notifier,
            store: MapStore::new(),
            selected: None,
            surfaces: SurfaceSet::default(),
            plot_area: PlotArea::default(),
        }
    }

    pub fn device(&self) -> &Arc<dyn DeviceApi> {
        &self.device
    }

    pub fn store(&self) -> &MapStore {
        &self.store
    }

    /// The index every surface currently targets
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    fn toast(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    /// Refresh the cached map list. On failure the stale list remains and
    /// one notification is emitted.
    pub async fn refresh_maps(&mut self) -> Result<(), ConsoleError> {
        if let Err(e) = self.store.refresh(self.device.as_ref()).await {
            self.toast(Notification::error("Failed to load maps"));
            return Err(e.into());
        }
        Ok(())
    }

    /// Synchronize every editing surface to `target`.
    ///
    /// Order is fixed: list refresh, then one detail fetch, then fan-out of
    /// that single detail snapshot into all four surfaces, so no surface is
    /// ever shown a detail newer than the list it was paired with, and all
    /// four reflect the same fetch. Selection and surfaces are committed
    /// only after the detail fetch succeeds; any failure leaves the prior
    /// consistent state untouched.
    pub async fn sync_all(&mut self, target: usize) -> Result<(), ConsoleError> {
        self.refresh_maps().await?;

        if target >= self.store.len() {
            self.toast(Notification::error(format!("No map at index {target}")));
            return Err(ConsoleError::UnknownIndex(target));
        }

        let detail = match self.device.map_detail(target).await {
            Ok(detail) => detail,
            Err(e) => {
                self.toast(Notification::error("Failed to load map data"));
                return Err(e.into());
            }
        };

        let is_active = self.store.is_active(target);
        self.selected = Some(target);
        for surface in self.surfaces.each_mut() {
            surface.bind(target);
            surface.hydrate(&detail, is_active);
        }
        Ok(())
    }

    /// Focus the device-armed map, if there is one.
    pub async fn auto_select_active(&mut self) -> Result<(), ConsoleError> {
        self.refresh_maps().await?;
        match self.store.find_active_index() {
            Some(index) => self.sync_all(index).await,
            None => Ok(()),
        }
    }

    /// Arm a map on the device, then resynchronize all surfaces to it.
    pub async fn select_map(&mut self, index: usize) -> Result<(), ConsoleError> {
        if self.store.get(index).is_none() {
            self.toast(Notification::error(format!("No map at index {index}")));
            return Err(ConsoleError::UnknownIndex(index));
        }
        if let Err(e) = self.device.select_map(index).await {
            self.toast(Notification::error("Failed to select map"));
            return Err(e.into());
        }
        self.sync_all(index).await?;
        let name = self.store.name_of(index).unwrap_or("?").to_string();
        self.toast(Notification::success(format!("Map activated: {name}")));
        Ok(())
    }

    /// Re-resolve the selection against a fresh list after a create, delete,
    /// or duplicate shifted positions. The selected map is found again by
    /// stable id; if it is gone, focus falls back to the active map.
    async fn refresh_and_reresolve(&mut self) -> Result<(), ConsoleError> {
        let keep_id = self
            .selected
            .and_then(|index| self.store.get(index))
            .map(|m| m.id);
        self.refresh_maps().await?;
        let target = keep_id
            .and_then(|id| self.store.index_of(id))
            .or_else(|| self.store.find_active_index());
        match target {
            Some(index) => self.sync_all(index).await,
            None => {
                self.selected = None;
                Ok(())
            }
        }
    }

    /// Create a map from the factory template. Returns its stable id.
    pub async fn create_map(&mut self, name: &str) -> Result<u32, ConsoleError> {
        let id = match self.device.create_map(name).await {
            Ok(id) => id,
            Err(e) => {
                self.toast(Notification::error(format!("Failed to create map: {e}")));
                return Err(e.into());
            }
        };
        self.toast(Notification::success(format!("Map created: {name}")));
        self.refresh_and_reresolve().await?;
        Ok(id)
    }

    /// Delete a map by stable id. Refused locally for the active map.
    pub async fn delete_map(&mut self, map_id: u32) -> Result<(), ConsoleError> {
        let index = match self.store.index_of(map_id) {
            Some(index) => index,
            None => {
                self.toast(Notification::warning("Unknown map"));
                return Err(ConsoleError::UnknownId(map_id));
            }
        };
        if self.store.is_active(index) {
            self.toast(Notification::warning("Cannot delete the active map"));
            return Err(ConsoleError::ActiveMapDelete);
        }
        if let Err(e) = self.device.delete_map(map_id).await {
            self.toast(Notification::error(format!("Failed to delete map: {e}")));
            return Err(e.into());
        }
        self.toast(Notification::success("Map deleted"));
        self.refresh_and_reresolve().await
    }

    /// Duplicate a map by stable id. Returns the new map's id.
    pub async fn duplicate_map(&mut self, source_map_id: u32) -> Result<u32, ConsoleError> {
        let new_id = match self.device.duplicate_map(source_map_id).await {
            Ok(id) => id,
            Err(e) => {
                self.toast(Notification::error(format!("Failed to duplicate map: {e}")));
                return Err(e.into());
            }
        };
        self.toast(Notification::success(format!(
            "Map duplicated (new id {new_id})"
        )));
        self.refresh_and_reresolve().await?;
        Ok(new_id)
    }

    fn selected_or_toast(&self) -> Result<usize, ConsoleError> {
        match self.selected {
            Some(index) => Ok(index),
            None => {
                self.toast(Notification::warning("No map selected"));
                Err(ConsoleError::NoSelection)
            }
        }
    }

    /// Name of the selected map as the store knows it (saves echo the
    /// stored name, not the settings form's edit buffer).
    fn stored_name(&self, index: usize) -> Result<String, ConsoleError> {
        match self.store.name_of(index) {
            Some(name) => Ok(name.to_string()),
            None => {
                self.toast(Notification::error(format!("No map at index {index}")));
                Err(ConsoleError::UnknownIndex(index))
            }
        }
    }

    /// Phases two and three of every save: submit the partial patch, then
    /// resynchronize to the same index and report hot-reload vs cold-save.
    async fn submit_and_resync(
        &mut self,
        index: usize,
        patch: serde_json::Value,
        what: &str,
    ) -> Result<SaveOutcome, ConsoleError> {
        if let Err(e) = self.device.update_map(index, patch).await {
            self.toast(Notification::error(format!(
                "Failed to save {what} configuration"
            )));
            return Err(e.into());
        }
        self.sync_all(index).await?;
        let outcome = if self.store.is_active(index) {
            self.toast(Notification::success(format!(
                "{what} saved and applied, changes are live"
            )));
            SaveOutcome::HotReload
        } else {
            self.toast(Notification::success(format!(
                "{what} saved, activate this map to apply"
            )));
            SaveOutcome::ColdSave
        };
        Ok(outcome)
    }

    /// Save the ignition tab (curve plus spark settings).
    pub async fn save_ignition(&mut self) -> Result<SaveOutcome, ConsoleError> {
        let index = self.selected_or_toast()?;
        let name = self.stored_name(index)?;
        let patch = match self.surfaces.ignition.ignition_patch(&name) {
            Ok(patch) => patch,
            Err(e) => {
                self.toast(Notification::warning(e.to_string()));
                return Err(e.into());
            }
        };
        self.submit_and_resync(index, serde_json::to_value(&patch)?, "Ignition")
            .await
    }

    /// Save the quick-shifter sub-panel.
    pub async fn save_quick_shifter(&mut self) -> Result<SaveOutcome, ConsoleError> {
        let index = self.selected_or_toast()?;
        let name = self.stored_name(index)?;
        let patch = match self.surfaces.quick_shifter.qs_patch(&name) {
            Ok(patch) => patch,
            Err(e) => {
                self.toast(Notification::warning(e.to_string()));
                return Err(e.into());
            }
        };
        self.submit_and_resync(index, serde_json::to_value(&patch)?, "Quick shifter")
            .await
    }

    /// Save the settings tab (map name and trigger input mode).
    pub async fn save_settings(&mut self) -> Result<SaveOutcome, ConsoleError> {
        let index = self.selected_or_toast()?;
        let patch = self.surfaces.ignition.settings_patch();
        self.submit_and_resync(index, serde_json::to_value(&patch)?, "Settings")
            .await
    }

    /// Save the launch-control panel.
    pub async fn save_launch_control(&mut self) -> Result<SaveOutcome, ConsoleError> {
        let index = self.selected_or_toast()?;
        let patch = self.surfaces.launch_control.lc_patch();
        self.submit_and_resync(index, serde_json::to_value(&patch)?, "Launch control")
            .await
    }

    /// Save the anti-wheelie / traction-control panel.
    pub async fn save_awtc(&mut self) -> Result<SaveOutcome, ConsoleError> {
        let index = self.selected_or_toast()?;
        let patch = self.surfaces.awtc.awtc_patch();
        self.submit_and_resync(index, serde_json::to_value(&patch)?, "AW & TC")
            .await
    }

    /// Clear the device's emergency shutdown latch.
    pub async fn reset_emergency(&mut self) -> Result<(), ConsoleError> {
        if let Err(e) = self.device.emergency_reset().await {
            self.toast(Notification::error("Failed to reset emergency state"));
            return Err(e.into());
        }
        self.toast(Notification::success("Emergency state reset"));
        Ok(())
    }

    /// Reboot the device. Losing the connection is expected here, so a
    /// transport error is not treated as a failure.
    pub async fn restart_device(&mut self) {
        let _ = self.device.restart().await;
        self.toast(Notification::info(
            "Device is restarting, you may need to reconnect",
        ));
    }

    fn render_ignition_with(&self, live: Option<LiveSample>) -> Vec<DrawCommand> {
        let series = self.surfaces.ignition.curve.serialize();
        plot::render(
            &self.plot_area,
            &CurvePlot {
                keys: &series.rpm,
                values: &series.values,
                live,
                y_unit: "°",
                y_title: "Advance (degrees)",
                x_title: "RPM",
            },
        )
    }

    /// Render the ignition working curve without a live point.
    pub fn render_ignition(&self) -> Vec<DrawCommand> {
        self.render_ignition_with(None)
    }

    /// Render the quick-shifter working curve.
    pub fn render_quick_shifter(&self) -> Vec<DrawCommand> {
        let series = self.surfaces.quick_shifter.curve.serialize();
        plot::render(
            &self.plot_area,
            &CurvePlot {
                keys: &series.rpm,
                values: &series.values,
                live: None,
                y_unit: " ms",
                y_title: "Kill time (ms)",
                x_title: "RPM",
            },
        )
    }

    /// Render the ignition curve with the device's live operating point,
    /// but only when the rendered curve belongs to the device-armed map.
    /// Editing an inactive map must never show a misleading live marker.
    pub fn overlay_live(&self, status: &TelemetrySnapshot) -> Vec<DrawCommand> {
        let selected_is_active = self
            .selected
            .map(|index| self.store.is_active(index))
            .unwrap_or(false);
        let live = if selected_is_active && !self.surfaces.ignition.curve.is_empty() {
            Some(LiveSample {
                rpm: status.rpm,
                value: status.advance,
            })
        } else {
            None
        };
        self.render_ignition_with(live)
    }
}
