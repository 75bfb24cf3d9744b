//! # SparkDeck Core Library
//!
//! Core functionality for the SparkDeck operator console: the client-side
//! model of a Wi-Fi programmable CDI ignition controller.
//!
//! This library provides:
//! - Curve editing (ignition advance, quick-shifter kill time) with strict
//!   ordering and cardinality invariants
//! - A pure curve renderer producing drawing commands for any front end
//! - The device HTTP API client and a hardware-free demo device
//! - Multi-surface synchronization against one selected map
//! - Telemetry polling with live-point overlay and emergency alerting
//! - Validate/submit/resynchronize save actions with hot-reload reporting
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sparkdeck_core::prelude::*;
//!
//! let device = Arc::new(HttpDevice::new("http://192.168.4.1"));
//! let mut console = Console::new(device, Arc::new(LogNotifier));
//! console.auto_select_active().await?;
//! let commands = console.render_ignition();
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod calibration;
pub mod console;
pub mod curve;
pub mod demo;
pub mod device;
pub mod notify;
pub mod plot;
pub mod poll;
pub mod store;
pub mod surfaces;
pub mod telemetry;
pub mod tire;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::calibration::{CalibrationSession, CaptureOutcome};
    pub use crate::console::{Console, ConsoleError, SaveOutcome};
    pub use crate::curve::{Curve, CurveError, CurveKind, CurvePoint};
    pub use crate::demo::DemoDevice;
    pub use crate::device::{DeviceApi, DeviceError, HttpDevice, MapDetail, MapSummary};
    pub use crate::notify::{LogNotifier, MemoryNotifier, Notification, Notify, Severity};
    pub use crate::plot::{CurvePlot, DrawCommand, LiveSample, PlotArea};
    pub use crate::store::MapStore;
    pub use crate::surfaces::EditingSurface;
    pub use crate::telemetry::{FeatureState, TelemetryMonitor};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
