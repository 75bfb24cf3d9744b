//! Tests for the quick-shifter calibration sequence

use std::sync::Arc;
use std::time::Duration;

use sparkdeck_core::calibration::{CalibrationSession, CaptureOutcome};
use sparkdeck_core::demo::DemoDevice;
use sparkdeck_core::device::DeviceApi;
use sparkdeck_core::surfaces::QuickShifterSurface;

#[tokio::test(start_paused = true)]
async fn test_two_step_capture_sequence() {
    let demo = Arc::new(DemoDevice::with_seed(5));
    let mut session = CalibrationSession::new(Arc::clone(&demo) as _);

    let mut rx = session.start().await.unwrap();
    assert!(session.is_polling());

    // First readout arrives from the sensor poll
    rx.changed().await.unwrap();
    let status = rx.borrow().clone().unwrap();
    assert!(status.calibrating);
    assert_eq!(status.step, 1);

    // Press capture advances the device-held step
    let first = session.capture().await.unwrap();
    assert_eq!(first, CaptureOutcome::AwaitRelease);
    assert!(session.is_polling());

    // Release capture completes and stops the sensor poll
    let second = session.capture().await.unwrap();
    let result = match second {
        CaptureOutcome::Complete(result) => result,
        other => panic!("expected completion, got {other:?}"),
    };
    assert!(result.pressed_value > result.released_value);
    assert_eq!(
        result.threshold,
        (result.pressed_value + result.released_value) / 2
    );
    assert!(!result.inverted);

    tokio::task::yield_now().await;
    assert!(!session.is_polling());

    // A finished calibration feeds the quick-shifter form
    let mut surface = QuickShifterSurface::default();
    CalibrationSession::apply(&result, &mut surface);
    assert_eq!(
        surface.sensor_threshold.raw(),
        result.threshold.to_string()
    );
    assert!(!surface.sensor_invert);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_is_idempotent_and_stops_poll() {
    let demo = Arc::new(DemoDevice::with_seed(5));
    let mut session = CalibrationSession::new(Arc::clone(&demo) as _);

    let _rx = session.start().await.unwrap();
    assert!(session.is_polling());

    session.cancel().await.unwrap();
    tokio::task::yield_now().await;
    assert!(!session.is_polling());

    // Cancelling again is a no-op
    session.cancel().await.unwrap();
    assert!(!session.is_polling());
}

#[tokio::test(start_paused = true)]
async fn test_sensor_poll_stops_when_device_finishes() {
    let demo = Arc::new(DemoDevice::with_seed(5));
    let mut session = CalibrationSession::new(Arc::clone(&demo) as _);

    let mut rx = session.start().await.unwrap();
    rx.changed().await.unwrap();

    // The device finishes the sequence on its own (e.g. cancelled from
    // another client); the poll observes it and shuts down
    demo.calibration_cancel().await.unwrap();
    tokio::time::advance(Duration::from_millis(400)).await;
    tokio::task::yield_now().await;

    let last = rx.borrow().clone();
    assert!(matches!(last, Some(status) if !status.calibrating));
    assert!(!session.is_polling());
}
