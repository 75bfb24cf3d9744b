//! Run the console against the simulated device: list maps, edit the
//! ignition curve, save, and watch a few telemetry ticks.
//!
//! Usage: cargo run --example console_demo

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Mutex;

use sparkdeck_core::console::Console;
use sparkdeck_core::demo::DemoDevice;
use sparkdeck_core::notify::LogNotifier;
use sparkdeck_core::surfaces::EditingSurface;
use sparkdeck_core::telemetry::TelemetryMonitor;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let device = Arc::new(DemoDevice::new());
    let notifier = Arc::new(LogNotifier);
    let mut console = Console::new(device.clone(), notifier.clone());

    console.auto_select_active().await?;

    println!("Maps on device:");
    for (i, map) in console.store().maps().iter().enumerate() {
        let marker = if map.is_active { " (active)" } else { "" };
        println!("  [{i}] {}{marker}", map.name);
    }

    println!(
        "\nEditing map index {:?}, ignition curve has {} points",
        console.selected_index(),
        console.surfaces.ignition.curve.len()
    );
    for surface in console.surfaces.each() {
        println!("  {} bound to {:?}", surface.label(), surface.bound_index());
    }

    // Add a point, then save the curve back
    console.surfaces.ignition.curve.add_point(20_000, 22.0)?;
    let outcome = console.save_ignition().await?;
    println!("\nSave outcome: {outcome:?}");

    let frame = console.render_ignition();
    println!("Rendered curve: {} drawing commands", frame.len());

    // Watch telemetry for a few seconds
    let console = Arc::new(Mutex::new(console));
    let monitor = TelemetryMonitor::new(device, notifier);
    let (mut poll, mut rx) = monitor.spawn(Arc::clone(&console), Duration::from_secs(1));

    for _ in 0..5 {
        rx.changed().await?;
        if let Some(update) = rx.borrow().clone() {
            println!(
                "rpm {:5}  advance {:4.1}°  qs {}  lc {}  frame {} cmds",
                update.snapshot.rpm,
                update.snapshot.advance,
                update.features.quick_shifter.label(),
                update.features.launch_control.label(),
                update.frame.len()
            );
        }
    }

    poll.stop();
    Ok(())
}
